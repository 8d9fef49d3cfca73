//! Declarative route classification used by the gate.

/// The class a request path belongs to. Every path maps to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/registration pages, bounced to the home page when already signed in
    AuthPage,
    /// API routes reachable without credentials
    PublicApi,
    /// Pages reachable without credentials
    PublicPage,
    /// Everything else
    Protected,
}

/// Path lists that drive the gate. Entries match the exact path or any path below it
/// (`/blog` matches `/blog/post`, not `/blogroll`); `/` matches only itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Prefix under which static assets are served; never gated
    pub static_prefix: String,
    pub auth_pages: Vec<String>,
    pub public_api: Vec<String>,
    pub public_pages: Vec<String>,
    /// Where unauthenticated page requests are sent
    pub login_path: String,
    /// Where authenticated visitors of auth pages are sent
    pub home_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        fn paths(list: &[&str]) -> Vec<String> {
            list.iter().map(|p| p.to_string()).collect()
        }

        Self {
            static_prefix: "/assets".to_string(),
            auth_pages: paths(&["/login", "/register", "/forgot-password", "/reset-password"]),
            public_api: paths(&[
                "/api/auth/login",
                "/api/auth/register",
                "/api/auth/refresh",
                "/api/auth/logout",
                "/api/auth/session",
                "/api/health",
            ]),
            public_pages: paths(&[
                "/", "/about", "/pricing", "/contact", "/privacy", "/terms", "/blog",
            ]),
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| matches_prefix(path, prefix))
}

impl RouteTable {
    /// Static assets: anything under the static prefix or with a dot in the path.
    pub fn is_static_asset(&self, path: &str) -> bool {
        matches_prefix(path, &self.static_prefix) || path.contains('.')
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if matches_any(path, &self.auth_pages) {
            RouteClass::AuthPage
        } else if matches_any(path, &self.public_api) {
            RouteClass::PublicApi
        } else if matches_any(path, &self.public_pages) {
            RouteClass::PublicPage
        } else {
            RouteClass::Protected
        }
    }
}

/// API paths answer with JSON; everything else is a page.
pub fn is_api_path(path: &str) -> bool {
    matches_prefix(path, "/api")
}
