//! CLI argument parsing, validation, and startup helpers.

use std::net::IpAddr;

use clap::Parser;
use tracing::warn;
use url::Url;

use crate::ServerConfig;
use crate::gate::RouteTable;
use crate::rate_limit::DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Deployment environment, read from `NODE_ENV` by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Map a `NODE_ENV` value. Unrecognized values (`staging`, `local`, ...) run as development.
    pub fn from_node_env(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    Ok(Environment::from_node_env(value))
}

/// Header a reverse proxy writes the client IP into.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`, first entry
    XForwardedFor,
    /// `X-Real-IP`
    XRealIp,
    /// `CF-Connecting-IP` (Cloudflare)
    CfConnectingIp,
}

impl ClientIpHeader {
    pub fn header_name(self) -> &'static str {
        match self {
            ClientIpHeader::XForwardedFor => "x-forwarded-for",
            ClientIpHeader::XRealIp => "x-real-ip",
            ClientIpHeader::CfConnectingIp => "cf-connecting-ip",
        }
    }

    /// Parse the header value into a normalized IP address string.
    pub fn parse(self, value: &str) -> Result<String, &'static str> {
        let candidate = match self {
            ClientIpHeader::XForwardedFor => value.split(',').next().unwrap_or_default(),
            ClientIpHeader::XRealIp | ClientIpHeader::CfConnectingIp => value,
        };
        candidate
            .trim()
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid address")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "monolith-gateway",
    about = "Cookie-authenticated gateway in front of the Monolith backend"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Base URL of the backend service (e.g., "http://localhost:8000")
    #[arg(long, env = "FASTAPI_BASE_URL")]
    pub backend_url: Option<String>,

    /// Deployment environment (development, production, test); production enables Secure
    /// cookies and 1 hour access cookies, anything unrecognized runs as development
    #[arg(long, env = "NODE_ENV", value_parser = parse_environment, default_value = "development")]
    pub environment: Environment,

    /// Read the client IP from this header instead of the socket address (requires a proxy)
    #[arg(long, value_enum)]
    pub client_ip_header: Option<ClientIpHeader>,

    /// Login and registration attempts allowed per client IP per minute
    #[arg(long, default_value_t = DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE)]
    pub login_rate_limit: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Parse and validate the backend base URL.
///
/// A missing URL is allowed: the gateway starts and reports `CONFIGURATION_ERROR` on
/// every route that needs the backend. An unparsable URL is a startup error.
pub fn validate_backend_url(backend_url: Option<&str>) -> Result<Option<Url>, String> {
    let Some(raw) = backend_url.map(str::trim).filter(|s| !s.is_empty()) else {
        warn!("FASTAPI_BASE_URL is not set; backend routes will fail with CONFIGURATION_ERROR");
        return Ok(None);
    };

    let url = Url::parse(raw).map_err(|e| format!("Invalid backend URL {}: {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Backend URL must use http or https: {}", raw));
    }

    Ok(Some(url))
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    backend_url: Option<Url>,
    environment: Environment,
    client_ip_header: Option<ClientIpHeader>,
    login_rate_per_minute: u32,
) -> ServerConfig {
    ServerConfig {
        backend_url,
        environment,
        routes: RouteTable::default(),
        client_ip_header,
        login_rate_per_minute,
    }
}
