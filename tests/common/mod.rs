#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use monolith_gateway::{ServerConfig, cli::Environment, create_app, gate::RouteTable};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Secret the test backend signs with. The gateway never sees it.
const BACKEND_SECRET: &[u8] = b"backend-signing-secret";

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: u64,
    iat: u64,
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Mint an access token expiring `exp_offset` seconds from now (negative for expired).
pub fn mint_access_token(exp_offset: i64) -> String {
    let now = now();
    let claims = Claims {
        sub: "user-1".to_string(),
        exp: now.saturating_add_signed(exp_offset),
        iat: now.saturating_sub(3600),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(BACKEND_SECRET),
    )
    .unwrap()
}

pub fn config(backend_url: Option<&str>) -> ServerConfig {
    ServerConfig {
        backend_url: backend_url.map(|url| Url::parse(url).unwrap()),
        environment: Environment::Test,
        routes: RouteTable::default(),
        client_ip_header: None,
        login_rate_per_minute: 1000,
    }
}

pub fn create_test_app(backend_url: Option<&str>) -> Router {
    create_app(&config(backend_url)).unwrap()
}

pub fn cookie_header(access: &str, refresh: &str) -> String {
    format!("auth_token={}; refresh_token={}", access, refresh)
}

pub fn get(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookies: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` value for `name`, if any.
pub fn set_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .find(|cookie| cookie.starts_with(&prefix))
        .map(String::as_str)
}
