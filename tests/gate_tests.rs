//! Tests for the request gate as seen through the full router.

mod common;

use axum::http::{StatusCode, header};
use common::{body_bytes, body_json, cookie_header, create_test_app, get, mint_access_token};
use tower::ServiceExt;

fn location(response: &axum::http::Response<axum::body::Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_dashboard_without_cookies_redirects_to_login() {
    let app = create_test_app(None);

    let response = app.oneshot(get("/dashboard", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn test_nested_page_redirect_encodes_path() {
    let app = create_test_app(None);

    let response = app
        .oneshot(get("/dashboard/documents/d1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/login?redirect=%2Fdashboard%2Fdocuments%2Fd1"
    );
}

#[tokio::test]
async fn test_login_with_valid_pair_redirects_to_dashboard() {
    let app = create_test_app(None);
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app.oneshot(get("/login", Some(&cookies))).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_login_without_cookies_serves_shell() {
    let app = create_test_app(None);

    let response = app.oneshot(get("/login", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(html.contains(r#"data-route="/login""#));
}

#[tokio::test]
async fn test_dashboard_with_valid_pair_serves_shell() {
    let app = create_test_app(None);
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app
        .oneshot(get("/dashboard", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(html.contains(r#"data-route="/dashboard""#));
}

#[tokio::test]
async fn test_expired_access_with_refresh_is_let_through() {
    let app = create_test_app(None);
    let cookies = cookie_header(&mint_access_token(-7200), "refresh-1");

    let response = app
        .oneshot(get("/dashboard", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_access_with_refresh_is_let_through() {
    let app = create_test_app(None);
    let cookies = cookie_header("not-a-jwt", "refresh-1");

    let response = app
        .oneshot(get("/dashboard", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_api_without_cookies_is_401_json() {
    let app = create_test_app(None);

    let response = app
        .oneshot(get("/api/documents", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NO_AUTH_TOKEN");
    assert!(json["message"].as_str().is_some());
}

#[tokio::test]
async fn test_protected_api_without_refresh_cookie_is_401_json() {
    let app = create_test_app(None);
    let cookies = format!("auth_token={}", mint_access_token(3600));

    let response = app
        .oneshot(get("/api/documents", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NO_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_static_assets_bypass_gate() {
    let app = create_test_app(None);

    for path in ["/assets/app.js", "/favicon.ico"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}

#[tokio::test]
async fn test_public_pages_and_health_without_cookies() {
    let app = create_test_app(None);

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/pricing", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend_configured"], false);
}

#[tokio::test]
async fn test_unknown_api_route_is_404_json() {
    let app = create_test_app(None);
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app
        .oneshot(get("/api/nope", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NOT_FOUND");
}
