//! Tests for bearer attachment and the refresh-and-retry cycle against a mock backend.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    body_json, cookie_header, create_test_app, get, mint_access_token, post_json, set_cookie,
    set_cookies,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json as body_json_matcher, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refreshed_pair(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_at": 1_900_000_000u64,
    })
}

#[tokio::test]
async fn test_valid_token_is_attached_as_bearer() {
    let backend = MockServer::start().await;
    let access = mint_access_token(3600);

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(header("authorization", format!("Bearer {}", access).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&access, "refresh-1");
    let response = app
        .oneshot(post_json("/api/search", Some(&cookies), json!({"query": "q"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());

    let requests = backend.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_expired_access_is_refreshed_and_retried() {
    let backend = MockServer::start().await;
    let old_access = mint_access_token(-60);
    let new_access = mint_access_token(3600);

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(header("authorization", format!("Bearer {}", old_access).as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"code": "TOKEN_EXPIRED", "message": "Token expired"}}),
        ))
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json_matcher(json!({"refresh_token": "refresh-old"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(refreshed_pair(&new_access, "refresh-new")),
        )
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .and(header("authorization", format!("Bearer {}", new_access).as_str()))
        .and(body_json_matcher(json!({"query": "contracts", "limit": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": ["d1"]})))
        .expect(1)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&old_access, "refresh-old");
    let response = app
        .oneshot(post_json(
            "/api/search",
            Some(&cookies),
            json!({"query": "contracts", "limit": 5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let access_cookie = set_cookie(&cookies, "auth_token").unwrap();
    assert_eq!(
        access_cookie,
        format!(
            "auth_token={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=30",
            new_access
        )
    );
    assert_eq!(
        set_cookie(&cookies, "refresh_token").unwrap(),
        "refresh_token=refresh-new; HttpOnly; SameSite=Lax; Path=/; Max-Age=2592000"
    );

    assert_eq!(body_json(response).await["results"][0], "d1");
}

#[tokio::test]
async fn test_at_most_one_refresh_and_one_retry() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/documents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"code": "INVALID_TOKEN", "message": "Token rejected"}}),
        ))
        .expect(2)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_pair("a2", "r2")))
        .expect(1)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&mint_access_token(-60), "refresh-1");
    let response = app
        .oneshot(get("/api/documents", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let rotated = set_cookies(&response);
    assert!(set_cookie(&rotated, "auth_token").unwrap().starts_with("auth_token=a2;"));
    assert_eq!(body_json(response).await["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_rejected_refresh_clears_cookies() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/teams"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"code": "INVALID_REFRESH_TOKEN", "message": "Refresh token revoked"}}),
        ))
        .expect(1)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&mint_access_token(-60), "refresh-revoked");
    let response = app
        .oneshot(get("/api/teams", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = set_cookies(&response);
    assert_eq!(
        set_cookie(&cleared, "auth_token").unwrap(),
        "auth_token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
    );
    assert_eq!(
        set_cookie(&cleared, "refresh_token").unwrap(),
        "refresh_token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
    );
    assert_eq!(body_json(response).await["error"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_skip_auth_never_sends_bearer_or_refreshes() {
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"code": "INVALID_CREDENTIALS", "message": "Wrong email or password"}}),
        ))
        .expect(2)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_pair("a2", "r2")))
        .expect(0)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&mint_access_token(-60), "refresh-1");

    // Repeating the call changes nothing: each attempt goes out once, unauthenticated
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                Some(&cookies),
                json!({"email": "ada@example.com", "password": "wrong"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        assert_eq!(body_json(response).await["error"], "INVALID_CREDENTIALS");
    }

    let requests = backend.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.url.path(), "/api/v1/auth/login");
        assert!(request.headers.get("authorization").is_none());
    }
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_call() {
    let backend = MockServer::start().await;
    let old_access = mint_access_token(-60);

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", format!("Bearer {}", old_access).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&backend)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refreshed_pair("a-new", "r-new"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer a-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user-1"})))
        .expect(2)
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&old_access, "refresh-shared");

    let (first, second) = tokio::join!(
        app.clone().oneshot(get("/api/auth/me", Some(&cookies))),
        app.clone().oneshot(get("/api/auth/me", Some(&cookies))),
    );

    for response in [first.unwrap(), second.unwrap()] {
        assert_eq!(response.status(), StatusCode::OK);
        let rotated = set_cookies(&response);
        assert!(
            set_cookie(&rotated, "refresh_token")
                .unwrap()
                .starts_with("refresh_token=r-new;")
        );
    }
}

#[tokio::test]
async fn test_missing_backend_url_is_configuration_error() {
    let app = create_test_app(None);
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app
        .oneshot(post_json("/api/search", Some(&cookies), json!({"query": "q"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_unreachable_backend_is_distinguished() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let app = create_test_app(Some(&format!("http://127.0.0.1:{}", port)));
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app
        .oneshot(get("/api/teams", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "BACKEND_UNAVAILABLE");
}

#[tokio::test]
async fn test_backend_error_status_is_mirrored() {
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/documents/doc-404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Document not found"})),
        )
        .mount(&backend)
        .await;

    let app = create_test_app(Some(&backend.uri()));
    let cookies = cookie_header(&mint_access_token(3600), "refresh-1");

    let response = app
        .oneshot(get("/api/documents/doc-404", Some(&cookies)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "NOT_FOUND");
    assert_eq!(json["message"], "Document not found");
}
