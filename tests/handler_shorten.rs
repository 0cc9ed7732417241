mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_public_shorten_generates_slug() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "https://example.com/docs" }))
        .await;

    response.assert_status_ok();

    let body = response.json::<serde_json::Value>();
    let slug = body["slug"].as_str().unwrap();
    assert_eq!(slug.len(), 8);
    assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(body["short_url"], format!("https://sho.rt/{}", slug));

    let stored = app.links.find_slug(slug).unwrap();
    assert_eq!(stored.target, "https://example.com/docs");
    assert!(stored.owner.is_none());
    assert!(stored.expires_at.is_some());
}

#[tokio::test]
async fn test_public_shorten_adds_missing_scheme() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "example.com", "slug": "exa" }))
        .await;

    response.assert_status_ok();
    assert_eq!(app.links.find_slug("exa").unwrap().target, "https://example.com");
}

#[tokio::test]
async fn test_public_shorten_writes_through_cache() {
    let app = TestApp::spawn();

    app.server
        .post("/shorten")
        .json(&json!({ "original_url": "https://example.com", "slug": "cached" }))
        .await
        .assert_status_ok();

    let ttl = app.cache.ttl("slug:cached").await.unwrap();
    assert!(ttl <= std::time::Duration::from_secs(24 * 3600));
}

#[tokio::test]
async fn test_public_alias_route() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/api/publicshorturl")
        .json(&json!({ "original_url": "https://example.com", "slug": "alias" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["slug"], "alias");
    assert_eq!(body["short_url"], "https://sho.rt/alias");
}

#[tokio::test]
async fn test_empty_slug_means_generate() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "https://example.com", "slug": "" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["slug"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_custom_slug_conflict() {
    let app = TestApp::spawn();
    app.links.seed("taken", "https://first.example", None, None);

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "https://second.example", "slug": "taken" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(
        app.links.find_slug("taken").unwrap().target,
        "https://first.example"
    );
}

#[tokio::test]
async fn test_invalid_slug_rejected() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "https://example.com", "slug": "no spaces!" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(app.links.find_slug("no spaces!").is_none());
}

#[tokio::test]
async fn test_missing_url_rejected() {
    let app = TestApp::spawn();

    let response = app.server.post("/shorten").json(&json!({})).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_unsupported_scheme_rejected() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": "javascript:alert(1)" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_shorten_requires_token() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/api/user/shorten")
        .json(&json!({ "original_url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");
}

#[tokio::test]
async fn test_user_shorten_rejects_forged_token() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/api/user/shorten")
        .authorization_bearer("user-1.deadbeef")
        .json(&json!({ "original_url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_shorten_with_bearer_token() {
    let app = TestApp::spawn();
    let token = app.token("user-1");

    let response = app
        .server
        .post("/api/user/shorten")
        .authorization_bearer(token)
        .json(&json!({ "original_url": "https://example.com", "slug": "mine" }))
        .await;

    response.assert_status_ok();

    let stored = app.links.find_slug("mine").unwrap();
    assert_eq!(stored.owner.as_deref(), Some("user-1"));
    assert!(stored.expires_at.is_none());
}

#[tokio::test]
async fn test_user_shorten_with_cookie() {
    let app = TestApp::spawn();
    let token = app.token("user-2");

    let response = app
        .server
        .post("/api/user/shorten")
        .add_header("Cookie", format!("theme=dark; token={}", token))
        .json(&json!({ "original_url": "https://example.com", "slug": "cookie" }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        app.links.find_slug("cookie").unwrap().owner.as_deref(),
        Some("user-2")
    );
}

#[tokio::test]
async fn test_short_url_uses_request_host_without_base_url() {
    let app = TestApp::with_options(common::TestOptions {
        base_url: None,
        ..Default::default()
    });

    let response = app
        .server
        .post("/shorten")
        .add_header("Host", "links.example.org")
        .add_header("X-Forwarded-Proto", "https")
        .json(&json!({ "original_url": "https://example.com", "slug": "hosted" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["short_url"], "https://links.example.org/hosted");
}

#[tokio::test]
async fn test_wrong_field_type_is_validation_error() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "original_url": 42 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(app.links.len(), 0);
}

#[tokio::test]
async fn test_non_json_body_is_validation_error() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/shorten")
        .text("original_url=https://example.com")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_user_shorten_malformed_json_is_validation_error() {
    let app = TestApp::spawn();

    let response = app
        .server
        .post("/api/user/shorten")
        .authorization_bearer(app.token("user-1"))
        .content_type("application/json")
        .bytes("{\"original_url\":".into())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_concurrent_same_slug_creates_one_link() {
    let app = TestApp::spawn();

    let first = async {
        app.server
            .post("/shorten")
            .json(&json!({ "original_url": "https://first.example", "slug": "race" }))
            .await
    };
    let second = async {
        app.server
            .post("/shorten")
            .json(&json!({ "original_url": "https://second.example", "slug": "race" }))
            .await
    };
    let (first, second) = tokio::join!(first, second);

    let mut statuses = [first.status_code(), second.status_code()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let winner = if first.status_code() == StatusCode::OK {
        "https://first.example"
    } else {
        "https://second.example"
    };
    assert_eq!(app.links.find_slug("race").unwrap().target, winner);
    assert_eq!(app.links.len(), 1);
}
