mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{parse_body, TestApp, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_register_sets_cookies_and_returns_profile() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "Drummer@Example.com",
        "password": PASSWORD,
        "first_name": "Dana",
        "last_name": "Drums",
        "timezone": "Europe/Berlin"
    }))).await;

    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(cookie_value(&res, "access_token").is_some());
    assert!(cookie_value(&res, "refresh_token").is_some());

    let body = parse_body(res).await;
    assert_eq!(body["user"]["email"], "drummer@example.com");
    assert_eq!(body["user"]["timezone"], "Europe/Berlin");
    assert_eq!(body["csrf_token"].as_str().unwrap().len(), 32);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_input() {
    let app = TestApp::new().await;
    let user = app.register("guitar").await;

    let dup = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": user.email.to_uppercase(),
        "password": PASSWORD,
        "first_name": "G",
        "last_name": "T"
    }))).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let weak = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "not-an-email",
        "password": "short",
        "first_name": " ",
        "last_name": "T",
        "timezone": "Mars/Olympus"
    }))).await;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let body = parse_body(weak).await;
    let fields: Vec<&str> = body["errors"].as_array().unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "first_name", "timezone"]);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;
    let user = app.register("keys").await;

    let bad = app.login(&user.email, "Wrong!Pass1").await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    let unknown = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let ok = app.login(&user.email, PASSWORD).await;
    assert_eq!(ok.status(), StatusCode::OK);

    let me = app.request("GET", "/api/v1/auth/me", Some(&user), None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(parse_body(me).await["id"], user.id.as_str());

    let anonymous = app.request("GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutation_requires_csrf_header() {
    let app = TestApp::new().await;
    let user = app.register("vocals").await;

    let res = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/bands")
            .header(header::COOKIE, format!("access_token={}", user.access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "No Csrf" }).to_string()))
            .unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut forged = user.clone();
    forged.csrf_token = "forged".into();
    let res = app.request("POST", "/api/v1/bands", Some(&forged), Some(json!({ "name": "Forged" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = TestApp::new().await;
    let user = app.register("synth").await;

    let login = app.login(&user.email, PASSWORD).await;
    let refresh_token = cookie_value(&login, "refresh_token").expect("No refresh cookie");

    let refresh = |token: String| {
        let router = app.router.clone();
        async move {
            router.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={}", token))
                    .body(Body::empty())
                    .unwrap()
            ).await.unwrap()
        }
    };

    let first = refresh(refresh_token.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = cookie_value(&first, "refresh_token").expect("No rotated refresh cookie");
    assert_ne!(rotated, refresh_token);

    let replay = refresh(refresh_token).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let logout = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/logout")
            .header(header::COOKIE, format!("refresh_token={}", rotated))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let after_logout = refresh(rotated).await;
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let res = app.request("GET", "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await, json!({ "status": "OK" }));
}
