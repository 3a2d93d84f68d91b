mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_venue_lifecycle() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let other = app.register("other").await;

    let res = app.request("POST", "/api/v1/venues", Some(&owner), Some(json!({
        "name": "Basement Studio",
        "city": "Leipzig",
        "has_pa": true,
        "hourly_rate": 15.5,
        "contact_email": "booking@basement.example"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let venue = parse_body(res).await;
    let id = venue["id"].as_str().unwrap();
    assert_eq!(venue["has_pa"], true);
    assert_eq!(venue["has_backline"], false);

    let res = app.request("PUT", &format!("/api/v1/venues/{}", id), Some(&other), Some(json!({ "name": "Taken" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("DELETE", &format!("/api/v1/venues/{}", id), Some(&other), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("PUT", &format!("/api/v1/venues/{}", id), Some(&owner), Some(json!({ "has_backline": true }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = parse_body(res).await;
    assert_eq!(updated["has_backline"], true);
    assert_eq!(updated["name"], "Basement Studio");

    let res = app.request("GET", &format!("/api/v1/venues/{}", id), Some(&other), None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("DELETE", &format!("/api/v1/venues/{}", id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("GET", &format!("/api/v1/venues/{}", id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_venue_validation() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;

    let res = app.request("POST", "/api/v1/venues", Some(&owner), Some(json!({
        "hourly_rate": -3.0,
        "contact_email": "nope"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    let fields: Vec<&str> = body["errors"].as_array().unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "contact_email", "hourly_rate"]);

    let res = app.request("GET", "/api/v1/venues/not-a-uuid", Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_venue_search_filters() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;

    for (name, city, has_pa) in [("Rock Cellar", "Berlin", true), ("Quiet Room", "Berlin", false), ("Riverside Hall", "Hamburg", true)] {
        let res = app.request("POST", "/api/v1/venues", Some(&owner), Some(json!({
            "name": name, "city": city, "has_pa": has_pa
        }))).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let all = parse_body(app.request("GET", "/api/v1/venues", Some(&owner), None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let berlin = parse_body(app.request("GET", "/api/v1/venues?city=Berlin", Some(&owner), None).await).await;
    assert_eq!(berlin.as_array().unwrap().len(), 2);

    let with_pa = parse_body(app.request("GET", "/api/v1/venues?city=Berlin&has_pa=true", Some(&owner), None).await).await;
    assert_eq!(with_pa.as_array().unwrap().len(), 1);
    assert_eq!(with_pa[0]["name"], "Rock Cellar");

    let search = parse_body(app.request("GET", "/api/v1/venues?search=river", Some(&owner), None).await).await;
    assert_eq!(search.as_array().unwrap().len(), 1);
    assert_eq!(search[0]["city"], "Hamburg");
}

#[tokio::test]
async fn test_notification_inbox() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;

    // One band_member_added notification per band.
    app.create_band(&leader, &[&member]).await;
    app.create_band(&leader, &[&member]).await;
    app.create_band(&leader, &[&member]).await;

    let inbox = parse_body(app.request("GET", "/api/v1/notifications?limit=2", Some(&member), None).await).await;
    assert_eq!(inbox["unread_count"], 3);
    assert_eq!(inbox["limit"], 2);
    let items = inbox["notifications"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let first_id = items[0]["id"].as_str().unwrap().to_string();
    let res = app.request("PUT", &format!("/api/v1/notifications/{}/read", first_id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let read = parse_body(res).await;
    assert_eq!(read["is_read"], true);
    assert!(read["read_at"].is_string());

    let unread = parse_body(app.request("GET", "/api/v1/notifications?unread_only=true", Some(&member), None).await).await;
    assert_eq!(unread["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(unread["unread_count"], 2);

    // Notifications belong to their recipient only.
    let res = app.request("PUT", &format!("/api/v1/notifications/{}/read", first_id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = app.request("DELETE", &format!("/api/v1/notifications/{}", first_id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("PUT", "/api/v1/notifications/read-all", Some(&member), None).await;
    assert_eq!(parse_body(res).await["updated"], 2);

    let res = app.request("DELETE", &format!("/api/v1/notifications/{}", first_id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("DELETE", "/api/v1/notifications", Some(&member), None).await;
    assert_eq!(parse_body(res).await["deleted"], 2);

    let empty = parse_body(app.request("GET", "/api/v1/notifications", Some(&member), None).await).await;
    assert_eq!(empty["unread_count"], 0);
    assert!(empty["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_paging_validation() {
    let app = TestApp::new().await;
    let user = app.register("user").await;

    let res = app.request("GET", "/api/v1/notifications?limit=0", Some(&user), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("GET", "/api/v1/notifications?limit=101", Some(&user), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("GET", "/api/v1/notifications?offset=-1", Some(&user), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
