mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_band_makes_founder_admin() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;

    let res = app.request("POST", "/api/v1/bands", Some(&owner), Some(json!({
        "name": "  Night Owls ",
        "genre": "jazz"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let band = parse_body(res).await;
    assert_eq!(band["name"], "Night Owls");
    let band_id = band["id"].as_str().unwrap();

    let detail = parse_body(app.request("GET", &format!("/api/v1/bands/{}", band_id), Some(&owner), None).await).await;
    assert_eq!(detail["genre"], "jazz");
    let members = detail["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], owner.id.as_str());
    assert_eq!(members[0]["role"], "admin");

    let list = parse_body(app.request("GET", "/api/v1/bands", Some(&owner), None).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_band_name_is_required() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;

    let res = app.request("POST", "/api/v1/bands", Some(&owner), Some(json!({ "name": "   " }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["errors"][0]["field"], "name");
}

#[tokio::test]
async fn test_band_access_rules() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let outsider = app.register("outsider").await;
    let band_id = app.create_band(&owner, &[]).await;

    let res = app.request("GET", &format!("/api/v1/bands/{}", band_id), Some(&outsider), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("GET", &format!("/api/v1/bands/{}", Uuid::new_v4()), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("GET", "/api/v1/bands/not-a-uuid", Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("GET", &format!("/api/v1/bands/{}", band_id), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_member_notifies_and_rejects_duplicates() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let bassist = app.register("bassist").await;
    let band_id = app.create_band(&owner, &[&bassist]).await;

    let notifications = parse_body(app.request("GET", "/api/v1/notifications", Some(&bassist), None).await).await;
    assert_eq!(notifications["unread_count"], 1);
    assert_eq!(notifications["notifications"][0]["notification_type"], "band_member_added");
    assert_eq!(notifications["notifications"][0]["data"]["band_id"], band_id.as_str());

    let dup = app.request("POST", &format!("/api/v1/bands/{}/members", band_id), Some(&owner), Some(json!({
        "email": bassist.email
    }))).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let missing = app.request("POST", &format!("/api/v1/bands/{}/members", band_id), Some(&owner), Some(json!({
        "email": "ghost@example.com"
    }))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let bad_role = app.request("POST", &format!("/api/v1/bands/{}/members", band_id), Some(&owner), Some(json!({
        "email": "ghost@example.com",
        "role": "roadie"
    }))).await;
    assert_eq!(bad_role.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_admins_manage_band() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let member = app.register("member").await;
    let other = app.register("other").await;
    let band_id = app.create_band(&owner, &[&member]).await;

    let res = app.request("PUT", &format!("/api/v1/bands/{}", band_id), Some(&member), Some(json!({ "name": "Hijacked" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("POST", &format!("/api/v1/bands/{}/members", band_id), Some(&member), Some(json!({ "email": other.email }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("DELETE", &format!("/api/v1/bands/{}/members/{}", band_id, owner.id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("PUT", &format!("/api/v1/bands/{}", band_id), Some(&owner), Some(json!({ "name": "Renamed" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["name"], "Renamed");
}

#[tokio::test]
async fn test_last_admin_is_protected() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&owner, &[&member]).await;

    let res = app.request("PUT", &format!("/api/v1/bands/{}/members/{}", band_id, owner.id), Some(&owner), Some(json!({ "role": "member" }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("DELETE", &format!("/api/v1/bands/{}/members/{}", band_id, owner.id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Promote the member, after which the owner may step down.
    let res = app.request("PUT", &format!("/api/v1/bands/{}/members/{}", band_id, member.id), Some(&owner), Some(json!({ "role": "admin", "instrument": "keys" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["instrument"], "keys");

    let res = app.request("DELETE", &format!("/api/v1/bands/{}/members/{}", band_id, owner.id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("GET", &format!("/api/v1/bands/{}", band_id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_can_leave_and_band_can_be_deleted() {
    let app = TestApp::new().await;
    let owner = app.register("owner").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&owner, &[&member]).await;

    let res = app.request("DELETE", &format!("/api/v1/bands/{}/members/{}", band_id, member.id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let members = parse_body(app.request("GET", &format!("/api/v1/bands/{}/members", band_id), Some(&owner), None).await).await;
    assert_eq!(members.as_array().unwrap().len(), 1);

    let res = app.request("DELETE", &format!("/api/v1/bands/{}", band_id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("GET", &format!("/api/v1/bands/{}", band_id), Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
