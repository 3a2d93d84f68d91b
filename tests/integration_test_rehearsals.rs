mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp, TestUser};
use rehearsal_backend::background::send_due_reminders;
use serde_json::{json, Value};
use uuid::Uuid;

fn rehearsal_payload(band_id: &str, hours_ahead: i64) -> Value {
    let start = Utc::now() + Duration::hours(hours_ahead);
    json!({
        "band_id": band_id,
        "title": "Setlist run-through",
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(2)).to_rfc3339()
    })
}

async fn create_rehearsal(app: &TestApp, user: &TestUser, payload: Value) -> Value {
    let res = app.request("POST", "/api/v1/rehearsals", Some(user), Some(payload)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    parse_body(res).await
}

async fn notification_types(app: &TestApp, user: &TestUser) -> Vec<String> {
    let body = parse_body(app.request("GET", "/api/v1/notifications", Some(user), None).await).await;
    body["notifications"].as_array().unwrap()
        .iter()
        .map(|n| n["notification_type"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_rehearsal_invites_every_member() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let drummer = app.register("drummer").await;
    let band_id = app.create_band(&leader, &[&drummer]).await;

    let rehearsal = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 72)).await;
    assert_eq!(rehearsal["status"], "scheduled");
    assert_eq!(rehearsal["created_by"], leader.id.as_str());

    let id = rehearsal["id"].as_str().unwrap();
    let detail = parse_body(app.request("GET", &format!("/api/v1/rehearsals/{}", id), Some(&drummer), None).await).await;
    let attendees = detail["attendees"].as_array().unwrap();
    assert_eq!(attendees.len(), 2);
    assert!(attendees.iter().all(|a| a["status"] == "pending"));

    assert!(notification_types(&app, &drummer).await.contains(&"rehearsal_created".to_string()));
    assert!(!notification_types(&app, &leader).await.contains(&"rehearsal_created".to_string()));
}

#[tokio::test]
async fn test_create_rehearsal_validation() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let outsider = app.register("outsider").await;
    let band_id = app.create_band(&leader, &[]).await;

    let start = Utc::now() + Duration::days(1);
    let res = app.request("POST", "/api/v1/rehearsals", Some(&leader), Some(json!({
        "band_id": "nope",
        "title": "",
        "start_time": start.to_rfc3339(),
        "end_time": (start - Duration::hours(1)).to_rfc3339()
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    let fields: Vec<&str> = body["errors"].as_array().unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["band_id", "title", "end_time"]);

    let res = app.request("POST", "/api/v1/rehearsals", Some(&outsider), Some(rehearsal_payload(&band_id, 24))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut with_venue = rehearsal_payload(&band_id, 24);
    with_venue["venue_id"] = json!(Uuid::new_v4().to_string());
    let res = app.request("POST", "/api/v1/rehearsals", Some(&leader), Some(with_venue)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attendance_updates() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let singer = app.register("singer").await;
    let band_id = app.create_band(&leader, &[&singer]).await;
    let rehearsal = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 48)).await;
    let id = rehearsal["id"].as_str().unwrap();

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}/attendance", id), Some(&singer), Some(json!({
        "status": "maybe"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}/attendance", id), Some(&singer), Some(json!({
        "status": "confirmed",
        "comment": "Bringing the new mic"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let attendance = parse_body(res).await;
    assert_eq!(attendance["status"], "confirmed");
    assert!(attendance["responded_at"].is_string());

    let attendees = parse_body(app.request("GET", &format!("/api/v1/rehearsals/{}/attendees", id), Some(&leader), None).await).await;
    let singer_row = attendees.as_array().unwrap()
        .iter()
        .find(|a| a["user_id"] == singer.id.as_str())
        .unwrap();
    assert_eq!(singer_row["status"], "confirmed");
    assert_eq!(singer_row["comment"], "Bringing the new mic");
}

#[tokio::test]
async fn test_update_permissions_and_cancellation() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;
    let rehearsal = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 48)).await;
    let id = rehearsal["id"].as_str().unwrap();

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}", id), Some(&member), Some(json!({ "title": "Mine now" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}", id), Some(&leader), Some(json!({ "status": "postponed" }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}", id), Some(&leader), Some(json!({
        "end_time": (Utc::now() - Duration::days(1)).to_rfc3339()
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}", id), Some(&leader), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "cancelled");

    assert!(notification_types(&app, &member).await.contains(&"rehearsal_cancelled".to_string()));

    let scheduled = parse_body(app.request("GET", &format!("/api/v1/rehearsals?band_id={}&status=scheduled", band_id), Some(&member), None).await).await;
    assert!(scheduled.as_array().unwrap().is_empty());
    let cancelled = parse_body(app.request("GET", &format!("/api/v1/rehearsals?band_id={}&status=cancelled", band_id), Some(&member), None).await).await;
    assert_eq!(cancelled.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_only_shows_own_bands() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let stranger = app.register("stranger").await;
    let band_id = app.create_band(&leader, &[]).await;
    create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 24)).await;

    let mine = parse_body(app.request("GET", "/api/v1/rehearsals", Some(&leader), None).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let theirs = parse_body(app.request("GET", "/api/v1/rehearsals", Some(&stranger), None).await).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let res = app.request("GET", "/api/v1/rehearsals?start_date=someday", Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_rehearsal() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;
    let rehearsal = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 24)).await;
    let id = rehearsal["id"].as_str().unwrap();

    let res = app.request("DELETE", &format!("/api/v1/rehearsals/{}", id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("DELETE", &format!("/api/v1/rehearsals/{}", id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("GET", &format!("/api/v1/rehearsals/{}", id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reminders_are_sent_once() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;

    let soon = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 2)).await;
    create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 72)).await;

    let sent = send_due_reminders(&app.state, Utc::now()).await.unwrap();
    assert_eq!(sent, 1);

    let again = send_due_reminders(&app.state, Utc::now()).await.unwrap();
    assert_eq!(again, 0);

    for user in [&leader, &member] {
        let types = notification_types(&app, user).await;
        assert_eq!(types.iter().filter(|t| *t == "rehearsal_reminder").count(), 1);
    }

    // Moving the rehearsal re-arms its reminder.
    let id = soon["id"].as_str().unwrap();
    let new_start = Utc::now() + Duration::hours(3);
    let res = app.request("PUT", &format!("/api/v1/rehearsals/{}", id), Some(&leader), Some(json!({
        "start_time": new_start.to_rfc3339(),
        "end_time": (new_start + Duration::hours(2)).to_rfc3339()
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["reminder_sent"], false);

    let rearmed = send_due_reminders(&app.state, Utc::now()).await.unwrap();
    assert_eq!(rearmed, 1);
}

#[tokio::test]
async fn test_claimed_reminder_is_not_sent_again() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;
    let soon = create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 2)).await;
    let id = soon["id"].as_str().unwrap();

    // The flag is set before any notification is written.
    assert!(app.state.rehearsal_repo.claim_reminder(id).await.unwrap());
    assert!(!app.state.rehearsal_repo.claim_reminder(id).await.unwrap());

    let sent = send_due_reminders(&app.state, Utc::now()).await.unwrap();
    assert_eq!(sent, 0);
    assert!(!notification_types(&app, &member).await.contains(&"rehearsal_reminder".to_string()));
}

#[tokio::test]
async fn test_concurrent_workers_remind_once() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;
    create_rehearsal(&app, &leader, rehearsal_payload(&band_id, 3)).await;

    let now = Utc::now();
    let (first, second) = tokio::join!(
        send_due_reminders(&app.state, now),
        send_due_reminders(&app.state, now),
    );
    assert_eq!(first.unwrap() + second.unwrap(), 1);

    let types = notification_types(&app, &member).await;
    assert_eq!(types.iter().filter(|t| *t == "rehearsal_reminder").count(), 1);
}
