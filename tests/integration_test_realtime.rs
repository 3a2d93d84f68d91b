mod common;

use axum::http::{header, StatusCode};
use common::{parse_body, TestApp};
use futures::StreamExt;
use rehearsal_backend::domain::models::realtime::{band_topic, BandEvent};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_band_changes_reach_topic_subscribers() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[]).await;

    let mut rx = app.state.broadcaster.subscribe(&band_topic(&band_id)).await;

    let res = app.request("POST", &format!("/api/v1/bands/{}/members", band_id), Some(&leader), Some(json!({
        "email": member.email
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let event = rx.try_recv().expect("member_added was not published");
    assert_eq!(event.event, "member_added");
    assert_eq!(event.band_id, band_id);
    assert_eq!(event.data["user_id"], member.id.as_str());

    app.add_recurring(&member, 2, "18:00", "20:00").await;
    let event = rx.try_recv().expect("availability_updated was not published");
    assert_eq!(event.event, "availability_updated");
}

#[tokio::test]
async fn test_events_do_not_leak_between_bands() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let first = app.create_band(&leader, &[]).await;
    let second = app.create_band(&leader, &[]).await;

    let mut rx = app.state.broadcaster.subscribe(&band_topic(&second)).await;

    let res = app.request("PUT", &format!("/api/v1/bands/{}", first), Some(&leader), Some(json!({ "name": "Elsewhere" }))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let start = chrono::Utc::now() + chrono::Duration::days(2);
    let res = app.request("POST", "/api/v1/rehearsals", Some(&leader), Some(json!({
        "band_id": first,
        "title": "First band only",
        "start_time": start.to_rfc3339(),
        "end_time": (start + chrono::Duration::hours(1)).to_rfc3339()
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_event_stream_requires_membership() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let outsider = app.register("outsider").await;
    let band_id = app.create_band(&leader, &[]).await;

    let res = app.request("GET", &format!("/api/v1/bands/{}/events", band_id), Some(&outsider), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("GET", &format!("/api/v1/bands/{}/events", band_id), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_stream_delivers_band_events() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let band_id = app.create_band(&leader, &[]).await;

    let res = app.request("GET", &format!("/api/v1/bands/{}/events", band_id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/event-stream");

    let reached = app.state.broadcaster
        .publish(&band_topic(&band_id), BandEvent::new("rehearsal_created", &band_id, json!({ "title": "Jam" })))
        .await;
    assert_eq!(reached, 1);

    let mut frames = res.into_body().into_data_stream();
    let frame = timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("no event within timeout")
        .expect("stream ended")
        .expect("body error");
    let text = String::from_utf8(frame.to_vec()).unwrap();

    assert!(text.contains("event: rehearsal_created"));
    assert!(text.contains("\"title\":\"Jam\""));
    assert!(text.contains(&format!("\"band_id\":\"{}\"", band_id)));
}

#[tokio::test]
async fn test_health_is_public_while_api_is_not() {
    let app = TestApp::new().await;

    let res = app.request("GET", "/api/v1/bands", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(parse_body(res).await["error"], "Unauthorized");
}
