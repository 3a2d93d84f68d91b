mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp, TestUser};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_song(app: &TestApp, user: &TestUser, band_id: &str, title: &str, duration_sec: i64) -> Value {
    let res = app.request("POST", "/api/v1/songs", Some(user), Some(json!({
        "band_id": band_id,
        "title": title,
        "artist": "The Testers",
        "key": "Em",
        "bpm": 120,
        "duration_sec": duration_sec
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    parse_body(res).await
}

fn titles(songs: &Value) -> Vec<&str> {
    songs.as_array().unwrap().iter().map(|s| s["title"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_song_lifecycle_and_permissions() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let outsider = app.register("outsider").await;
    let band_id = app.create_band(&leader, &[&member]).await;

    let song = create_song(&app, &member, &band_id, "Opener", 200).await;
    let id = song["id"].as_str().unwrap();
    assert_eq!(song["key_signature"], "Em");
    assert_eq!(song["status"], "active");
    assert_eq!(song["difficulty"], "medium");

    let res = app.request("GET", &format!("/api/v1/songs/{}", id), Some(&outsider), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Creator edits, then the band admin archives it.
    let res = app.request("PUT", &format!("/api/v1/songs/{}", id), Some(&member), Some(json!({ "bpm": 132 }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["bpm"], 132);

    let res = app.request("PUT", &format!("/api/v1/songs/{}", id), Some(&leader), Some(json!({ "status": "archived" }))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let other = create_song(&app, &leader, &band_id, "Closer", 240).await;
    let res = app.request("DELETE", &format!("/api/v1/songs/{}", other["id"].as_str().unwrap()), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let archived = parse_body(app.request("GET", &format!("/api/v1/songs?band_id={}&status=archived", band_id), Some(&member), None).await).await;
    assert_eq!(titles(&archived), vec!["Opener"]);

    let search = parse_body(app.request("GET", "/api/v1/songs?search=clos", Some(&member), None).await).await;
    assert_eq!(titles(&search), vec!["Closer"]);

    let res = app.request("GET", &format!("/api/v1/songs?band_id={}", band_id), Some(&outsider), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let none = parse_body(app.request("GET", "/api/v1/songs", Some(&outsider), None).await).await;
    assert!(none.as_array().unwrap().is_empty());

    let res = app.request("DELETE", &format!("/api/v1/songs/{}", id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.request("GET", &format!("/api/v1/songs/{}", id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_song_validation() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let band_id = app.create_band(&leader, &[]).await;

    let res = app.request("POST", "/api/v1/songs", Some(&leader), Some(json!({
        "band_id": band_id,
        "bpm": 0,
        "duration_sec": 0,
        "status": "gigging",
        "difficulty": "brutal",
        "reference_url": "not a url"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    let fields: Vec<&str> = body["errors"].as_array().unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "bpm", "duration_sec", "status", "difficulty", "reference_url"]);

    let res = app.request("POST", "/api/v1/songs", Some(&leader), Some(json!({
        "band_id": Uuid::new_v4().to_string(),
        "title": "Ghost"
    }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_song_attachments_and_notes() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;
    let song = create_song(&app, &leader, &band_id, "Ballad", 300).await;
    let id = song["id"].as_str().unwrap();

    let res = app.request("POST", &format!("/api/v1/songs/{}/attachments", id), Some(&member), Some(json!({ "name": "" }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", &format!("/api/v1/songs/{}/attachments", id), Some(&member), Some(json!({
        "name": "Chart",
        "file_url": "https://files.example/ballad.pdf",
        "file_type": "application/pdf"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let attachment_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.request("POST", &format!("/api/v1/songs/{}/notes", id), Some(&member), Some(json!({ "content": "Watch the bridge" }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let note_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let detail = parse_body(app.request("GET", &format!("/api/v1/songs/{}", id), Some(&leader), None).await).await;
    assert_eq!(detail["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["member_notes"][0]["content"], "Watch the bridge");

    // Notes belong to their author, even against an admin.
    let res = app.request("PUT", &format!("/api/v1/songs/{}/notes/{}", id, note_id), Some(&leader), Some(json!({ "content": "Mine now" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.request("PUT", &format!("/api/v1/songs/{}/notes/{}", id, note_id), Some(&member), Some(json!({ "content": "Slower bridge" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["content"], "Slower bridge");

    let notes = parse_body(app.request("GET", &format!("/api/v1/songs/{}/notes", id), Some(&leader), None).await).await;
    assert_eq!(notes.as_array().unwrap().len(), 1);

    let res = app.request("DELETE", &format!("/api/v1/songs/{}/notes/{}", id, note_id), Some(&member), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Admins may remove any attachment.
    let res = app.request("DELETE", &format!("/api/v1/songs/{}/attachments/{}", id, attachment_id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.request("DELETE", &format!("/api/v1/songs/{}/attachments/{}", id, attachment_id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_setlist_with_ordered_songs() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let member = app.register("member").await;
    let band_id = app.create_band(&leader, &[&member]).await;

    let a = create_song(&app, &leader, &band_id, "Alpha", 180).await;
    let b = create_song(&app, &leader, &band_id, "Bravo", 240).await;
    let c = create_song(&app, &leader, &band_id, "Charlie", 200).await;

    let res = app.request("POST", "/api/v1/setlists", Some(&leader), Some(json!({
        "band_id": band_id,
        "name": "Friday gig",
        "songs": [
            { "song_id": b["id"], "order": 0 },
            { "song_id": a["id"], "order": 1, "duration_sec": 300 }
        ]
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let setlist = parse_body(res).await;
    let id = setlist["id"].as_str().unwrap().to_string();
    assert_eq!(setlist["is_template"], false);
    assert_eq!(titles(&setlist["songs"]), vec!["Bravo", "Alpha"]);
    assert_eq!(setlist["total_duration_sec"], 540);

    // Appended after the last slot.
    let res = app.request("POST", &format!("/api/v1/setlists/{}/songs", id), Some(&leader), Some(json!({ "song_id": c["id"] }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(parse_body(res).await["position"], 2);

    let res = app.request("POST", &format!("/api/v1/setlists/{}/songs", id), Some(&leader), Some(json!({ "song_id": a["id"] }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("POST", &format!("/api/v1/setlists/{}/songs", id), Some(&member), Some(json!({ "song_id": a["id"] }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reverse the order in one request.
    let current = parse_body(app.request("GET", &format!("/api/v1/setlists/{}", id), Some(&member), None).await).await;
    let entries = current["songs"].as_array().unwrap();
    let reversed: Vec<Value> = entries.iter().enumerate()
        .map(|(i, e)| json!({ "id": e["id"], "order": entries.len() - 1 - i }))
        .collect();
    let res = app.request("PUT", &format!("/api/v1/setlists/{}/songs/order", id), Some(&leader), Some(json!({ "songs": reversed }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(titles(&parse_body(res).await), vec!["Charlie", "Alpha", "Bravo"]);

    let res = app.request("DELETE", &format!("/api/v1/setlists/{}/songs/{}", id, b["id"].as_str().unwrap()), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("PUT", &format!("/api/v1/setlists/{}", id), Some(&leader), Some(json!({ "is_template": true, "duration_min": 45 }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["is_template"], true);

    let detail = parse_body(app.request("GET", &format!("/api/v1/setlists/{}", id), Some(&member), None).await).await;
    assert_eq!(titles(&detail["songs"]), vec!["Charlie", "Alpha"]);
    assert_eq!(detail["total_duration_sec"], 500);

    let listed = parse_body(app.request("GET", "/api/v1/setlists?search=friday", Some(&member), None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Deleting a song drops it from every setlist.
    let res = app.request("DELETE", &format!("/api/v1/songs/{}", c["id"].as_str().unwrap()), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let detail = parse_body(app.request("GET", &format!("/api/v1/setlists/{}", id), Some(&member), None).await).await;
    assert_eq!(titles(&detail["songs"]), vec!["Alpha"]);

    let res = app.request("DELETE", &format!("/api/v1/setlists/{}", id), Some(&leader), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_setlist_rejects_foreign_and_duplicate_songs() {
    let app = TestApp::new().await;
    let leader = app.register("leader").await;
    let band_id = app.create_band(&leader, &[]).await;
    let other_band = app.create_band(&leader, &[]).await;

    let ours = create_song(&app, &leader, &band_id, "Ours", 100).await;
    let theirs = create_song(&app, &leader, &other_band, "Theirs", 100).await;

    let res = app.request("POST", "/api/v1/setlists", Some(&leader), Some(json!({
        "band_id": band_id,
        "name": "Mixed",
        "songs": [{ "song_id": ours["id"] }, { "song_id": theirs["id"] }]
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", "/api/v1/setlists", Some(&leader), Some(json!({
        "band_id": band_id,
        "name": "Twice",
        "songs": [{ "song_id": ours["id"] }, { "song_id": ours["id"] }]
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing was half-written by the rejected requests.
    let listed = parse_body(app.request("GET", &format!("/api/v1/setlists?band_id={}", band_id), Some(&leader), None).await).await;
    assert!(listed.as_array().unwrap().is_empty());

    let res = app.request("POST", "/api/v1/setlists", Some(&leader), Some(json!({ "band_id": band_id, "name": "Empty" }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.request("PUT", &format!("/api/v1/setlists/{}/songs/order", id), Some(&leader), Some(json!({
        "songs": [{ "id": Uuid::new_v4().to_string(), "order": 0 }]
    }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("PUT", &format!("/api/v1/setlists/{}/songs/order", id), Some(&leader), Some(json!({ "songs": [] }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
