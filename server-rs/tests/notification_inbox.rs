mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

/// Registers an admin and a user with an org, and has the user submit one
/// league so both inboxes hold a notification.
async fn seeded() -> (TestApp, String) {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;
    app.submit_league("u2", &org, "Wednesday Softball").await;
    (app, org)
}

#[tokio::test]
async fn mark_read_is_scoped_to_the_recipient() {
    let (app, _) = seeded().await;
    let (_, inbox) = app.get("/v1/notifications", Some("u2")).await;
    let id = inbox["data"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .patch(&format!("/v1/notifications/{id}/read"), Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, count) = app.get("/v1/notifications/unread-count", Some("u2")).await;
    assert_eq!(count["count"], 1);

    let (status, body) = app
        .patch(&format!("/v1/notifications/{id}/read"), Some("u2"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["read"], true);
    let (_, count) = app.get("/v1/notifications/unread-count", Some("u2")).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn read_all_clears_only_the_callers_inbox() {
    let (app, _) = seeded().await;

    let (status, body) = app.patch("/v1/notifications/read-all", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (_, admin) = app.get("/v1/notifications/unread-count", Some("u1")).await;
    let (_, user) = app.get("/v1/notifications/unread-count", Some("u2")).await;
    assert_eq!(admin["count"], 0);
    assert_eq!(user["count"], 1);
}

#[tokio::test]
async fn listing_is_paginated_newest_first() {
    let (app, org) = seeded().await;
    app.submit_league("u2", &org, "Thursday Volleyball").await;

    let (status, page) = app
        .get("/v1/notifications?limit=1&offset=0", Some("u2"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["limit"], 1);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert!(page["data"][0]["message"]
        .as_str()
        .unwrap()
        .contains("Thursday Volleyball"));

    let (status, _) = app.get("/v1/notifications?offset=-1", Some("u2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn disabled_preference_suppresses_row_and_broadcast() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;

    let (status, prefs) = app.get("/v1/notifications/preferences", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["leagueSubmitted"], true);

    let (status, prefs) = app
        .put(
            "/v1/notifications/preferences",
            Some("u1"),
            json!({ "leagueSubmitted": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["leagueSubmitted"], false);
    assert_eq!(prefs["leagueApproved"], true);

    app.broadcaster.sent.lock().unwrap().clear();
    app.submit_league("u2", &org, "Quiet League").await;

    let (_, inbox) = app.get("/v1/notifications", Some("u1")).await;
    assert_eq!(inbox["total"], 0);

    let topics: Vec<String> = app
        .broadcaster
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(topic, _)| topic.clone())
        .collect();
    assert!(!topics.contains(&"notifications:user:u1".to_string()));
    assert!(topics.contains(&"notifications:user:u2".to_string()));
}

#[tokio::test]
async fn submissions_are_broadcast_to_the_admin_topic() {
    let (app, _) = seeded().await;

    let sent = app.broadcaster.sent.lock().unwrap().clone();
    let admin = sent
        .iter()
        .find(|(topic, _)| topic == "notifications:admins")
        .expect("admin announcement");
    assert_eq!(admin.1["type"], "league_submitted");

    let personal = sent
        .iter()
        .find(|(topic, _)| topic == "notifications:user:u1")
        .expect("admin inbox broadcast");
    assert_eq!(personal.1["userId"], "u1");
}
