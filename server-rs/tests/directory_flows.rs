mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ids, league_body, TestApp};

#[tokio::test]
async fn first_registrant_becomes_admin() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;

    let (status, user) = app.get("/v1/auth/user/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "admin");
    assert_eq!(user["isActive"], true);

    app.register("u2", "").await;
    let (_, user) = app.get("/v1/auth/user/u2", None).await;
    assert_eq!(user["role"], "user");
}

#[tokio::test]
async fn registering_twice_is_a_conflict() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;

    let (status, body) = app
        .post(
            "/v1/auth/register",
            None,
            json!({ "clerkID": "u1", "email": "again@example.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn registration_without_email_uses_provider_primary() {
    let app = TestApp::new();
    app.identity
        .emails
        .lock()
        .unwrap()
        .insert("u1".into(), "primary@example.test".into());

    let (status, body) = app
        .post("/v1/auth/register", None, json!({ "clerkID": "u1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "primary@example.test");
    assert!(body["organization"].is_null());

    let synced = app.identity.synced.lock().unwrap().clone();
    assert_eq!(
        synced,
        vec![(String::from("u1"), String::from("admin"), String::new())]
    );
}

#[tokio::test]
async fn login_records_visit_and_issues_token() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;

    let (status, body) = app
        .post("/v1/auth/login", None, json!({ "sessionID": "session-u1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["loginCount"], 1);
    assert_eq!(body["supabaseToken"].as_str().unwrap().split('.').count(), 3);

    let (status, _) = app
        .post("/v1/auth/login", None, json!({ "sessionID": "session-ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_sport_is_published_immediately() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;

    let (status, body) = app
        .post("/v1/sports", Some("u1"), json!({ "name": "Tennis" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sport"]["status"], "approved");

    let (_, list) = app.get("/v1/sports", None).await;
    let names: Vec<&str> = list["sports"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Tennis"]);
}

#[tokio::test]
async fn user_sport_waits_for_review_but_is_known() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    app.register("u2", "").await;

    let (status, body) = app
        .post("/v1/sports", Some("u2"), json!({ "name": "Chess" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sport"]["status"], "pending");
    let chess_id = body["sport"]["id"].as_i64().unwrap();

    let (_, list) = app.get("/v1/sports", None).await;
    assert!(list["sports"].as_array().unwrap().is_empty());

    let (_, exists) = app.get("/v1/sports/exists?name=chess", None).await;
    assert_eq!(exists["exists"], true);

    // Same name in another case resolves to the stored row.
    let (status, again) = app
        .post("/v1/sports", Some("u2"), json!({ "name": "CHESS" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["sport"]["id"], chess_id);

    let (status, _) = app.get(&format!("/v1/sports/{chess_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn venue_addresses_deduplicate_case_insensitively() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;

    let venue = json!({ "name": "Riverside Park", "address": "1 River Rd, Springfield" });
    let (status, first) = app.post("/v1/venues", Some("u1"), venue).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = app
        .post(
            "/v1/venues",
            Some("u1"),
            json!({ "name": "Riverside", "address": "1 river rd, springfield" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["venue"]["id"], second["venue"]["id"]);
}

#[tokio::test]
async fn league_approval_publishes_and_notifies_creator() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;

    let league = app.submit_league("u2", &org, "Tuesday Kickball").await;
    assert_eq!(league["status"], "pending");
    let id = league["id"].as_i64().unwrap();

    let (_, public) = app.get("/v1/leagues", None).await;
    assert!(!ids(&public["data"]).contains(&id));

    let (status, pending) = app.get("/v1/leagues/admin/pending", Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&pending["data"]).contains(&id));

    let (status, approved) = app
        .put(&format!("/v1/leagues/{id}/approve"), Some("u1"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["league"]["status"], "approved");
    assert!(approved["league"]["rejection_reason"].is_null());

    let (_, public) = app.get("/v1/leagues", None).await;
    assert_eq!(ids(&public["data"]), vec![id]);
    assert_eq!(public["total"], 1);

    let (_, inbox) = app.get("/v1/notifications", Some("u2")).await;
    let kinds: Vec<&str> = inbox["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["type"].as_str())
        .collect();
    assert_eq!(kinds.first(), Some(&"league_approved"));
    assert!(kinds.contains(&"league_submitted"));

    // The admin heard about the submission too.
    let (_, admin_inbox) = app.get("/v1/notifications", Some("u1")).await;
    assert_eq!(admin_inbox["data"][0]["type"], "league_submitted");
    assert_eq!(admin_inbox["data"][0]["leagueId"], id);
}

#[tokio::test]
async fn approving_twice_notifies_once() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;
    let league = app.submit_league("u2", &org, "Bowling").await;
    let id = league["id"].as_i64().unwrap();

    for _ in 0..2 {
        let (status, _) = app
            .put(&format!("/v1/leagues/{id}/approve"), Some("u1"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, inbox) = app.get("/v1/notifications", Some("u2")).await;
    let approvals = inbox["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["type"] == "league_approved")
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn rejection_keeps_the_latest_reason() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;
    let league = app.submit_league("u2", &org, "Dodgeball").await;
    let id = league["id"].as_i64().unwrap();

    let (status, _) = app
        .put(
            &format!("/v1/leagues/{id}/reject"),
            Some("u1"),
            json!({ "rejection_reason": "incomplete" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.get(&format!("/v1/leagues/admin/{id}"), Some("u1")).await;
    assert_eq!(detail["league"]["status"], "rejected");
    assert_eq!(detail["league"]["rejection_reason"], "incomplete");

    let (_, inbox) = app.get("/v1/notifications", Some("u2")).await;
    assert_eq!(inbox["data"][0]["type"], "league_rejected");
    assert!(inbox["data"][0]["message"]
        .as_str()
        .unwrap()
        .contains("incomplete"));

    app.put(
        &format!("/v1/leagues/{id}/reject"),
        Some("u1"),
        json!({ "rejection_reason": "missing venue" }),
    )
    .await;
    let (_, detail) = app.get(&format!("/v1/leagues/admin/{id}"), Some("u1")).await;
    assert_eq!(detail["league"]["rejection_reason"], "missing venue");

    let (status, _) = app.get(&format!("/v1/leagues/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_listing_is_the_approved_subset_of_the_admin_listing() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;
    let approved = app.submit_league("u2", &org, "Approved").await;
    let rejected = app.submit_league("u2", &org, "Rejected").await;
    let pending = app.submit_league("u2", &org, "Pending").await;
    app.put(
        &format!("/v1/leagues/{}/approve", approved["id"]),
        Some("u1"),
        json!({}),
    )
    .await;
    app.put(
        &format!("/v1/leagues/{}/reject", rejected["id"]),
        Some("u1"),
        json!({ "rejection_reason": "duplicate" }),
    )
    .await;

    let (_, admin) = app.get("/v1/leagues/admin", Some("u1")).await;
    let mut all = ids(&admin["data"]);
    all.sort();
    let mut expected: Vec<i64> = [&approved, &rejected, &pending]
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    expected.sort();
    assert_eq!(all, expected);

    let (_, public) = app.get("/v1/leagues", None).await;
    assert_eq!(ids(&public["data"]), vec![approved["id"].as_i64().unwrap()]);
    assert!(public["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["status"] == "approved"));
}

#[tokio::test]
async fn leagues_of_deleted_organizations_leave_the_public_listing() {
    let app = TestApp::new();
    let org = app.register_with_org("u1", "Acme").await;
    let league = app.submit_league("u1", &org, "Admin League").await;
    let id = league["id"].as_i64().unwrap();

    let (status, _) = app.get(&format!("/v1/leagues/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    app.send(
        axum::http::Method::DELETE,
        &format!("/v1/organizations/{org}"),
        Some("u1"),
        None,
    )
    .await;

    let (_, public) = app.get("/v1/leagues", None).await;
    assert_eq!(public["total"], 0);
    let (status, _) = app.get(&format!("/v1/leagues/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;
    let league = app.submit_league("u2", &org, "Futsal").await;
    let id = league["id"].as_i64().unwrap();

    let (status, body) = app
        .put(
            &format!("/v1/leagues/{id}/reject"),
            Some("u1"),
            json!({ "rejection_reason": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().starts_with("Validation failed:"));

    let (status, _) = app
        .put(
            &format!("/v1/leagues/{id}/reject"),
            Some("u1"),
            json!({ "rejection_reason": "x".repeat(501) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approving_a_league_promotes_its_pending_sport_and_venue() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;

    let (_, sport) = app
        .post("/v1/sports", Some("u2"), json!({ "name": "Ultimate" }))
        .await;
    let (_, venue) = app
        .post(
            "/v1/venues",
            Some("u2"),
            json!({ "name": "Field 4", "address": "4 Park Ave" }),
        )
        .await;
    let sport_id = sport["sport"]["id"].as_i64().unwrap();
    let venue_id = venue["venue"]["id"].as_i64().unwrap();

    let mut body = league_body("Sunday Ultimate");
    body["sport_id"] = json!(sport_id);
    body["venue_id"] = json!(venue_id);
    let (status, created) = app
        .post(&format!("/v1/leagues?org_id={org}"), Some("u2"), body)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["league"]["id"].as_i64().unwrap();

    let (status, _) = app
        .put(&format!("/v1/leagues/{id}/approve"), Some("u1"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, sport) = app.get(&format!("/v1/sports/{sport_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sport["sport"]["status"], "approved");
    let (status, _) = app.get(&format!("/v1/venues/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_sport_reference_is_rejected() {
    let app = TestApp::new();
    let org = app.register_with_org("u1", "Acme").await;

    let mut body = league_body("Ghost League");
    body["sport_id"] = json!(999);
    let (status, _) = app
        .post(&format!("/v1/leagues?org_id={org}"), Some("u1"), body)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn draft_save_is_an_upsert() {
    let app = TestApp::new();
    app.register("u1", "Acme").await;
    let org = app.register_with_org("u2", "Northside Rec").await;

    let uri = format!("/v1/leagues/drafts?org_id={org}");
    let (status, first) = app
        .post(&uri, Some("u2"), json!({ "draft_data": { "name": "B1" } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app
        .post(&uri, Some("u2"), json!({ "draft_data": { "name": "B2" } }))
        .await;

    assert_eq!(first["draft"]["id"], second["draft"]["id"]);
    assert_eq!(first["draft"]["created_at"], second["draft"]["created_at"]);
    assert_eq!(second["draft"]["draft_data"]["name"], "B2");

    let (_, drafts) = app
        .get(&format!("/v1/leagues/drafts/org/{org}"), Some("u2"))
        .await;
    assert_eq!(drafts["drafts"].as_array().unwrap().len(), 1);

    let (_, current) = app.get(&uri, Some("u2")).await;
    assert_eq!(current["draft"]["draft_data"]["name"], "B2");
}

#[tokio::test]
async fn draft_payload_must_be_an_object() {
    let app = TestApp::new();
    let org = app.register_with_org("u1", "Acme").await;

    let (status, _) = app
        .post(
            &format!("/v1/leagues/drafts?org_id={org}"),
            Some("u1"),
            json!({ "draft_data": [1, 2, 3] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn templates_round_trip_within_the_org() {
    let app = TestApp::new();
    let org = app.register_with_org("u1", "Acme").await;

    let (status, created) = app
        .post(
            &format!("/v1/leagues/templates?org_id={org}"),
            Some("u1"),
            json!({ "name": "Fall default", "template_data": { "pricing_amount": 100 } }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["template"]["id"].as_i64().unwrap();

    let (status, updated) = app
        .put(
            &format!("/v1/leagues/templates/{id}"),
            Some("u1"),
            json!({ "name": "Fall v2", "template_data": { "pricing_amount": 120 } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["template"]["name"], "Fall v2");

    let (_, list) = app
        .get(&format!("/v1/leagues/templates?org_id={org}"), Some("u1"))
        .await;
    assert_eq!(ids(&list["templates"]), vec![id]);

    let (status, _) = app
        .send(
            axum::http::Method::DELETE,
            &format!("/v1/leagues/templates/{id}"),
            Some("u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .get(&format!("/v1/leagues/templates/{id}"), Some("u1"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new();
    for uri in ["/v1", "/v1/", "/health"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
