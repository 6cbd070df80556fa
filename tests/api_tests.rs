use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use hackerbase::Config;
use hackerbase::api::{self, AppState};
use hackerbase::seed::SeedHacker;

const FIXTURE: &str = r#"[
  {
    "name": "Ann",
    "email": "a@x.com",
    "phone": "555",
    "badge_code": "B1",
    "scans": [
      {
        "activity_name": "Talk",
        "activity_category": "workshop",
        "scanned_at": "2024-01-01T10:00:00Z"
      }
    ]
  },
  {
    "name": "Bob",
    "email": "b@x.com",
    "phone": "556",
    "badge_code": "",
    "scans": []
  }
]"#;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps the in-memory database alive and shared.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = api::create_app_state_from_config(&config)
        .await
        .expect("Failed to create app state");

    let fixture: Vec<SeedHacker> = serde_json::from_str(FIXTURE).unwrap();
    state.store.replace_all(&fixture).await.unwrap();

    let router = api::router(state.clone(), &config.server.cors_allowed_origins);
    (router, state)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn put_json(
    app: &Router,
    uri: &str,
    payload: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn find_hacker<'a>(users: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["name"] == name)
        .unwrap()
}

#[tokio::test]
async fn test_list_users_returns_seeded_hackers() {
    let (app, _state) = spawn_app().await;

    let (status, users) = get_json(&app, "/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let ann = find_hacker(&users, "Ann");
    assert_eq!(ann["badge_code"], "B1");
    assert_eq!(ann["scans"].as_array().unwrap().len(), 1);
    assert_eq!(ann["scans"][0]["activity_name"], "Talk");

    let bob = find_hacker(&users, "Bob");
    assert!(bob["badge_code"].is_null());
    assert_eq!(bob["scans"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_user_by_id() {
    let (app, _state) = spawn_app().await;

    let (status, ann) = get_json(&app, "/users/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ann["name"], "Ann");
    assert_eq!(ann["email"], "a@x.com");

    let (status, body) = get_json(&app, "/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_record_scan_appends_and_touches_updated_at() {
    let (app, _state) = spawn_app().await;

    let (_, before) = get_json(&app, "/users/1").await;
    let updated_before =
        chrono::DateTime::parse_from_rfc3339(before["updated_at"].as_str().unwrap()).unwrap();

    let payload = serde_json::json!({
        "activity_name": "Lunch",
        "activity_category": "food"
    });
    let (status, scan) = put_json(&app, "/scan/B1", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scan["badge_code"], "B1");
    assert_eq!(scan["activity_name"], "Lunch");
    assert_eq!(scan["activity_category"], "food");

    let (_, after) = get_json(&app, "/users/1").await;
    assert_eq!(after["scans"].as_array().unwrap().len(), 2);

    let updated_after =
        chrono::DateTime::parse_from_rfc3339(after["updated_at"].as_str().unwrap()).unwrap();
    assert!(updated_after >= updated_before);
}

#[tokio::test]
async fn test_record_scan_unknown_badge_inserts_nothing() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({
        "activity_name": "Lunch",
        "activity_category": "food"
    });
    let (status, body) = put_json(&app, "/scan/UNKNOWN", &payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "invalid badge code");

    let (_, users) = get_json(&app, "/users").await;
    let ann = find_hacker(&users, "Ann");
    assert_eq!(ann["scans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_record_scan_missing_fields() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({ "activity_name": "Lunch" });
    let (status, body) = put_json(&app, "/scan/B1", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("activity_category"));

    let payload = serde_json::json!({
        "activity_name": "",
        "activity_category": "food"
    });
    let (status, body) = put_json(&app, "/scan/B1", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("activity_name"));
}

#[tokio::test]
async fn test_scan_aggregation() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({
        "activity_name": "Lunch",
        "activity_category": "food"
    });
    let (status, _) = put_json(&app, "/scan/B1", &payload).await;
    assert_eq!(status, StatusCode::OK);

    let (status, counts) = get_json(&app, "/scans?activity_category=food&min_frequency=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        counts,
        serde_json::json!([{ "activity_category": "food", "frequency": 1 }])
    );

    let (_, counts) = get_json(&app, "/scans").await;
    assert_eq!(counts.as_array().unwrap().len(), 2);

    let (_, counts) = get_json(&app, "/scans?min_frequency=2").await;
    assert_eq!(counts.as_array().unwrap().len(), 0);

    // An unparsable bound imposes no constraint.
    let (status, counts) = get_json(&app, "/scans?min_frequency=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts.as_array().unwrap().len(), 2);

    let (_, counts) = get_json(&app, "/scans?max_frequency=0").await;
    assert_eq!(counts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_partial_preserves_other_fields() {
    let (app, _state) = spawn_app().await;

    let (_, before) = get_json(&app, "/users/1").await;
    let updated_before =
        chrono::DateTime::parse_from_rfc3339(before["updated_at"].as_str().unwrap()).unwrap();

    let payload = serde_json::json!({ "phone": "999" });
    let (status, ann) = put_json(&app, "/users/1", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ann["name"], "Ann");
    assert_eq!(ann["email"], "a@x.com");
    assert_eq!(ann["phone"], "999");
    assert_eq!(ann["badge_code"], "B1");
    assert_eq!(ann["scans"].as_array().unwrap().len(), 1);

    let updated_after =
        chrono::DateTime::parse_from_rfc3339(ann["updated_at"].as_str().unwrap()).unwrap();
    assert!(updated_after >= updated_before);
}

#[tokio::test]
async fn test_badge_rename_moves_scans() {
    let (app, _state) = spawn_app().await;

    let (_, totals_before) = get_json(&app, "/scans").await;

    let payload = serde_json::json!({ "badge_code": "B2" });
    let (status, ann) = put_json(&app, "/users/1", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ann["badge_code"], "B2");
    assert_eq!(ann["scans"].as_array().unwrap().len(), 1);

    // History followed the rename: nothing is left under B1.
    let (_, ann) = get_json(&app, "/users/1").await;
    assert_eq!(ann["badge_code"], "B2");
    assert_eq!(ann["scans"].as_array().unwrap().len(), 1);

    let (_, totals_after) = get_json(&app, "/scans").await;
    assert_eq!(totals_before, totals_after);

    // The freed-up code accepts no scans anymore.
    let scan = serde_json::json!({
        "activity_name": "Dinner",
        "activity_category": "food"
    });
    let (status, _) = put_json(&app, "/scan/B1", &scan).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, row) = put_json(&app, "/scan/B2", &scan).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["badge_code"], "B2");
}

#[tokio::test]
async fn test_badgeless_hacker_scans_count_in_aggregation() {
    let (app, state) = spawn_app().await;

    // Scans embedded under an unassigned badge are seeded verbatim: the
    // /users join never reaches them, but aggregation still counts them.
    let fixture: Vec<SeedHacker> = serde_json::from_str(
        r#"[
      {
        "name": "Cam",
        "email": "c@x.com",
        "phone": "557",
        "badge_code": "",
        "scans": [
          {
            "activity_name": "Talk",
            "activity_category": "workshop",
            "scanned_at": "2024-01-01T10:00:00Z"
          }
        ]
      }
    ]"#,
    )
    .unwrap();
    state.store.replace_all(&fixture).await.unwrap();

    let (_, users) = get_json(&app, "/users").await;
    let cam = find_hacker(&users, "Cam");
    assert!(cam["badge_code"].is_null());
    assert_eq!(cam["scans"].as_array().unwrap().len(), 0);

    let (status, counts) = get_json(&app, "/scans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        counts,
        serde_json::json!([{ "activity_category": "workshop", "frequency": 1 }])
    );
}

#[tokio::test]
async fn test_empty_badge_code_clears_badge_without_rewriting_scans() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({ "badge_code": "" });
    let (status, ann) = put_json(&app, "/users/1", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ann["badge_code"].is_null());
    assert_eq!(ann["scans"].as_array().unwrap().len(), 0);

    // History stays under the old code and still counts in aggregation.
    let (_, counts) = get_json(&app, "/scans").await;
    assert_eq!(
        counts,
        serde_json::json!([{ "activity_category": "workshop", "frequency": 1 }])
    );

    // The cleared code no longer accepts scans.
    let scan = serde_json::json!({
        "activity_name": "Lunch",
        "activity_category": "food"
    });
    let (status, _) = put_json(&app, "/scan/B1", &scan).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_unknown_id() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({ "phone": "999" });
    let (status, body) = put_json(&app, "/users/999", &payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_email_conflicts_without_corruption() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({ "email": "b@x.com" });
    let (status, body) = put_json(&app, "/users/1", &payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, ann) = get_json(&app, "/users/1").await;
    assert_eq!(ann["email"], "a@x.com");
}

#[tokio::test]
async fn test_duplicate_badge_code_conflicts() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({ "badge_code": "B1" });
    let (status, _) = put_json(&app, "/users/2", &payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_seeding_is_idempotent() {
    let (app, state) = spawn_app().await;

    let strip_updated_at = |mut users: serde_json::Value| {
        for user in users.as_array_mut().unwrap() {
            user.as_object_mut().unwrap().remove("updated_at");
        }
        users
    };

    let (_, first) = get_json(&app, "/users").await;

    let fixture: Vec<SeedHacker> = serde_json::from_str(FIXTURE).unwrap();
    state.store.replace_all(&fixture).await.unwrap();

    let (_, second) = get_json(&app, "/users").await;
    assert_eq!(strip_updated_at(first), strip_updated_at(second));
}
