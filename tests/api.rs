use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use notice_board::clock::MockClock;
use notice_board::config::Config;
use notice_board::services::housekeeping::Janitor;
use serde_json::{json, Value};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

const START: OffsetDateTime = datetime!(2026-09-01 07:30 UTC);

fn test_app(limit: usize) -> (Router, Janitor, MockClock) {
    let clock = MockClock::new(START);
    let cfg = Config { rate_limit_per_minute: limit, ..Config::default() };
    let (app, janitor, _) = notice_board::build_app_with_clock(cfg, Arc::new(clock.clone()));
    (app, janitor, clock)
}

fn expires_in(clock: &MockClock, minutes: i64) -> String {
    use notice_board::clock::Clock;
    (clock.now() + Duration::minutes(minutes)).format(&Rfc3339).unwrap()
}

fn notice_body(title: &str, expires_at: &str) -> Value {
    json!({ "title": title, "message": "see the office", "date": "2026-09-01", "expires_at": expires_at })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, client: &str) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", client)
        .header("content-type", "application/json");
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn create_then_list() {
    let (app, _janitor, clock) = test_app(10);
    let (status, body) =
        send(&app, "POST", "/notices", Some(notice_body("Library hours", &expires_in(&clock, 60))), "a").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["notice"]["title"], "Library hours");
    assert!(body["notice"]["updated_at"].is_null());

    let (status, body) = send(&app, "GET", "/notices", None, "b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["notices"][0]["message"], "see the office");
}

#[tokio::test]
async fn validation_errors_use_the_envelope() {
    let (app, _janitor, clock) = test_app(10);

    let (status, body) =
        send(&app, "POST", "/notices", Some(json!({ "title": "t", "expires_at": expires_in(&clock, 5) })), "a")
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("message, date"));
    assert!(body["request_id"].is_string());
    assert!(body["timestamp"].is_string());

    let (status, body) =
        send(&app, "POST", "/notices", Some(notice_body("late", "2020-01-01T00:00:00Z")), "a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let (app, _janitor, _) = test_app(10);
    let request = Request::builder()
        .method("POST")
        .uri("/notices")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn expired_notices_disappear_from_list() {
    let (app, _janitor, clock) = test_app(10);
    send(&app, "POST", "/notices", Some(notice_body("brief", &expires_in(&clock, 1))), "a").await;
    send(&app, "POST", "/notices", Some(notice_body("lasting", &expires_in(&clock, 90))), "a").await;

    clock.advance(Duration::minutes(2));
    let (_, body) = send(&app, "GET", "/notices", None, "a").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["notices"][0]["title"], "lasting");

    let (_, stats) = send(&app, "GET", "/stats", None, "a").await;
    assert_eq!(stats["auto_cleanups"], 1);
    assert_eq!(stats["active_notices"], 1);
    assert!(stats["last_cleanup"].is_string());
}

#[tokio::test]
async fn search_sort_and_limit() {
    let (app, _janitor, clock) = test_app(10);
    for title in ["Exam Notice", "Fee Due", "Exam Results"] {
        send(&app, "POST", "/notices", Some(notice_body(title, &expires_in(&clock, 60))), "a").await;
        clock.advance(Duration::seconds(1));
    }

    let (_, body) = send(&app, "GET", "/notices?search=EXAM", None, "a").await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["notices"][0]["title"], "Exam Results");
    assert_eq!(body["notices"][1]["title"], "Exam Notice");

    let (_, body) = send(&app, "GET", "/notices?sort=title&order=asc&limit=1", None, "a").await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["notices"].as_array().unwrap().len(), 1);
    assert_eq!(body["notices"][0]["title"], "Exam Notice");

    let (status, body) = send(&app, "GET", "/notices?sort=colour", None, "a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn update_and_delete() {
    let (app, _janitor, clock) = test_app(10);
    let (_, created) =
        send(&app, "POST", "/notices", Some(notice_body("Sports day", &expires_in(&clock, 60))), "a").await;
    let id = created["notice"]["id"].as_str().unwrap().to_string();

    clock.advance(Duration::minutes(1));
    let (status, body) =
        send(&app, "PATCH", &format!("/notices/{id}"), Some(json!({ "title": "Sports day (moved)" })), "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["title"], "Sports day (moved)");
    assert_eq!(body["notice"]["message"], "see the office");
    assert!(body["notice"]["updated_at"].is_string());

    let (status, _) = send(&app, "PUT", &format!("/notices/{id}"), Some(json!({})), "a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", &format!("/notices/{id}"), None, "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["id"], id.as_str());

    let (status, body) = send(&app, "DELETE", &format!("/notices/{id}"), None, "a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (app, _janitor, clock) = test_app(10);
    send(&app, "POST", "/notices", Some(notice_body("stays", &expires_in(&clock, 60))), "a").await;

    let (status, _) = send(&app, "PUT", "/notices/nonexistent", Some(json!({ "title": "x" })), "a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/notices/nonexistent", None, "a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/notices", None, "a").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["notices"][0]["title"], "stays");
}

#[tokio::test]
async fn batch_reports_partial_success() {
    let (app, _janitor, clock) = test_app(10);
    let items = json!([
        notice_body("first", &expires_in(&clock, 10)),
        { "title": "no expiry" },
        notice_body("third", &expires_in(&clock, 10)),
    ]);
    let (status, body) = send(&app, "POST", "/notices/batch", Some(items), "a").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], false);
    assert_eq!(body["created"].as_array().unwrap().len(), 2);
    assert_eq!(body["errors"][0]["index"], 1);

    let (status, body) = send(&app, "POST", "/notices/batch", Some(json!([{ "title": "" }])), "a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["created"].as_array().unwrap().len(), 0);

    let (status, _) = send(&app, "POST", "/notices/batch", Some(json!([])), "a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mutations_are_rate_limited_per_client() {
    let (app, _janitor, clock) = test_app(2);
    let body = notice_body("spam", &expires_in(&clock, 60));

    for _ in 0..2 {
        let (status, _) = send(&app, "POST", "/notices", Some(body.clone()), "10.0.0.1").await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, err) = send(&app, "POST", "/notices", Some(body.clone()), "10.0.0.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err["error"], "rate_limited");

    let (status, _) = send(&app, "POST", "/notices", Some(body.clone()), "10.0.0.2").await;
    assert_eq!(status, StatusCode::CREATED);

    // reads are never limited
    let (status, _) = send(&app, "GET", "/notices", None, "10.0.0.1").await;
    assert_eq!(status, StatusCode::OK);

    clock.advance(Duration::seconds(61));
    let (status, _) = send(&app, "POST", "/notices", Some(body), "10.0.0.1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, stats) = send(&app, "GET", "/stats", None, "x").await;
    assert_eq!(stats["rate_limited_requests"], 1);
    assert_eq!(stats["total_notices_created"], 4);
}

#[tokio::test]
async fn stats_count_every_request() {
    let (app, _janitor, _) = test_app(10);
    send(&app, "GET", "/health", None, "a").await;
    send(&app, "GET", "/notices", None, "a").await;
    let (status, stats) = send(&app, "GET", "/stats", None, "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_requests"], 3);
    assert_eq!(stats["total_notices_created"], 0);
}

#[tokio::test]
async fn health_reports_notice_count() {
    let (app, janitor, clock) = test_app(10);
    send(&app, "POST", "/notices", Some(notice_body("up", &expires_in(&clock, 5))), "a").await;

    let (status, body) = send(&app, "GET", "/health", None, "a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_notices"], 1);
    assert!(body["uptime_seconds"].is_u64());

    janitor.shutdown().await;
}
