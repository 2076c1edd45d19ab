//! End-to-end tests driving the HTTP router in-process.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use timer_tracker::{
    create_router,
    state::{AppState, Notification, TimerStore},
    storage::{FileStorage, MemoryStorage},
};

fn app_with(store: TimerStore) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        store,
        0,
        "127.0.0.1".to_string(),
        Duration::from_secs(1),
    ));
    (create_router(Arc::clone(&state)), state)
}

fn app() -> (Router, Arc<AppState>) {
    app_with(TimerStore::load(MemoryStorage::new()).unwrap())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn add(app: &Router, name: &str, duration: Value, category: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/timers",
        Some(json!({ "name": name, "duration": duration, "category": category })),
    )
    .await
}

async fn wait_secs(n: u64) {
    tokio::time::sleep(Duration::from_millis(n * 1000 + 500)).await;
}

#[tokio::test(start_paused = true)]
async fn tea_runs_to_completion() {
    let (app, _state) = app();

    let (status, body) = add(&app, "Tea", json!(10), "Kitchen").await;
    assert_eq!(status, StatusCode::CREATED);
    let timer = &body["timer"];
    assert_eq!(timer["duration"], 10);
    assert_eq!(timer["remaining"], 10);
    assert_eq!(timer["status"], "Paused");
    let id = timer["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/timers/{}/start", id), None).await;
    assert_eq!(status, StatusCode::OK);

    wait_secs(5).await;
    let (_, timer) = send(&app, "GET", &format!("/timers/{}", id), None).await;
    assert_eq!(timer["remaining"], 5);
    assert_eq!(timer["halfwayAlertShown"], true);

    wait_secs(5).await;
    let (_, timer) = send(&app, "GET", &format!("/timers/{}", id), None).await;
    assert_eq!(timer["remaining"], 0);
    assert_eq!(timer["status"], "Completed");

    let (status, history) = send(&app, "GET", "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["name"], "Tea");
    assert!(history[0]["completedAt"].is_string());
}

#[tokio::test(start_paused = true)]
async fn pause_then_reset() {
    let (app, _state) = app();
    let (_, body) = add(&app, "Tea", json!("10"), "Kitchen").await;
    let id = body["timer"]["id"].as_str().unwrap().to_string();

    send(&app, "POST", &format!("/timers/{}/start", id), None).await;
    wait_secs(3).await;

    let (_, body) = send(&app, "POST", &format!("/timers/{}/pause", id), None).await;
    assert_eq!(body["timer"]["remaining"], 7);
    assert_eq!(body["timer"]["status"], "Paused");

    let (_, body) = send(&app, "POST", &format!("/timers/{}/reset", id), None).await;
    assert_eq!(body["timer"]["remaining"], 10);
    assert_eq!(body["timer"]["status"], "Paused");
    assert_eq!(body["timer"]["halfwayAlertShown"], false);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let (app, _state) = app();

    let (status, body) = add(&app, "", json!(10), "X").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = add(&app, "Tea", json!("soon"), "X").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = add(&app, "Tea", json!(-3), "X").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/timers", Some(json!({ "name": "Tea" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, groups) = send(&app, "GET", "/timers", None).await;
    assert_eq!(groups, json!([]));
}

#[tokio::test]
async fn malformed_fields_get_validation_errors() {
    let (app, state) = app();
    let mut notifications = state.subscribe();

    let (status, body) = add(&app, "Tea", json!(10.5), "Kitchen").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(matches!(
        notifications.try_recv(),
        Ok(Notification::ValidationFailed { .. })
    ));

    let (status, body) = add(&app, "Tea", Value::Null, "Kitchen").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, body) = send(
        &app,
        "POST",
        "/timers",
        Some(json!({ "name": null, "duration": 10, "category": "Kitchen" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = send(
        &app,
        "POST",
        "/timers",
        Some(json!({ "name": "Tea", "duration": 10, "category": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, groups) = send(&app, "GET", "/timers", None).await;
    assert_eq!(groups, json!([]));
}

#[tokio::test]
async fn unknown_timer_is_404() {
    let (app, _state) = app();
    for path in [
        "/timers/nope/start",
        "/timers/nope/pause",
        "/timers/nope/reset",
    ] {
        let (status, _) = send(&app, "POST", path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
    }
    let (status, _) = send(&app, "GET", "/timers/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timers_are_grouped_by_category() {
    let (app, _state) = app();
    add(&app, "Tea", json!(60), "Kitchen").await;
    add(&app, "Squats", json!(30), "Gym").await;
    add(&app, "Eggs", json!(420), "Kitchen").await;

    let (status, groups) = send(&app, "GET", "/timers", None).await;
    assert_eq!(status, StatusCode::OK);
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["category"], "Kitchen");
    assert_eq!(groups[0]["timers"].as_array().unwrap().len(), 2);
    assert_eq!(groups[0]["timers"][1]["name"], "Eggs");
    assert_eq!(groups[1]["category"], "Gym");
}

#[tokio::test]
async fn status_and_health() {
    let (app, _state) = app();
    add(&app, "Tea", json!(60), "Kitchen").await;

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timers"]["paused"], 1);
    assert_eq!(body["history_entries"], 0);
    assert_eq!(body["last_action"], "add");

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test(start_paused = true)]
async fn state_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let (app, state) = app_with(TimerStore::load(FileStorage::open(dir.path()).unwrap()).unwrap());
        let (_, body) = add(&app, "Quick", json!(1), "Test").await;
        let id = body["timer"]["id"].as_str().unwrap().to_string();
        send(&app, "POST", &format!("/timers/{}/start", id), None).await;
        wait_secs(1).await;
        state.shutdown();
        id
    };

    let (app, _state) = app_with(TimerStore::load(FileStorage::open(dir.path()).unwrap()).unwrap());
    let (_, timer) = send(&app, "GET", &format!("/timers/{}", id), None).await;
    assert_eq!(timer["status"], "Completed");
    assert_eq!(timer["halfwayAlertShown"], false);

    let (_, history) = send(&app, "GET", "/history", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["name"], "Quick");
}

#[tokio::test(start_paused = true)]
async fn events_stream_halfway_and_completion() {
    let (app, _state) = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let mut frames = response.into_body().into_data_stream();

    let (_, body) = add(&app, "Quick", json!(2), "Test").await;
    let id = body["timer"]["id"].as_str().unwrap().to_string();
    send(&app, "POST", &format!("/timers/{}/start", id), None).await;

    let mut text = String::new();
    while !text.contains("\"kind\":\"completed\"") {
        let chunk = tokio::time::timeout(Duration::from_secs(10), frames.next())
            .await
            .expect("no event within ten seconds")
            .expect("event stream ended")
            .unwrap();
        text.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    assert!(text.contains("event: notification"));
    let halfway = text.find("\"kind\":\"halfway\"").expect("halfway event");
    let completed = text.find("\"kind\":\"completed\"").unwrap();
    assert!(halfway < completed);
    assert!(text.contains(&format!("\"timerId\":\"{}\"", id)));
}
