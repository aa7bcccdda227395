//! Exercises the client against an in-process mock automation server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};

use mobile_e2e_webdriver::element::ELEMENT_KEY;
use mobile_e2e_webdriver::{Capabilities, Locator, WebDriverClient, WebDriverError};

const SESSION_ID: &str = "session-1";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

#[derive(Default)]
struct MockState {
    /// xpath -> element id
    elements: HashMap<String, String>,
    /// element id -> text
    texts: HashMap<String, String>,
    /// recorded commands, e.g. `value:e1:admin`
    calls: Vec<String>,
    session_body: Option<Value>,
}

type Shared = Arc<Mutex<MockState>>;

fn error(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "value": { "error": code, "message": message } })),
    )
}

fn ok(value: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "value": value })))
}

fn check_session(id: &str) -> Option<(StatusCode, Json<Value>)> {
    (id != SESSION_ID).then(|| error(StatusCode::NOT_FOUND, "invalid session id", id))
}

async fn status() -> (StatusCode, Json<Value>) {
    ok(json!({ "ready": true, "message": "mock ready" }))
}

async fn new_session(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.lock().unwrap().session_body = Some(body);
    ok(json!({ "sessionId": SESSION_ID, "capabilities": {} }))
}

async fn find_element(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(err) = check_session(&id) {
        return err;
    }
    let xpath = body["value"].as_str().unwrap_or_default().to_string();
    let state = state.lock().unwrap();
    match state.elements.get(&xpath) {
        Some(element) => ok(json!({ ELEMENT_KEY: element })),
        None => error(StatusCode::NOT_FOUND, "no such element", &xpath),
    }
}

async fn find_elements(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let xpath = body["value"].as_str().unwrap_or_default();
    let state = state.lock().unwrap();
    let found: Vec<Value> = state
        .elements
        .get(xpath)
        .map(|e| vec![json!({ ELEMENT_KEY: e })])
        .unwrap_or_default();
    ok(Value::Array(found))
}

async fn element_command(
    State(state): State<Shared>,
    Path((_id, element, command)): Path<(String, String, String)>,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    let call = match (command.as_str(), body) {
        ("value", Some(Json(body))) => {
            format!("value:{}:{}", element, body["text"].as_str().unwrap_or_default())
        }
        (other, _) => format!("{}:{}", other, element),
    };
    state.calls.push(call);
    ok(Value::Null)
}

async fn element_query(
    State(state): State<Shared>,
    Path((_id, element, query)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    let state = state.lock().unwrap();
    match query.as_str() {
        "text" => ok(json!(state.texts.get(&element).cloned().unwrap_or_default())),
        "displayed" => ok(json!(true)),
        _ => error(StatusCode::NOT_FOUND, "unknown command", &query),
    }
}

async fn screenshot(Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    ok(json!(base64::engine::general_purpose::STANDARD.encode(PNG_BYTES)))
}

async fn app_reset(Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    error(StatusCode::NOT_FOUND, "unknown command", "app/reset was removed")
}

async fn app_management(
    State(state): State<Shared>,
    Path((_id, command)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let app_id = body["appId"].as_str().unwrap_or_default();
    state
        .lock()
        .unwrap()
        .calls
        .push(format!("{}:{}", command, app_id));
    ok(json!(true))
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    state.lock().unwrap().calls.push(format!("delete:{}", id));
    ok(Value::Null)
}

async fn spawn_mock(state: Shared) -> String {
    let router = Router::new()
        .route("/wd/hub/status", get(status))
        .route("/wd/hub/session", post(new_session))
        .route("/wd/hub/session/:id", delete(delete_session))
        .route("/wd/hub/session/:id/element", post(find_element))
        .route("/wd/hub/session/:id/elements", post(find_elements))
        .route(
            "/wd/hub/session/:id/element/:element/:command",
            post(element_command).get(element_query),
        )
        .route("/wd/hub/session/:id/screenshot", get(screenshot))
        .route("/wd/hub/session/:id/appium/app/reset", post(app_reset))
        .route("/wd/hub/session/:id/appium/device/:command", post(app_management))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/wd/hub", addr)
}

fn capabilities() -> Capabilities {
    Capabilities {
        platform_name: "Android".into(),
        device_name: "emulator-5554".into(),
        platform_version: None,
        app: "./app-release.apk".into(),
        app_package: Some("com.example.app".into()),
        app_activity: Some("com.example.app.MainActivity".into()),
        bundle_id: None,
        automation_name: "UiAutomator2".into(),
        auto_grant_permissions: true,
        new_command_timeout: 300,
        no_reset: false,
    }
}

fn seeded_state() -> Shared {
    let mut state = MockState::default();
    state.elements.insert(
        Locator::resource_id("com.example.app:id/username_input").to_string(),
        "e-username".into(),
    );
    state.elements.insert(
        Locator::text_contains("Dashboard").to_string(),
        "e-dashboard".into(),
    );
    state
        .texts
        .insert("e-dashboard".into(), "Dashboard - admin".into());
    Arc::new(Mutex::new(state))
}

#[tokio::test]
async fn test_status_reports_ready() {
    let base = spawn_mock(seeded_state()).await;
    let client = WebDriverClient::new(base).unwrap();

    let status = client.status().await.unwrap();
    assert!(status.ready);
    assert_eq!(status.message, "mock ready");
}

#[tokio::test]
async fn test_session_flow() {
    let state = seeded_state();
    let base = spawn_mock(state.clone()).await;
    let client = WebDriverClient::new(base).unwrap();

    let session = client.new_session(&capabilities()).await.unwrap();
    assert_eq!(session.id(), SESSION_ID);

    let username = session
        .find_element(&Locator::resource_id("com.example.app:id/username_input"))
        .await
        .unwrap();
    session.set_value(&username, "admin").await.unwrap();
    session.click(&username).await.unwrap();

    let dashboard = session
        .find_element(&Locator::text_contains("Dashboard"))
        .await
        .unwrap();
    assert_eq!(session.text(&dashboard).await.unwrap(), "Dashboard - admin");
    assert!(session.is_displayed(&dashboard).await.unwrap());

    assert_eq!(session.screenshot().await.unwrap(), PNG_BYTES);

    session.delete().await.unwrap();

    let state = state.lock().unwrap();
    assert_eq!(
        state.calls,
        vec![
            "clear:e-username",
            "value:e-username:admin",
            "click:e-username",
            "delete:session-1",
        ]
    );
    let body = state.session_body.as_ref().unwrap();
    assert_eq!(body["capabilities"]["alwaysMatch"]["appium:appPackage"], "com.example.app");
}

#[tokio::test]
async fn test_missing_element_is_not_found() {
    let base = spawn_mock(seeded_state()).await;
    let client = WebDriverClient::new(base).unwrap();
    let session = client.new_session(&capabilities()).await.unwrap();

    let err = session
        .find_element(&Locator::text("Login"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains(r#"//*[@text="Login"]"#));

    let none = session.find_elements(&Locator::text("Login")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_lost_session_is_not_retryable() {
    let base = spawn_mock(seeded_state()).await;
    let client = WebDriverClient::new(base).unwrap();
    let stale = mobile_e2e_webdriver::Session::attach(client, "gone", None);

    let err = stale.find_element(&Locator::text("Login")).await.unwrap_err();
    assert!(matches!(err, WebDriverError::InvalidSession(_)));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_reset_falls_back_to_restart() {
    let state = seeded_state();
    let base = spawn_mock(state.clone()).await;
    let client = WebDriverClient::new(base).unwrap();
    let session = client.new_session(&capabilities()).await.unwrap();

    session.reset_app().await.unwrap();

    let calls = state.lock().unwrap().calls.clone();
    assert_eq!(
        calls,
        vec!["terminate_app:com.example.app", "activate_app:com.example.app"]
    );
}
