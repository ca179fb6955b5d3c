use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use log::debug;
use serde_json::{json, Value};
use std::{borrow::Cow, sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    sync::{
        watch::{self, error::RecvError, Receiver, Sender},
        Mutex,
    },
    time::timeout,
};

pub const FAKE_RESEND_PORT: u16 = 5397;
pub const FAKE_MESSAGE_ID: &str = "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794";
const SEND_PATH: &str = "/emails";

/// In-process stand-in for the transactional email API. Checks the bearer
/// key, optionally answers with a forced error status, and records the last
/// accepted payload so tests can assert on (or prove the absence of) sends.
#[derive(Clone)]
pub struct FakeResend {
    expected_api_key: Cow<'static, str>,
    error_status: Option<u16>,
    captured: Arc<Sender<Value>>,
    receiver: Arc<Mutex<Receiver<Value>>>,
}

impl FakeResend {
    pub fn new(expected_api_key: impl Into<Cow<'static, str>>) -> Self {
        let (sender, receiver) = watch::channel(Value::Null);
        Self {
            expected_api_key: expected_api_key.into(),
            error_status: None,
            captured: Arc::new(sender),
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Makes every send attempt fail with the given HTTP status.
    pub fn fail_with_status(self, status: u16) -> Self {
        Self {
            error_status: Some(status),
            ..self
        }
    }

    pub fn setup_environment() {
        std::env::set_var(
            "RESEND_API_URL",
            format!("http://localhost:{FAKE_RESEND_PORT}{SEND_PATH}"),
        );
    }

    pub async fn serve(self) {
        let app = Router::new()
            .route(SEND_PATH, post(send_email))
            .with_state(self);
        let listener = TcpListener::bind(("0.0.0.0", FAKE_RESEND_PORT))
            .await
            .unwrap();
        axum::serve(listener, app).await.unwrap();
    }

    /// Waits for the next accepted payload. Times out (returning an error
    /// through the caller's own timeout) when nothing is sent.
    pub async fn last_email_payload(&self) -> Result<Value, RecvError> {
        let mut receiver = self.receiver.lock().await;
        receiver.changed().await?;
        let payload = receiver.borrow_and_update().clone();
        Ok(payload)
    }

    /// Discards any payload still buffered from a previous test.
    pub async fn flush(&self) {
        let mut receiver = self.receiver.lock().await;
        let _ = timeout(Duration::from_millis(100), receiver.changed()).await;
    }
}

async fn send_email(
    State(state): State<FakeResend>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    debug!("Fake Resend got payload:\n{payload}");
    let expected = format!("Bearer {}", state.expected_api_key);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if authorization != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "statusCode": 401,
                "name": "validation_error",
                "message": "API key is invalid",
            })),
        );
    }
    if let Some(status) = state.error_status {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({
                "statusCode": status,
                "name": "application_error",
                "message": "Simulated provider failure",
            })),
        );
    }
    state.captured.send(payload).unwrap();
    (StatusCode::OK, Json(json!({ "id": FAKE_MESSAGE_ID })))
}
