//! HTTP transport for the automation server
//!
//! Speaks the W3C WebDriver wire format and falls back to reading legacy
//! JSON Wire Protocol responses, which older `/wd/hub` servers still emit.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::capabilities::Capabilities;
use crate::error::{Result, WebDriverError};
use crate::session::Session;

/// Readiness report returned by `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

/// Client bound to one automation server endpoint
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:4723/wd/hub`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query server readiness
    pub async fn status(&self) -> Result<ServerStatus> {
        let value = self.command(Method::GET, "/status", None).await?;
        // Appium 1.x omits `ready`; answering at all means it is up.
        let ready = value.get("ready").and_then(Value::as_bool).unwrap_or(true);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(ServerStatus { ready, message })
    }

    /// Create a new automation session
    pub async fn new_session(&self, capabilities: &Capabilities) -> Result<Session> {
        let body = capabilities.new_session_body();
        let raw = self.send(Method::POST, "/session", Some(body)).await?;

        let id = raw
            .get("value")
            .and_then(|v| v.get("sessionId"))
            .or_else(|| raw.get("sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebDriverError::SessionNotCreated(format!("no sessionId in response: {}", raw))
            })?
            .to_string();

        info!("Created session {} on {}", id, self.base_url);
        Ok(Session::new(
            self.clone(),
            id,
            capabilities.app_id().map(String::from),
        ))
    }

    /// Send a command and return the unwrapped `value` field
    pub async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let raw = self.send(method, path, body).await?;
        Ok(match raw {
            Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
            other => other,
        })
    }

    /// Send a command and return the full decoded response body
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if method == Method::POST {
            request = request.json(&body.unwrap_or_else(|| json!({})));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!("{} {} -> {} {}", method, url, status, text);

        decode_response(status.as_u16(), &text)
    }
}

/// Decode a response body, mapping W3C and legacy error shapes to errors
pub(crate) fn decode_response(status: u16, text: &str) -> Result<Value> {
    let success = (200..300).contains(&status);

    let raw: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) if success && text.trim().is_empty() => return Ok(Value::Null),
        Err(e) if success => return Err(e.into()),
        Err(_) => {
            return Err(WebDriverError::Protocol {
                status,
                error: "unknown error".to_string(),
                message: text.to_string(),
            })
        }
    };

    // Legacy JSON Wire Protocol: non-zero `status` marks an error.
    if let Some(code) = raw.get("status").and_then(Value::as_i64) {
        if code != 0 {
            let message = raw
                .get("value")
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(WebDriverError::from_legacy_status(code, message));
        }
    }

    if let Some(error) = raw
        .get("value")
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
    {
        let message = raw["value"]
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(WebDriverError::from_w3c(status, error, message));
    }

    if !success {
        return Err(WebDriverError::Protocol {
            status,
            error: "unknown error".to_string(),
            message: text.to_string(),
        });
    }

    Ok(raw)
}
