//! A live automation session and the element commands it exposes

use base64::Engine;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::WebDriverClient;
use crate::element::{ElementRef, Locator};
use crate::error::{Result, WebDriverError};

/// Handle to one session on the automation server
#[derive(Debug, Clone)]
pub struct Session {
    client: WebDriverClient,
    id: String,
    app_id: Option<String>,
}

impl Session {
    pub(crate) fn new(client: WebDriverClient, id: String, app_id: Option<String>) -> Self {
        Self { client, id, app_id }
    }

    /// Attach to an existing session by id
    pub fn attach(client: WebDriverClient, id: impl Into<String>, app_id: Option<String>) -> Self {
        Self::new(client, id.into(), app_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.id, suffix)
    }

    fn element_path(&self, element: &ElementRef, suffix: &str) -> String {
        format!("/session/{}/element/{}{}", self.id, element.id(), suffix)
    }

    /// Locate the first element matching `locator`
    pub async fn find_element(&self, locator: &Locator) -> Result<ElementRef> {
        let body = json!({ "using": locator.strategy(), "value": locator.as_str() });
        let value = self
            .client
            .command(Method::POST, &self.path("/element"), Some(body))
            .await?;
        ElementRef::from_value(&value)
    }

    /// Locate every element matching `locator`; an empty list is not an error
    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let body = json!({ "using": locator.strategy(), "value": locator.as_str() });
        let value = self
            .client
            .command(Method::POST, &self.path("/elements"), Some(body))
            .await?;
        match value {
            Value::Array(items) => items.iter().map(ElementRef::from_value).collect(),
            other => Err(WebDriverError::UnexpectedResponse(format!(
                "expected element list, got {}",
                other
            ))),
        }
    }

    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        self.client
            .command(Method::POST, &self.element_path(element, "/click"), None)
            .await?;
        Ok(())
    }

    pub async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.client
            .command(Method::POST, &self.element_path(element, "/clear"), None)
            .await?;
        Ok(())
    }

    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        // `text` for W3C servers, `value` for JSON Wire ones.
        let chars: Vec<String> = text.chars().map(String::from).collect();
        let body = json!({ "text": text, "value": chars });
        self.client
            .command(Method::POST, &self.element_path(element, "/value"), Some(body))
            .await?;
        Ok(())
    }

    /// Replace the element's content with `text`
    pub async fn set_value(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.clear(element).await?;
        self.send_keys(element, text).await
    }

    pub async fn text(&self, element: &ElementRef) -> Result<String> {
        let value = self
            .client
            .command(Method::GET, &self.element_path(element, "/text"), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        let value = self
            .client
            .command(Method::GET, &self.element_path(element, "/displayed"), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Capture the current screen as PNG bytes
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self
            .client
            .command(Method::GET, &self.path("/screenshot"), None)
            .await?;
        let encoded = value.as_str().ok_or_else(|| {
            WebDriverError::UnexpectedResponse("screenshot value is not a string".to_string())
        })?;
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
    }

    /// Restart the app under test from a clean state.
    ///
    /// Uses `appium/app/reset`; servers that dropped that endpoint get a
    /// terminate + activate of the configured app id instead.
    pub async fn reset_app(&self) -> Result<()> {
        let reset = self
            .client
            .command(Method::POST, &self.path("/appium/app/reset"), None)
            .await;

        match (reset, &self.app_id) {
            (Ok(_), _) => Ok(()),
            (Err(WebDriverError::Protocol { error, .. }), Some(app_id))
                if error == "unknown command" || error == "unknown method" =>
            {
                debug!("app/reset unsupported, restarting {} instead", app_id);
                let body = json!({ "appId": app_id, "bundleId": app_id });
                self.client
                    .command(
                        Method::POST,
                        &self.path("/appium/device/terminate_app"),
                        Some(body.clone()),
                    )
                    .await?;
                self.client
                    .command(
                        Method::POST,
                        &self.path("/appium/device/activate_app"),
                        Some(body),
                    )
                    .await?;
                Ok(())
            }
            (Err(e), _) => Err(e),
        }
    }

    /// End the session on the server
    pub async fn delete(&self) -> Result<()> {
        self.client
            .command(Method::DELETE, &self.path(""), None)
            .await?;
        info!("Deleted session {}", self.id);
        Ok(())
    }
}
