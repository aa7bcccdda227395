//! Error types for E2E testing

use thiserror::Error;

use mobile_e2e_webdriver::WebDriverError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Automation server failed to start: {0}")]
    ServerStartup(String),

    #[error("Automation server not ready after {0} attempts")]
    ServerNotReady(usize),

    #[error("Session setup failed: {0}")]
    SessionSetup(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Element not found: {locator} (gave up after {attempts} attempts in {timeout_ms} ms)")]
    ElementNotFound {
        locator: String,
        attempts: usize,
        timeout_ms: u64,
    },

    #[error("Element still present: {locator} (after {timeout_ms} ms)")]
    ElementStillPresent { locator: String, timeout_ms: u64 },

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] WebDriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
