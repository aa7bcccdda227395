//! Locators and element references

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, WebDriverError};

/// W3C web element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Legacy JSON Wire Protocol element identifier key
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// An XPath expression identifying an on-screen element.
///
/// The expression is handed to the automation server as-is; it is never
/// parsed or validated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Element whose `resource-id` attribute equals `id`
    pub fn resource_id(id: &str) -> Self {
        Self(format!(r#"//*[@resource-id="{}"]"#, id))
    }

    /// Element whose visible text equals `text`
    pub fn text(text: &str) -> Self {
        Self(format!(r#"//*[@text="{}"]"#, text))
    }

    /// Element whose visible text contains `text`
    pub fn text_contains(text: &str) -> Self {
        Self(format!(r#"//*[contains(@text, "{}")]"#, text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Locator strategy sent alongside the expression
    pub fn strategy(&self) -> &'static str {
        "xpath"
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(expr: &str) -> Self {
        Self::xpath(expr)
    }
}

impl From<String> for Locator {
    fn from(expr: String) -> Self {
        Self::xpath(expr)
    }
}

/// Opaque handle to a located element, valid for the current screen only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    id: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Extract an element reference from a find-element response value
    pub fn from_value(value: &Value) -> Result<Self> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(Self::new)
            .ok_or_else(|| {
                WebDriverError::UnexpectedResponse(format!("no element id in {}", value))
            })
    }
}
