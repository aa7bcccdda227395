//! The device operations scenarios are written against

use async_trait::async_trait;

use mobile_e2e_webdriver::{ElementRef, Locator, Session, WebDriverResult};

/// Remote device interactions used by the wait helper, the action wrapper
/// and the runner.
///
/// `Session` is the production implementation; tests substitute scripted
/// drivers.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Look up one element on the current screen
    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementRef>;

    /// Replace the content of an input element
    async fn set_value(&self, element: &ElementRef, value: &str) -> WebDriverResult<()>;

    async fn click(&self, element: &ElementRef) -> WebDriverResult<()>;

    async fn text(&self, element: &ElementRef) -> WebDriverResult<String>;

    /// Current screen as PNG bytes
    async fn screenshot(&self) -> WebDriverResult<Vec<u8>>;

    /// Bring the app back to its launch state
    async fn reset_app(&self) -> WebDriverResult<()>;
}

#[async_trait]
impl Driver for Session {
    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementRef> {
        Session::find_element(self, locator).await
    }

    async fn set_value(&self, element: &ElementRef, value: &str) -> WebDriverResult<()> {
        Session::set_value(self, element, value).await
    }

    async fn click(&self, element: &ElementRef) -> WebDriverResult<()> {
        Session::click(self, element).await
    }

    async fn text(&self, element: &ElementRef) -> WebDriverResult<String> {
        Session::text(self, element).await
    }

    async fn screenshot(&self) -> WebDriverResult<Vec<u8>> {
        Session::screenshot(self).await
    }

    async fn reset_app(&self) -> WebDriverResult<()> {
        Session::reset_app(self).await
    }
}
