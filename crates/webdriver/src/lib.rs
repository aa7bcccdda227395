//! Mobile E2E WebDriver client
//!
//! The subset of the W3C WebDriver protocol (plus Appium extensions) that
//! the E2E harness needs: server status, sessions, element lookup and
//! interaction, screenshots and app reset.

pub mod capabilities;
pub mod client;
pub mod element;
pub mod error;
pub mod session;

pub use capabilities::Capabilities;
pub use client::{ServerStatus, WebDriverClient};
pub use element::{ElementRef, Locator};
pub use error::{Result, Result as WebDriverResult, WebDriverError};
pub use session::Session;
