//! Scripted driver for exercising scenarios without a device.
//!
//! [`MockDriver`] answers lookups from a table of on-screen elements,
//! records every interaction, and can make elements appear after a number
//! of lookups or after a click, which is enough to replay the app's flows.
//!
//! ```
//! use mobile_e2e::testing::{MockAction, MockDriver};
//! use mobile_e2e_webdriver::Locator;
//!
//! let driver = MockDriver::new();
//! driver.set_element(&Locator::text("Login"), "");
//! driver.reveal_on_click(&Locator::text("Login"), &Locator::text_contains("Dashboard"), "Dashboard");
//! assert!(driver.actions().is_empty());
//! ```

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;

use mobile_e2e_webdriver::{ElementRef, Locator, WebDriverError, WebDriverResult};

use crate::driver::Driver;

/// Interaction recorded by [`MockDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    FindElement { locator: String },
    SetValue { element: String, value: String },
    Click { element: String },
    Text { element: String },
    Screenshot,
    ResetApp,
}

#[derive(Debug, Clone)]
struct MockElement {
    id: String,
    text: String,
    /// Lookups that must fail before the element shows up
    hidden_for: usize,
    /// Added by a click; removed again by an app reset
    revealed: bool,
}

#[derive(Default)]
struct MockState {
    elements: HashMap<String, MockElement>,
    lookups: HashMap<String, usize>,
    reveals: HashMap<String, Vec<(String, String)>>,
    broken: HashMap<String, String>,
    actions: Vec<MockAction>,
    next_id: usize,
}

impl MockState {
    fn insert(&mut self, locator: &str, text: &str, hidden_for: usize, revealed: bool) {
        self.next_id += 1;
        let id = format!("el-{}", self.next_id);
        self.elements.insert(
            locator.to_string(),
            MockElement {
                id,
                text: text.to_string(),
                hidden_for,
                revealed,
            },
        );
    }

    fn locator_of(&self, element: &ElementRef) -> Option<String> {
        self.elements
            .iter()
            .find(|(_, e)| e.id == element.id())
            .map(|(locator, _)| locator.clone())
    }
}

/// In-memory [`Driver`] for tests
pub struct MockDriver {
    state: Mutex<MockState>,
    screenshot_bytes: Vec<u8>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            screenshot_bytes: vec![0x89, 0x50, 0x4E, 0x47],
        }
    }

    /// Put an element on screen from the start
    pub fn set_element(&self, locator: &Locator, text: &str) {
        self.lock().insert(locator.as_str(), text, 0, false);
    }

    /// Put an element on screen that only answers after `lookups` misses
    pub fn set_element_after(&self, locator: &Locator, text: &str, lookups: usize) {
        self.lock().insert(locator.as_str(), text, lookups, false);
    }

    /// Show `locator` once `trigger` has been clicked
    pub fn reveal_on_click(&self, trigger: &Locator, locator: &Locator, text: &str) {
        self.lock()
            .reveals
            .entry(trigger.as_str().to_string())
            .or_default()
            .push((locator.as_str().to_string(), text.to_string()));
    }

    /// Make lookups of `locator` fail as if the session had been lost
    pub fn break_session_on(&self, locator: &Locator) {
        self.lock()
            .broken
            .insert(locator.as_str().to_string(), "session terminated".to_string());
    }

    /// Number of lookups made for `locator`
    pub fn lookups(&self, locator: &Locator) -> usize {
        self.lock().lookups.get(locator.as_str()).copied().unwrap_or(0)
    }

    pub fn actions(&self) -> Vec<MockAction> {
        self.lock().actions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementRef> {
        let mut state = self.lock();
        let key = locator.as_str().to_string();
        state.actions.push(MockAction::FindElement { locator: key.clone() });
        let seen = {
            let count = state.lookups.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(message) = state.broken.get(&key) {
            return Err(WebDriverError::InvalidSession(message.clone()));
        }

        match state.elements.get(&key) {
            Some(element) if seen > element.hidden_for => Ok(ElementRef::new(element.id.clone())),
            _ => Err(WebDriverError::NoSuchElement(key)),
        }
    }

    async fn set_value(&self, element: &ElementRef, value: &str) -> WebDriverResult<()> {
        let mut state = self.lock();
        state.actions.push(MockAction::SetValue {
            element: element.id().to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> WebDriverResult<()> {
        let mut state = self.lock();
        state.actions.push(MockAction::Click {
            element: element.id().to_string(),
        });

        let revealed = state
            .locator_of(element)
            .and_then(|locator| state.reveals.get(&locator).cloned())
            .unwrap_or_default();
        for (locator, text) in revealed {
            state.insert(&locator, &text, 0, true);
        }
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> WebDriverResult<String> {
        let mut state = self.lock();
        state.actions.push(MockAction::Text {
            element: element.id().to_string(),
        });
        state
            .elements
            .values()
            .find(|e| e.id == element.id())
            .map(|e| e.text.clone())
            .ok_or_else(|| WebDriverError::StaleElement(element.id().to_string()))
    }

    async fn screenshot(&self) -> WebDriverResult<Vec<u8>> {
        self.lock().actions.push(MockAction::Screenshot);
        Ok(self.screenshot_bytes.clone())
    }

    async fn reset_app(&self) -> WebDriverResult<()> {
        let mut state = self.lock();
        state.actions.push(MockAction::ResetApp);
        state.elements.retain(|_, e| !e.revealed);
        Ok(())
    }
}
