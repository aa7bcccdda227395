//! Instrumented actions: locate, interact, capture evidence

use std::future::Future;
use std::path::PathBuf;
use tracing::info;

use mobile_e2e_webdriver::{ElementRef, Locator};

use crate::driver::Driver;
use crate::error::E2eResult;
use crate::evidence::{Attachment, EvidenceStore};
use crate::wait::{wait_for_element, WaitOptions};

/// Per-scenario context handed to every action.
///
/// Holds the driver, the run's evidence store and the attachments gathered
/// for the scenario being executed.
pub struct ActionContext<'a, D: ?Sized> {
    driver: &'a D,
    evidence: &'a mut EvidenceStore,
    scenario: String,
    wait: WaitOptions,
    attachments: Vec<Attachment>,
}

impl<'a, D> ActionContext<'a, D>
where
    D: Driver + ?Sized,
{
    pub fn new(
        driver: &'a D,
        evidence: &'a mut EvidenceStore,
        scenario: impl Into<String>,
        wait: WaitOptions,
    ) -> Self {
        Self {
            driver,
            evidence,
            scenario: scenario.into(),
            wait,
            attachments: Vec::new(),
        }
    }

    pub fn driver(&self) -> &'a D {
        self.driver
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn into_attachments(self) -> Vec<Attachment> {
        self.attachments
    }

    /// Run `interaction` against the element at `locator`, then capture a
    /// screenshot named after the action.
    ///
    /// Lookup and interaction errors propagate unchanged and skip the
    /// capture.
    pub async fn action<F, Fut>(&mut self, name: &str, locator: &Locator, interaction: F) -> E2eResult<()>
    where
        F: FnOnce(ElementRef) -> Fut,
        Fut: Future<Output = E2eResult<()>>,
    {
        let wait = self.wait;
        self.action_within(name, locator, &wait, interaction).await
    }

    /// [`action`](Self::action) with explicit wait options
    pub async fn action_within<F, Fut>(
        &mut self,
        name: &str,
        locator: &Locator,
        wait: &WaitOptions,
        interaction: F,
    ) -> E2eResult<()>
    where
        F: FnOnce(ElementRef) -> Fut,
        Fut: Future<Output = E2eResult<()>>,
    {
        info!("[{}] {} ({})", self.scenario, name, locator);

        let element = wait_for_element(self.driver, locator, wait).await?;
        interaction(element).await?;
        self.capture(name).await?;
        Ok(())
    }

    /// Capture the current screen and attach it to the scenario
    pub async fn capture(&mut self, name: &str) -> E2eResult<PathBuf> {
        let png = self.driver.screenshot().await?;
        let path = self.evidence.save(&self.scenario, name, &png)?;
        self.attachments.push(Attachment::screenshot(&path));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;
    use crate::evidence::EvidenceConfig;
    use crate::testing::{MockAction, MockDriver};
    use std::time::Duration;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> EvidenceStore {
        EvidenceStore::new(EvidenceConfig {
            dir: tmp.path().to_path_buf(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_interacts_then_captures() {
        let tmp = TempDir::new().unwrap();
        let mut evidence = store(&tmp);
        let driver = MockDriver::new();
        let username = Locator::resource_id("com.example.app:id/username_input");
        driver.set_element(&username, "");

        let mut ctx = ActionContext::new(&driver, &mut evidence, "Login avec admin valide", WaitOptions::default());
        let d = ctx.driver();
        ctx.action("Set username", &username, |el| async move {
            d.set_value(&el, "admin").await.map_err(E2eError::from)
        })
        .await
        .unwrap();

        assert_eq!(
            driver.actions(),
            vec![
                MockAction::FindElement {
                    locator: username.to_string()
                },
                MockAction::SetValue {
                    element: "el-1".into(),
                    value: "admin".into()
                },
                MockAction::Screenshot,
            ]
        );

        let attachments = ctx.into_attachments();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].title, "Screenshot");
        assert!(attachments[0].value.contains("Login_avec_admin_valide_Set_username"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interaction_error_propagates_without_capture() {
        let tmp = TempDir::new().unwrap();
        let mut evidence = store(&tmp);
        let driver = MockDriver::new();
        let pay = Locator::text("Pay");
        driver.set_element(&pay, "Pay");

        let mut ctx = ActionContext::new(&driver, &mut evidence, "Paiement", WaitOptions::default());
        let err = ctx
            .action("Check Pay", &pay, |_| async {
                Err::<(), _>(E2eError::AssertionFailed("wrong label".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::AssertionFailed(_)));
        assert!(ctx.attachments().is_empty());
        assert!(!driver.actions().contains(&MockAction::Screenshot));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_names_locator() {
        let tmp = TempDir::new().unwrap();
        let mut evidence = store(&tmp);
        let driver = MockDriver::new();
        let login = Locator::text("Login");

        let mut ctx = ActionContext::new(&driver, &mut evidence, "Login", WaitOptions::default());
        let wait = WaitOptions::new(Duration::from_millis(2000), Duration::from_millis(500));
        let err = ctx
            .action_within("Click Login", &login, &wait, |_| async { Ok::<(), E2eError>(()) })
            .await
            .unwrap_err();

        assert!(err.to_string().contains(r#"//*[@text="Login"]"#));
        assert_eq!(driver.lookups(&login), 4);
    }
}
