//! Main test runner that orchestrates the server, the session and the scenarios

use std::path::PathBuf;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use mobile_e2e_webdriver::{Session, WebDriverClient};

use crate::action::ActionContext;
use crate::config::SessionConfig;
use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};
use crate::evidence::{Attachment, EvidenceConfig, EvidenceStore};
use crate::server::{wait_for_ready, ServerConfig, ServerHandle};
use crate::spec::{ScenarioSpec, SuiteSpec, TestStep};
use crate::wait::{wait_for_absence, WaitOptions, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub attachments: Vec<Attachment>,
    pub error: Option<String>,
}

/// Result of running all selected scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,

    /// Evidence store shared by every scenario of the run
    evidence: EvidenceStore,

    /// Automation server started by this runner (if any)
    server: Option<ServerHandle>,
}

impl TestRunner {
    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        let evidence = EvidenceStore::new(config.evidence.clone());
        Self {
            config,
            evidence,
            server: None,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Make sure the automation server is up, spawning it if configured
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(()); // Already running
        }

        match &self.config.server.binary_path {
            Some(binary) => {
                let server =
                    ServerHandle::spawn(binary, &self.config.session, &self.config.server).await?;
                self.server = Some(server);
            }
            None => {
                let client = WebDriverClient::new(self.config.session.base_url())?;
                wait_for_ready(&client, &self.config.server).await?;
            }
        }
        Ok(())
    }

    /// Stop the server if this runner started it
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Create the automation session every scenario runs in
    pub async fn open_session(&self) -> E2eResult<Session> {
        let client = WebDriverClient::new(self.config.session.base_url())?;
        client
            .new_session(&self.config.session.capabilities)
            .await
            .map_err(|e| E2eError::SessionSetup(e.to_string()))
    }

    /// Run all scenarios in the scenarios path
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let suites = SuiteSpec::load(&self.config.scenarios_dir)?;
        self.run_suites(&suites).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let suites = SuiteSpec::load(&self.config.scenarios_dir)?;
        let filtered = select(&suites, |suite, scenario| suite.has_tag(scenario, tag));
        let mut result = self.run_suites(&filtered).await?;
        result.skipped = count(&suites) - count(&filtered);
        Ok(result)
    }

    /// Run a specific scenario by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let suites = SuiteSpec::load(&self.config.scenarios_dir)?;
        let filtered = select(&suites, |_, scenario| scenario.name == name);
        if filtered.is_empty() {
            return Err(E2eError::SpecParse(format!("Test not found: {}", name)));
        }
        let mut result = self.run_suites(&filtered).await?;
        result.skipped = count(&suites) - count(&filtered);
        Ok(result)
    }

    /// Run suites in one session: readiness, session setup, scenarios,
    /// teardown.
    ///
    /// Setup failures fail the whole run; scenario failures are recorded in
    /// the returned result.
    pub async fn run_suites(&mut self, suites: &[SuiteSpec]) -> E2eResult<TestSuiteResult> {
        self.start_server().await?;
        let session = self.open_session().await?;

        let result = self.execute(&session, suites).await;

        if let Err(e) = session.delete().await {
            warn!("Failed to delete session {}: {}", session.id(), e);
        }
        if let Err(e) = self.stop_server() {
            warn!("Failed to stop automation server: {}", e);
        }
        Ok(result)
    }

    /// Run suites against an existing driver, strictly one scenario at a time
    pub async fn execute<D>(&mut self, driver: &D, suites: &[SuiteSpec]) -> TestSuiteResult
    where
        D: Driver + ?Sized,
    {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} scenario(s)...", count(suites));

        for suite in suites {
            debug!("Suite: {}", suite.name);
            for scenario in &suite.scenarios {
                let result = self.run_scenario(driver, suite, scenario).await;
                if result.success {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                } else {
                    failed += 1;
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                results.push(result);
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Test Results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        TestSuiteResult {
            total: results.len(),
            passed,
            failed,
            skipped: 0,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario: reset, `before_each`, steps, final capture
    async fn run_scenario<D>(&mut self, driver: &D, suite: &SuiteSpec, scenario: &ScenarioSpec) -> TestResult
    where
        D: Driver + ?Sized,
    {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let wait = self.config.wait;
        let mut ctx = ActionContext::new(driver, &mut self.evidence, scenario.name.as_str(), wait);
        let mut steps = Vec::new();
        let mut test_error: Option<String> = None;

        if let Err(e) = driver.reset_app().await {
            test_error = Some(format!("App reset failed: {}", e));
        } else {
            let all_steps = suite.before_each.iter().chain(scenario.steps.iter());
            for step in all_steps {
                let step_start = Instant::now();
                let step_name = step.label();
                let outcome = execute_step(&mut ctx, step).await;
                let duration_ms = step_start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(()) => steps.push(StepResult {
                        success: true,
                        step_name,
                        duration_ms,
                        error: None,
                    }),
                    Err(e) => {
                        let reason = e.to_string();
                        test_error = Some(
                            E2eError::StepFailed {
                                step: step_name.clone(),
                                reason: reason.clone(),
                            }
                            .to_string(),
                        );
                        steps.push(StepResult {
                            success: false,
                            step_name,
                            duration_ms,
                            error: Some(reason),
                        });
                        break; // Stop on first failure
                    }
                }
            }
        }

        // Final screen as evidence, whether the scenario passed or not
        if let Err(e) = ctx.capture("after_each").await {
            warn!("Could not capture final screenshot for '{}': {}", scenario.name, e);
        }

        TestResult {
            suite: suite.name.clone(),
            name: scenario.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            attachments: ctx.into_attachments(),
            error: test_error,
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

/// Execute one step through the action wrapper
async fn execute_step<D>(ctx: &mut ActionContext<'_, D>, step: &TestStep) -> E2eResult<()>
where
    D: Driver + ?Sized,
{
    let wait = step
        .timeout()
        .map(|timeout| ctx.wait_options().with_timeout(timeout))
        .unwrap_or(*ctx.wait_options());
    let driver = ctx.driver();

    match step {
        TestStep::SetValue { locator, value, .. } => {
            ctx.action_within("set_value", locator, &wait, |el| async move {
                driver.set_value(&el, value).await.map_err(E2eError::from)
            })
            .await
        }
        TestStep::Click { locator, .. } => {
            ctx.action_within("click", locator, &wait, |el| async move {
                driver.click(&el).await.map_err(E2eError::from)
            })
            .await
        }
        TestStep::AssertExists { locator, .. } => {
            // Finding the element is the assertion.
            ctx.action_within("assert_exists", locator, &wait, |_| async { Ok::<(), E2eError>(()) })
                .await
        }
        TestStep::AssertAbsent { locator, .. } => {
            info!("[{}] assert_absent ({})", ctx.scenario(), locator);
            wait_for_absence(driver, locator, &wait).await?;
            ctx.capture("assert_absent").await?;
            Ok(())
        }
        TestStep::AssertText { locator, equals, contains, .. } => {
            ctx.action_within("assert_text", locator, &wait, |el| async move {
                let text = driver.text(&el).await?;
                check_text(&text, equals.as_deref(), contains.as_deref())
            })
            .await
        }
        TestStep::Screenshot { name } => {
            ctx.capture(name).await?;
            Ok(())
        }
        TestStep::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(())
        }
        TestStep::Log { message } => {
            info!("[TEST LOG] {}", message);
            Ok(())
        }
    }
}

fn check_text(actual: &str, equals: Option<&str>, contains: Option<&str>) -> E2eResult<()> {
    if let Some(expected) = equals {
        if actual != expected {
            return Err(E2eError::AssertionFailed(format!(
                "expected text '{}', found '{}'",
                expected, actual
            )));
        }
    }
    if let Some(fragment) = contains {
        if !actual.contains(fragment) {
            return Err(E2eError::AssertionFailed(format!(
                "expected text containing '{}', found '{}'",
                fragment, actual
            )));
        }
    }
    Ok(())
}

/// Keep only the scenarios accepted by `keep`, dropping emptied suites
fn select<F>(suites: &[SuiteSpec], keep: F) -> Vec<SuiteSpec>
where
    F: Fn(&SuiteSpec, &ScenarioSpec) -> bool,
{
    suites
        .iter()
        .filter_map(|suite| {
            let scenarios: Vec<ScenarioSpec> = suite
                .scenarios
                .iter()
                .filter(|scenario| keep(suite, scenario))
                .cloned()
                .collect();
            (!scenarios.is_empty()).then(|| SuiteSpec {
                scenarios,
                ..suite.clone()
            })
        })
        .collect()
}

fn count(suites: &[SuiteSpec]) -> usize {
    suites.iter().map(|s| s.scenarios.len()).sum()
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub wait: WaitOptions,
    pub evidence: EvidenceConfig,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            server: ServerConfig::default(),
            wait: WaitOptions::default(),
            evidence: EvidenceConfig::default(),
            scenarios_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl RunnerConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        Self {
            session: SessionConfig::from_lookup(&lookup),
            server: ServerConfig::from_lookup(&lookup),
            wait: WaitOptions::new(
                millis("WAIT_TIMEOUT_MS", DEFAULT_TIMEOUT),
                millis("WAIT_INTERVAL_MS", DEFAULT_INTERVAL),
            ),
            evidence: EvidenceConfig {
                dir: lookup("SCREENSHOTS_DIR")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| EvidenceConfig::default().dir),
            },
            ..Self::default()
        }
    }

    /// Resolve from the process environment, then apply `overrides`
    pub fn from_env(overrides: &RunnerOverrides) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve from `lookup`, then apply command-line overrides.
    ///
    /// A platform override takes part in resolution, so platform-dependent
    /// defaults (automation name, Android app identifiers) follow it.
    pub fn resolve<F>(lookup: F, overrides: &RunnerOverrides) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_lookup(|key| match (key, &overrides.platform) {
            ("PLATFORM", Some(platform)) => Some(platform.clone()),
            _ => lookup(key),
        });

        if let Some(dir) = &overrides.scenarios_dir {
            config.scenarios_dir = dir.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &overrides.screenshots_dir {
            config.evidence.dir = dir.clone();
        }
        if let Some(ms) = overrides.timeout_ms {
            config.wait.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.interval_ms {
            config.wait.interval = Duration::from_millis(ms);
        }
        config
    }
}

/// Command-line settings that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct RunnerOverrides {
    pub scenarios_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub screenshots_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub platform: Option<String>,
}
