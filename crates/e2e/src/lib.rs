//! Mobile E2E Test Framework
//!
//! This crate drives the mobile app through an Appium server and:
//! - Checks the server is ready (optionally spawning it first)
//! - Opens one automation session for the whole run
//! - Parses declarative YAML scenario suites
//! - Wraps every interaction with a polling lookup and screenshot evidence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle | readiness only      │
//! │    ├── open_session() -> Session                            │
//! │    ├── execute(driver, suites) -> TestSuiteResult           │
//! │    └── write_results(results) -> test-results.json          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ActionContext                                              │
//! │    ├── wait_for_element(locator) -> ElementRef              │
//! │    ├── interaction(element)                                 │
//! │    └── capture(name) -> screenshot + attachment             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SuiteSpec (YAML)                                           │
//! │    ├── name, description, tags                              │
//! │    ├── before_each: [TestStep]                              │
//! │    └── scenarios: [{ name, tags, steps: [TestStep] }]       │
//! │          ├── set_value { locator, value }                   │
//! │          ├── click { locator }                              │
//! │          ├── assert_exists / assert_absent { locator }      │
//! │          ├── assert_text { locator, equals?, contains? }    │
//! │          └── screenshot { name } / sleep { ms } / log       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod config;
pub mod driver;
pub mod error;
pub mod evidence;
pub mod runner;
pub mod server;
pub mod spec;
pub mod testing;
pub mod wait;

pub use action::ActionContext;
pub use config::SessionConfig;
pub use driver::Driver;
pub use error::{E2eError, E2eResult};
pub use evidence::{Attachment, EvidenceConfig, EvidenceStore};
pub use runner::{RunnerConfig, RunnerOverrides, TestRunner, TestSuiteResult};
pub use spec::{ScenarioSpec, SuiteSpec, TestStep};
pub use wait::{wait_for_absence, wait_for_element, WaitOptions};
