//! Declarative YAML scenario suites

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use mobile_e2e_webdriver::Locator;

use crate::error::{E2eError, E2eResult};

/// A suite of scenarios parsed from one YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    /// Suite name, used in reports
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering; apply to every scenario of the suite
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps run before every scenario of this suite, after the app reset
    #[serde(default)]
    pub before_each: Vec<TestStep>,

    /// Scenarios, executed in order
    pub scenarios: Vec<ScenarioSpec>,
}

/// One scenario: an ordered list of steps against a freshly reset app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub steps: Vec<TestStep>,
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Replace the content of an input field
    SetValue {
        locator: Locator,
        value: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Tap an element
    Click {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert that an element shows up
    AssertExists {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert that an element is (or becomes) absent
    AssertAbsent {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert on an element's visible text
    AssertText {
        locator: Locator,
        #[serde(default)]
        equals: Option<String>,
        #[serde(default)]
        contains: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Capture the screen as evidence
    Screenshot { name: String },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Log a message
    Log { message: String },
}

impl TestStep {
    /// Short label used in logs, evidence file names and results
    pub fn label(&self) -> String {
        match self {
            TestStep::SetValue { locator, .. } => format!("set_value {}", locator),
            TestStep::Click { locator, .. } => format!("click {}", locator),
            TestStep::AssertExists { locator, .. } => format!("assert_exists {}", locator),
            TestStep::AssertAbsent { locator, .. } => format!("assert_absent {}", locator),
            TestStep::AssertText { locator, .. } => format!("assert_text {}", locator),
            TestStep::Screenshot { name } => format!("screenshot {}", name),
            TestStep::Sleep { ms } => format!("sleep {}ms", ms),
            TestStep::Log { message } => {
                format!("log {}", message.chars().take(30).collect::<String>())
            }
        }
    }

    /// Per-step wait timeout override
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            TestStep::SetValue { timeout_ms, .. }
            | TestStep::Click { timeout_ms, .. }
            | TestStep::AssertExists { timeout_ms, .. }
            | TestStep::AssertAbsent { timeout_ms, .. }
            | TestStep::AssertText { timeout_ms, .. } => timeout_ms.map(Duration::from_millis),
            _ => None,
        }
    }
}

impl SuiteSpec {
    /// Parse a suite from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let suite: Self = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every suite in a directory, ordered by file path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Load a single file or every suite under a directory
    pub fn load(path: &Path) -> E2eResult<Vec<Self>> {
        if path.is_file() {
            Ok(vec![Self::from_file(path)?])
        } else if path.is_dir() {
            Self::load_all(path)
        } else {
            Err(E2eError::SpecParse(format!(
                "No scenario file or directory at {}",
                path.display()
            )))
        }
    }

    /// Whether `scenario` carries `tag`, directly or through the suite
    pub fn has_tag(&self, scenario: &ScenarioSpec, tag: &str) -> bool {
        self.tags.iter().chain(scenario.tags.iter()).any(|t| t == tag)
    }

    fn validate(&self) -> E2eResult<()> {
        let mut names = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(E2eError::SpecParse(format!(
                    "Duplicate scenario '{}' in suite '{}'",
                    scenario.name, self.name
                )));
            }
        }

        for step in self.before_each.iter().chain(self.scenarios.iter().flat_map(|s| &s.steps)) {
            if let TestStep::AssertText { equals: None, contains: None, .. } = step {
                return Err(E2eError::SpecParse(format!(
                    "'{}' in suite '{}' needs `equals` or `contains`",
                    step.label(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = r#"
name: login
description: Login scenarios
tags: [auth, smoke]
scenarios:
  - name: Login avec admin valide
    steps:
      - action: set_value
        locator: '//*[@resource-id="com.example.app:id/username_input"]'
        value: admin
      - action: click
        locator: '//*[@text="Login"]'
        timeout_ms: 2000
      - action: assert_exists
        locator: '//*[contains(@text, "Dashboard")]'
"#;

    #[test]
    fn test_parse_suite() {
        let suite = SuiteSpec::from_yaml(LOGIN).unwrap();
        assert_eq!(suite.name, "login");
        assert_eq!(suite.scenarios.len(), 1);

        let steps = &suite.scenarios[0].steps;
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[0],
            TestStep::SetValue {
                locator: Locator::resource_id("com.example.app:id/username_input"),
                value: "admin".into(),
                timeout_ms: None,
            }
        );
        assert_eq!(steps[1].timeout(), Some(Duration::from_millis(2000)));
        assert_eq!(steps[2].label(), r#"assert_exists //*[contains(@text, "Dashboard")]"#);
    }

    #[test]
    fn test_before_each_and_tags() {
        let yaml = r#"
name: critical
tags: [critical]
before_each:
  - action: click
    locator: '//*[@text="Login"]'
scenarios:
  - name: Paiement utilisateur
    tags: [payment]
    steps:
      - action: assert_text
        locator: '//*[contains(@text, "Payment")]'
        contains: successful
"#;
        let suite = SuiteSpec::from_yaml(yaml).unwrap();
        assert_eq!(suite.before_each.len(), 1);

        let scenario = &suite.scenarios[0];
        assert!(suite.has_tag(scenario, "critical"));
        assert!(suite.has_tag(scenario, "payment"));
        assert!(!suite.has_tag(scenario, "auth"));
    }

    #[test]
    fn test_rejects_duplicate_scenarios() {
        let yaml = r#"
name: dup
scenarios:
  - name: same
    steps: []
  - name: same
    steps: []
"#;
        assert!(matches!(SuiteSpec::from_yaml(yaml), Err(E2eError::SpecParse(_))));
    }

    #[test]
    fn test_rejects_assert_text_without_expectation() {
        let yaml = r#"
name: bad
scenarios:
  - name: empty assertion
    steps:
      - action: assert_text
        locator: '//*[@text="Pay"]'
"#;
        assert!(matches!(SuiteSpec::from_yaml(yaml), Err(E2eError::SpecParse(_))));
    }

    #[test]
    fn test_unknown_action_is_yaml_error() {
        let yaml = r#"
name: bad
scenarios:
  - name: swipe
    steps:
      - action: swipe
        locator: x
"#;
        assert!(matches!(SuiteSpec::from_yaml(yaml), Err(E2eError::Yaml(_))));
    }

    #[test]
    fn test_load_all_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.yaml"), "name: b\nscenarios: []\n").unwrap();
        std::fs::write(tmp.path().join("a.yml"), "name: a\nscenarios: []\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let suites = SuiteSpec::load(tmp.path()).unwrap();
        let names: Vec<_> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_shipped_scenarios_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios");
        let suites = SuiteSpec::load_all(&dir).unwrap();
        let total: usize = suites.iter().map(|s| s.scenarios.len()).sum();
        assert_eq!(suites.len(), 3);
        assert_eq!(total, 6);
    }
}
