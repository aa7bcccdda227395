//! Session capabilities sent when creating a session

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Device and app capabilities for a new automation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// `Android` or `iOS`
    pub platform_name: String,

    /// Device or emulator identifier
    pub device_name: String,

    #[serde(default)]
    pub platform_version: Option<String>,

    /// Path to the app binary under test
    pub app: String,

    /// Android package name
    #[serde(default)]
    pub app_package: Option<String>,

    /// Android launch activity
    #[serde(default)]
    pub app_activity: Option<String>,

    /// iOS bundle identifier
    #[serde(default)]
    pub bundle_id: Option<String>,

    /// Automation driver (`UiAutomator2`, `XCUITest`, `Flutter`)
    pub automation_name: String,

    pub auto_grant_permissions: bool,

    /// Seconds the server waits for a command before ending the session
    pub new_command_timeout: u64,

    pub no_reset: bool,
}

impl Capabilities {
    /// Capabilities as a flat map of Appium capability names.
    ///
    /// Optional values that are unset are omitted.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("platformName".into(), json!(self.platform_name));
        map.insert("deviceName".into(), json!(self.device_name));
        if let Some(version) = &self.platform_version {
            map.insert("platformVersion".into(), json!(version));
        }
        map.insert("app".into(), json!(self.app));
        if let Some(package) = &self.app_package {
            map.insert("appPackage".into(), json!(package));
        }
        if let Some(activity) = &self.app_activity {
            map.insert("appActivity".into(), json!(activity));
        }
        if let Some(bundle_id) = &self.bundle_id {
            map.insert("bundleId".into(), json!(bundle_id));
        }
        map.insert("automationName".into(), json!(self.automation_name));
        map.insert("autoGrantPermissions".into(), json!(self.auto_grant_permissions));
        map.insert("newCommandTimeout".into(), json!(self.new_command_timeout));
        map.insert("noReset".into(), json!(self.no_reset));
        map
    }

    /// Request body for `POST /session`.
    ///
    /// W3C servers read `capabilities.alwaysMatch`, where every non-standard
    /// capability carries the `appium:` vendor prefix. Older `/wd/hub`
    /// servers read `desiredCapabilities`.
    pub fn new_session_body(&self) -> Value {
        let desired = self.to_map();
        let always_match: Map<String, Value> = desired
            .iter()
            .map(|(key, value)| {
                let key = if key == "platformName" {
                    key.clone()
                } else {
                    format!("appium:{}", key)
                };
                (key, value.clone())
            })
            .collect();

        json!({
            "capabilities": {
                "alwaysMatch": always_match,
                "firstMatch": [{}],
            },
            "desiredCapabilities": desired,
        })
    }

    /// Identifier of the app under test, used by app-management commands
    pub fn app_id(&self) -> Option<&str> {
        if self.platform_name.eq_ignore_ascii_case("ios") {
            self.bundle_id.as_deref()
        } else {
            self.app_package.as_deref()
        }
    }
}
