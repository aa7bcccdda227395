//! Session configuration sourced from the environment
//!
//! Every field has a static fallback, so a run with no variables set talks
//! to a local Appium server on the default port and drives the default
//! emulator.

use serde::{Deserialize, Serialize};

use mobile_e2e_webdriver::Capabilities;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4723;
pub const DEFAULT_PATH: &str = "/wd/hub";
pub const DEFAULT_PLATFORM: &str = "Android";
pub const DEFAULT_DEVICE_NAME: &str = "emulator-5554";
pub const DEFAULT_APP_PATH: &str = "./app-release.apk";
pub const DEFAULT_APP_PACKAGE: &str = "com.example.app";
pub const DEFAULT_APP_ACTIVITY: &str = "com.example.app.MainActivity";
pub const DEFAULT_NEW_COMMAND_TIMEOUT: u64 = 300;

/// Automation server connection plus device capabilities.
///
/// Built once at process start and passed by reference to session setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub capabilities: Capabilities,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl SessionConfig {
    /// Resolve using `lookup` for variable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, fallback: &str| var(key).unwrap_or_else(|| fallback.to_string());

        let platform_name = or("PLATFORM", DEFAULT_PLATFORM);
        let automation_name =
            var("AUTOMATION_NAME").unwrap_or_else(|| default_automation_name(&platform_name).to_string());
        let ios = is_ios(&platform_name);

        Self {
            host: or("APPIUM_HOST", DEFAULT_HOST),
            port: var("APPIUM_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            path: or("APPIUM_PATH", DEFAULT_PATH),
            capabilities: Capabilities {
                device_name: or("DEVICE_NAME", DEFAULT_DEVICE_NAME),
                platform_version: var("PLATFORM_VERSION"),
                app: or("APP_PATH", DEFAULT_APP_PATH),
                app_package: (!ios).then(|| or("APP_PACKAGE", DEFAULT_APP_PACKAGE)),
                app_activity: (!ios).then(|| or("APP_ACTIVITY", DEFAULT_APP_ACTIVITY)),
                bundle_id: var("BUNDLE_ID"),
                automation_name,
                auto_grant_permissions: true,
                new_command_timeout: DEFAULT_NEW_COMMAND_TIMEOUT,
                no_reset: false,
                platform_name,
            },
        }
    }

    /// Base URL of the automation server, e.g. `http://127.0.0.1:4723/wd/hub`
    pub fn base_url(&self) -> String {
        let path = self.path.trim_end_matches('/');
        let path = if path.is_empty() || path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

fn is_ios(platform: &str) -> bool {
    platform.eq_ignore_ascii_case("ios")
}

fn default_automation_name(platform: &str) -> &'static str {
    if is_ios(platform) {
        "XCUITest"
    } else {
        "UiAutomator2"
    }
}
