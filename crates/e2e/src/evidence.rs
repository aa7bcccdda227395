//! Screenshot evidence written to disk and attached to test results

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::E2eResult;

/// Report attachment title used for every screenshot
pub const SCREENSHOT_TITLE: &str = "Screenshot";

/// A file attached to a scenario's report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: String,
    pub value: String,
}

impl Attachment {
    pub fn screenshot(path: &Path) -> Self {
        Self {
            title: SCREENSHOT_TITLE.to_string(),
            value: path.to_string_lossy().to_string(),
        }
    }
}

/// Configuration for evidence capture
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    /// Directory screenshots are written to, created on first capture
    pub dir: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("screenshots"),
        }
    }
}

/// Names and writes screenshot files for one run.
///
/// File names combine the run start time, a per-run sequence number, the
/// scenario title and the action, so no two captures of a run share a name.
pub struct EvidenceStore {
    dir: PathBuf,
    run_stamp: String,
    sequence: u64,
}

impl EvidenceStore {
    pub fn new(config: EvidenceConfig) -> Self {
        Self::started_at(config, Local::now())
    }

    pub fn started_at(config: EvidenceConfig, started: DateTime<Local>) -> Self {
        Self {
            dir: config.dir,
            run_stamp: started.format("%Y%m%d-%H%M%S").to_string(),
            sequence: 0,
        }
    }

    /// Sequence number of the latest capture
    pub fn captured(&self) -> u64 {
        self.sequence
    }

    /// Write `png` for `scenario`/`action` and return its path
    pub fn save(&mut self, scenario: &str, action: &str, png: &[u8]) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let path = loop {
            self.sequence += 1;
            let candidate = self.dir.join(format!(
                "{}_{:04}_{}_{}.png",
                self.run_stamp,
                self.sequence,
                sanitize(scenario),
                sanitize(action),
            ));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut file) => {
                    file.write_all(png)?;
                    break candidate;
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        };

        debug!("Saved screenshot {}", path.display());
        Ok(path)
    }
}

/// Turn a scenario title or action name into a file-name fragment.
///
/// Whitespace runs become `_`; path separators and characters that are
/// invalid in file names on common filesystems become `-`.
pub fn sanitize(name: &str) -> String {
    let name = WHITESPACE.replace_all(name.trim(), "_");
    INVALID.replace_all(&name, "-").into_owned()
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[/\\:*?"<>|]"#).expect("static regex"));
