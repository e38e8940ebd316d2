// src/config/mod.rs

use crate::error::HarnessError;
use crate::protocol::{Domain, Mode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Settings for a harness run. Every field has a default, so a config file
/// only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub model: String,
    pub api_base: String,
    #[serde(alias = "openai_api_key", skip_serializing)]
    pub api_key: Option<String>,
    pub trials: usize,
    pub results_dir: PathBuf,
    pub capture_failures: bool,
    pub seed: Option<u64>,
    pub log_to_file: bool,
    pub timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            trials: 100,
            results_dir: PathBuf::from("results"),
            capture_failures: true,
            seed: None,
            log_to_file: false,
            timeout_secs: 60,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies the `HARNESS_*` variables and `OPENAI_API_KEY`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Values that fail to parse are
    /// ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(model) = lookup("HARNESS_MODEL") {
            self.model = model;
        }
        if let Some(base) = lookup("HARNESS_API_BASE") {
            self.api_base = base;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(dir) = lookup("HARNESS_RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir);
        }
        override_parsed(&lookup, "HARNESS_TRIALS", &mut self.trials);
        override_parsed(&lookup, "HARNESS_CAPTURE_FAILURES", &mut self.capture_failures);
        override_parsed(&lookup, "HARNESS_LOG_TO_FILE", &mut self.log_to_file);
        let mut seed = 0u64;
        if override_parsed(&lookup, "HARNESS_SEED", &mut seed) {
            self.seed = Some(seed);
        }
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn capture_failures(mut self, enabled: bool) -> Self {
        self.capture_failures = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn failure_log_path(&self, domain: Domain, mode: Mode) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}_failures_{}.json",
            domain.name(),
            mode.label(),
            file_safe(&self.model)
        ))
    }

    pub fn results_path(&self, domain: Domain) -> PathBuf {
        self.results_dir
            .join(format!("test_results_{}_{}.json", domain.name(), file_safe(&self.model)))
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.model.trim().is_empty() {
            return Err(HarnessError::Config("model name is empty".into()));
        }
        if self.trials == 0 {
            return Err(HarnessError::Config("trials must be at least 1".into()));
        }
        Ok(())
    }
}

// Model names like `org/model` must not introduce directories.
fn file_safe(model: &str) -> String {
    model.replace(['/', '\\', ':'], "_")
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) -> bool
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return false;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => {
            info!(key, %value, "config override");
            *slot = value;
            true
        }
        Err(_) => {
            warn!(key, raw = %raw, default = %slot, "could not parse override; keeping current value");
            false
        }
    }
}
