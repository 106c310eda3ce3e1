use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::reconcile::normalize::EncodingPolicy;

/// Name of the optional configuration file looked up at the watched root.
pub const CONFIG_FILE: &str = "change-squash.toml";

/// Configuration loaded from `change-squash.toml` at the watched root.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SquashConfig {
    /// Extra regexes; a relative path matching any of them is silenced.
    pub ignore: Vec<String>,
    /// Keep the built-in VCS directory and editor temp-file rules.
    pub default_ignores: bool,
    /// When non-empty, files whose relative path matches none of these
    /// regexes are silenced. Directories are never filtered by `only`.
    pub only: Vec<String>,
    /// Also silence paths matched by the root `.gitignore`.
    pub respect_gitignore: bool,
    /// Quiet period after the last raw change before a batch is flushed.
    pub wait_for_delay_ms: u64,
    /// Upper bound on how long a batch may wait after its first raw change,
    /// however busy the tree stays.
    pub max_batch_wait_ms: u64,
    /// Treat any non-ASCII path as an invalid encoding.
    pub ascii_only: bool,
}

impl Default for SquashConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            default_ignores: true,
            only: Vec::new(),
            respect_gitignore: true,
            wait_for_delay_ms: 100,
            max_batch_wait_ms: 1000,
            ascii_only: true,
        }
    }
}

impl SquashConfig {
    /// Load configuration from `change-squash.toml` in the given root directory.
    ///
    /// Returns a default configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn wait_for_delay(&self) -> Duration {
        Duration::from_millis(self.wait_for_delay_ms)
    }

    pub fn max_batch_wait(&self) -> Duration {
        Duration::from_millis(self.max_batch_wait_ms)
    }

    pub fn encoding_policy(&self) -> EncodingPolicy {
        EncodingPolicy {
            ascii_only: self.ascii_only,
        }
    }
}
