//! Store configuration
//!
//! A small TOML file tunes the two knobs the store exposes: the default
//! page size for filtered reads and the batch size for migrations.
//! Everything else is behavior, not configuration.

use docstore_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "docstore.toml";

const DEFAULT_LIMIT: usize = 10;
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Tunable store parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Page size used when a filtered read passes limit 0
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Rows moved per migration batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            default_limit: DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl StoreConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::InvalidArgument(format!("bad config: {e}")))
    }

    /// Load a config file, falling back to defaults when it is absent
    ///
    /// A present but malformed file is an error; silently ignoring it
    /// would mask typos.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(StoreConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
