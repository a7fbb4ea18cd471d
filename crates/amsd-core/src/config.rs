//! Run configuration, stored as JSON

use crate::error::{Error, Result};
use crate::similarity::Thresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default output directory for the CSV tables
pub const DEFAULT_OUTPUT_DIR: &str = "raw";

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Settings of one conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Tab-delimited collection export
    pub input: PathBuf,
    /// Directory receiving one CSV file per table
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Media catalog JSON used to resolve linked filenames
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Also write the `sticks_flat` table
    #[serde(default)]
    pub flat: bool,
    /// Similarity thresholds; an explicit map replaces the defaults entirely
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl RunConfig {
    /// Create a config with default settings for `input`
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: default_output_dir(),
            catalog: None,
            flat: false,
            thresholds: Thresholds::default(),
        }
    }

    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
