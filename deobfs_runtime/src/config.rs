//! Run configuration, read from an optional YAML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RuntimeError, RuntimeResult};
use crate::filter::FilterConfig;

pub const DEFAULT_CONFIG_PATH: &str = "deobfs.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw decompiler output.
    pub source_dir: PathBuf,
    /// Filter output; the obfuscated schema is loaded from here.
    pub filtered_dir: PathBuf,
    /// Clear, named schema.
    pub reference_dir: PathBuf,
    pub namespace_markers: Vec<String>,
    /// File names to load; empty loads everything.
    pub file_filter: Vec<String>,
    pub report_dir: PathBuf,
    /// Load `source_dir` directly instead of filtering it first.
    pub skip_filter: bool,
    pub json_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("protos/decompiled"),
            filtered_dir: PathBuf::from("protos/filtered"),
            reference_dir: PathBuf::from("protos/clear"),
            namespace_markers: vec![
                "Ankama.Dofus.Protocol.Connection".to_string(),
                "Ankama.Dofus.Protocol.Game".to_string(),
            ],
            file_filter: Vec::new(),
            report_dir: PathBuf::from("reports"),
            skip_filter: false,
            json_report: false,
        }
    }
}

impl Config {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            source_dir: self.source_dir.clone(),
            output_dir: self.filtered_dir.clone(),
            namespace_markers: self.namespace_markers.clone(),
        }
    }

    /// Directory the obfuscated schema is read from.
    pub fn obfuscated_dir(&self) -> &Path {
        if self.skip_filter {
            &self.source_dir
        } else {
            &self.filtered_dir
        }
    }
}

/// Load `path`, or `deobfs.yaml` when none is given. A missing file yields
/// the defaults.
pub fn load_config(path: Option<&Path>) -> RuntimeResult<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
    let config: Config = serde_yaml::from_str(&content).map_err(|source| RuntimeError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "loaded configuration");
    Ok(config)
}
