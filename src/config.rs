use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::changelog::{GroupingMode, OutputFormat};

/// File-based configuration. Every key is optional; missing sections
/// fall back to the defaults, and command-line flags override whatever
/// the file says.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub features: FeaturesConfig,
    pub git: GitConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
    pub template: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub unreleased: bool,
    pub tag_annotations: bool,
    pub grouping: GroupingMode,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Only tags matching this regex count as releases.
    pub tag_pattern: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
