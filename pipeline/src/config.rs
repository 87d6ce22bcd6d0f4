use std::path::{Path, PathBuf};

use analysis::features::FeatureConfig;
use analysis::weapons::WeaponTaxonomy;
use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parse: ParseConfig,
    pub features: FeaturesConfig,
    pub weapons: WeaponTaxonomy,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// One directory per match with the decoder's event tables
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rolling_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Tried in order until one of them succeeds
    pub tools: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/events"),
            output: PathBuf::from("data/tables"),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/tables"),
            output: PathBuf::from("data/features"),
            rolling_window: FeatureConfig::default().rolling_window,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/archives"),
            output: PathBuf::from("data/demos"),
            tools: vec!["unar".to_owned(), "unrar".to_owned(), "7z".to_owned()],
            timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the config file if there is one, the defaults otherwise.
    pub fn load_or_default<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| PipelineError::io(path, e))?;
        Ok(())
    }

    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            rolling_window: self.features.rolling_window,
        }
    }

    pub fn extract_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.extract.timeout_secs)
    }
}
