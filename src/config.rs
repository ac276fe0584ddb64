//! Analysis Settings
//! Defaults for every tunable of the report, optionally overridden by a
//! JSON file next to the data.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory for overrides.
pub const CONFIG_FILE: &str = "analysis.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("train_fraction must be in (0, 1), got {0}")]
    InvalidTrainFraction(f64),
    #[error("histogram_bin_width must be positive, got {0}")]
    InvalidBinWidth(f64),
    #[error("range_breaks must be strictly ascending and non-empty")]
    InvalidRangeBreaks,
    #[error("infrequent_threshold must be in [0, 1), got {0}")]
    InvalidThreshold(f64),
    #[error("funnel_top_n must be at least 1")]
    InvalidTopN,
}

/// User settings for the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub seed: u64,
    pub train_fraction: f64,
    pub histogram_bin_width: f64,
    /// Lower edges of the range bins; the last one opens the target bin.
    pub range_breaks: Vec<f64>,
    pub infrequent_threshold: f64,
    pub funnel_top_n: usize,
    pub exclude_columns: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data.csv"),
            output_dir: PathBuf::from("report"),
            seed: 123,
            train_fraction: 0.8,
            histogram_bin_width: 25.0,
            range_breaks: vec![0.0, 50.0, 100.0, 215.0],
            infrequent_threshold: 0.01,
            funnel_top_n: 20,
            exclude_columns: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No {} found, using default settings", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::InvalidTrainFraction(self.train_fraction));
        }
        if !(self.histogram_bin_width > 0.0) {
            return Err(ConfigError::InvalidBinWidth(self.histogram_bin_width));
        }
        if self.range_breaks.is_empty()
            || self.range_breaks.windows(2).any(|w| !(w[0] < w[1]))
        {
            return Err(ConfigError::InvalidRangeBreaks);
        }
        if !(0.0..1.0).contains(&self.infrequent_threshold) {
            return Err(ConfigError::InvalidThreshold(self.infrequent_threshold));
        }
        if self.funnel_top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 123);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"seed": 7, "train_fraction": 0.75}}"#).unwrap();

        let config = AnalysisConfig::load_or_default(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.train_fraction, 0.75);
        assert_eq!(config.data_path, PathBuf::from("data.csv"));
    }

    #[test]
    fn rejects_bad_fraction() {
        let config = AnalysisConfig {
            train_fraction: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTrainFraction(_))
        ));
    }

    #[test]
    fn rejects_unsorted_breaks() {
        let config = AnalysisConfig {
            range_breaks: vec![0.0, 215.0, 100.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRangeBreaks)
        ));
    }

    #[test]
    fn rejects_empty_funnel_chart() {
        let config = AnalysisConfig {
            funnel_top_n: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTopN)));
    }
}
