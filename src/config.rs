use crate::model::{MonitorError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Relative-gap bounds for risk classification. `high` and `low` are both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub low: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self { high: 0.05, low: -0.05 }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.high.is_finite() || !self.low.is_finite() {
            return Err(MonitorError::Config("thresholds must be finite".into()));
        }
        if self.low >= self.high {
            return Err(MonitorError::Config(format!(
                "low threshold ({}) must be below high threshold ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub seed: u64,
    pub n_days: u32,
    pub n_stores: u32,
    pub n_skus: u32,
    pub competitors: Vec<String>,
    /// Last generated date (`YYYY-MM-DD`); today when absent.
    pub end_date: Option<String>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_days: 14,
            n_stores: 8,
            n_skus: 30,
            competitors: vec!["Conc_A".into(), "Conc_B".into(), "Conc_C".into()],
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub own_prices_path: PathBuf,
    pub competitor_prices_path: PathBuf,
    pub output_csv_path: PathBuf,
    pub output_db_path: PathBuf,
    pub thresholds: RiskThresholds,
    pub sample: SampleConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            own_prices_path: PathBuf::from("data/raw/own_prices.csv"),
            competitor_prices_path: PathBuf::from("data/raw/competitor_prices.csv"),
            output_csv_path: PathBuf::from("outputs/monitor_competitividade.csv"),
            output_db_path: PathBuf::from("data/processed/monitor_competitividade.db"),
            thresholds: RiskThresholds::default(),
            sample: SampleConfig::default(),
            log_level: "info".into(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(MonitorError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.thresholds.validate()?;
    Ok(config)
}
