//! Configuration module for termbridge.
//!
//! Settings are loaded from environment variables (a `.env` file is honored
//! by the binaries) and grouped by concern: Relay, History, Observability.

mod history_config;
mod observability_config;
mod relay_config;

pub use history_config::HistoryEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use relay_config::RelayEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where terminal data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// In-memory terminal with synthetic quotes
    Mock,
    /// Deal and order history exported to CSV files
    Csv,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "csv" => Ok(Mode::Csv),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'csv'", s),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub log_format: LogFormat,
    pub relay: RelayEnvConfig,
    pub history: HistoryEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "mock".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let relay = RelayEnvConfig::from_env().context("Failed to load relay config")?;

        Ok(Self {
            mode,
            log_format: LogFormat::from_env(),
            relay,
            history: HistoryEnvConfig::from_env(),
            observability: ObservabilityEnvConfig::from_env(),
        })
    }
}
