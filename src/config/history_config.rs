//! History source and report export settings.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HistoryEnvConfig {
    /// Directory holding `deals.csv` and `orders.csv` in csv mode
    pub history_dir: PathBuf,
    pub report_output: PathBuf,
}

impl HistoryEnvConfig {
    pub fn from_env() -> Self {
        Self {
            history_dir: env::var("HISTORY_DIR")
                .unwrap_or_else(|_| "./history".to_string())
                .into(),
            report_output: env::var("REPORT_OUTPUT")
                .unwrap_or_else(|_| "backtest_report.json".to_string())
                .into(),
        }
    }
}
