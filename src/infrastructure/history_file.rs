//! History feed backed by CSV exports of the terminal's deal and order tabs.
//!
//! Expected layout: `<dir>/deals.csv` and `<dir>/orders.csv`, each with a
//! header row whose column names match the JSON field names (`type` for the
//! side, `entry` as `IN`/`OUT`). Rows are returned in file order.

use crate::domain::errors::FeedError;
use crate::domain::ports::HistoryFeed;
use crate::domain::trading::types::{Deal, HistoricalOrder, within_window};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEALS_FILE: &str = "deals.csv";
pub const ORDERS_FILE: &str = "orders.csv";

pub struct CsvHistoryFeed {
    dir: PathBuf,
}

impl CsvHistoryFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, FeedError> {
        let path = self.dir.join(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FeedError::Transport {
                reason: format!("cannot read {}: {}", path.display(), e),
            })?;

        parse_rows(&content, &path)
    }
}

fn parse_rows<T: DeserializeOwned>(content: &str, path: &Path) -> Result<Vec<T>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        let row = record.map_err(|e| FeedError::Malformed {
            source_name: path.display().to_string(),
            // header is line 1
            reason: format!("line {}: {}", idx + 2, e),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[async_trait]
impl HistoryFeed for CsvHistoryFeed {
    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deal>, FeedError> {
        let deals: Vec<Deal> = self.load(DEALS_FILE).await?;
        let total = deals.len();
        let selected: Vec<Deal> = deals
            .into_iter()
            .filter(|d| within_window(d.time, from, to))
            .collect();
        debug!(
            "CsvHistoryFeed: {} of {} deals inside window",
            selected.len(),
            total
        );
        Ok(selected)
    }

    async fn history_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalOrder>, FeedError> {
        let orders: Vec<HistoricalOrder> = self.load(ORDERS_FILE).await?;
        Ok(orders
            .into_iter()
            .filter(|o| within_window(o.time_setup, from, to))
            .collect())
    }
}
