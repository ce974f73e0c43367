use super::document::ReportDocument;
use crate::domain::errors::{AdvisorError, FeedError};
use crate::domain::performance::deal_statistics::{self, StatisticsOutcome};
use crate::domain::ports::HistoryFeed;
use crate::domain::trading::types::{Deal, HistoricalOrder};
use crate::infrastructure::report_export::ReportExporter;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs trade statistics over the terminal's history.
pub struct BacktestBridge {
    feed: Arc<dyn HistoryFeed>,
}

impl BacktestBridge {
    pub fn new(feed: Arc<dyn HistoryFeed>) -> Self {
        Self { feed }
    }

    pub async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deal>, FeedError> {
        self.feed.history_deals(from, to).await
    }

    pub async fn history_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalOrder>, FeedError> {
        self.feed.history_orders(from, to).await
    }

    /// Aggregates the deals in `[from, to)`.
    ///
    /// A feed failure is returned as `Err`, a quiet window as `Ok(NoData)`.
    pub async fn analyze(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<StatisticsOutcome, FeedError> {
        let deals = self.feed.history_deals(from, to).await.inspect_err(|e| {
            warn!("BacktestBridge: history feed failed for {} - {}: {}", from, to, e);
        })?;

        info!(
            "BacktestBridge: {} deals between {} and {}",
            deals.len(),
            from,
            to
        );
        Ok(deal_statistics::aggregate(&deals))
    }

    /// Analyzes the window and writes the resulting document to `output`.
    pub async fn export_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        output: &Path,
    ) -> Result<ReportDocument> {
        let analysis = self.analyze(from, to).await;
        let document = ReportDocument::from_analysis(&analysis);

        let exporter = ReportExporter::new(output);
        exporter.write(&document)?;
        info!("Backtest report exported to {}", exporter.path().display());
        Ok(document)
    }
}

/// Resolves the compiled `.ex5` next to an Expert Advisor source file.
///
/// Compilation itself happens in MetaEditor; this only checks that it was done.
pub fn locate_compiled_advisor(source: &Path) -> Result<PathBuf, AdvisorError> {
    if !source.exists() {
        return Err(AdvisorError::SourceNotFound);
    }

    let compiled = source.with_extension("ex5");
    if !compiled.exists() {
        return Err(AdvisorError::NotCompiled);
    }

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::types::{DealEntry, OrderSide};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    enum FakeFeed {
        Deals(Vec<Deal>),
        Broken,
    }

    #[async_trait]
    impl HistoryFeed for FakeFeed {
        async fn history_deals(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<Deal>, FeedError> {
            match self {
                FakeFeed::Deals(deals) => Ok(deals.clone()),
                FakeFeed::Broken => Err(FeedError::Transport {
                    reason: "IPC timeout".to_string(),
                }),
            }
        }

        async fn history_orders(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<HistoricalOrder>, FeedError> {
            Ok(Vec::new())
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
    }

    fn out_deal(profit: Decimal) -> Deal {
        Deal {
            ticket: 1,
            order: 2,
            time: 1_704_100_000,
            side: OrderSide::Sell,
            entry: DealEntry::Out,
            symbol: "XAUUSDc".to_string(),
            volume: dec!(0.01),
            price: dec!(2061.4),
            profit,
            commission: Decimal::ZERO,
            swap: dec!(-0.35),
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_analyze_distinguishes_quiet_window_from_failure() {
        let (from, to) = window();

        let quiet = BacktestBridge::new(Arc::new(FakeFeed::Deals(Vec::new())));
        assert_eq!(quiet.analyze(from, to).await.unwrap(), StatisticsOutcome::NoData);

        let broken = BacktestBridge::new(Arc::new(FakeFeed::Broken));
        assert!(matches!(
            broken.analyze(from, to).await,
            Err(FeedError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_export_report_writes_document() {
        let (from, to) = window();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let bridge = BacktestBridge::new(Arc::new(FakeFeed::Deals(vec![out_deal(dec!(12.5))])));
        let document = bridge.export_report(from, to, &output).await.unwrap();
        assert_eq!(document.report().unwrap().net_profit, dec!(12.15));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["total_trades"], 1);
        assert_eq!(written["deals"][0]["type"], "SELL");
    }

    #[test]
    fn test_locate_compiled_advisor() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Scalper.mq5");

        assert_eq!(
            locate_compiled_advisor(&source),
            Err(AdvisorError::SourceNotFound)
        );

        std::fs::write(&source, "// source").unwrap();
        assert_eq!(
            locate_compiled_advisor(&source),
            Err(AdvisorError::NotCompiled)
        );

        std::fs::write(dir.path().join("Scalper.ex5"), [0u8; 4]).unwrap();
        assert_eq!(
            locate_compiled_advisor(&source),
            Ok(dir.path().join("Scalper.ex5"))
        );
    }
}
