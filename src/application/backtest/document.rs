use crate::domain::errors::FeedError;
use crate::domain::performance::deal_statistics::{
    NO_DEALS_MESSAGE, StatisticsOutcome, StatisticsReport,
};
use serde::Serialize;

/// Wire and file representation of an analysis.
///
/// A populated report serializes flat; anything else is `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportDocument {
    Report(Box<StatisticsReport>),
    Error { error: String },
}

impl ReportDocument {
    pub fn from_analysis(analysis: &Result<StatisticsOutcome, FeedError>) -> Self {
        match analysis {
            Ok(StatisticsOutcome::Report(report)) => ReportDocument::Report(Box::new(report.clone())),
            Ok(StatisticsOutcome::NoData) => ReportDocument::Error {
                error: NO_DEALS_MESSAGE.to_string(),
            },
            Err(e) => ReportDocument::Error {
                error: e.to_string(),
            },
        }
    }

    pub fn report(&self) -> Option<&StatisticsReport> {
        match self {
            ReportDocument::Report(report) => Some(report),
            ReportDocument::Error { .. } => None,
        }
    }
}

impl From<StatisticsOutcome> for ReportDocument {
    fn from(outcome: StatisticsOutcome) -> Self {
        match outcome {
            StatisticsOutcome::Report(report) => ReportDocument::Report(Box::new(report)),
            StatisticsOutcome::NoData => ReportDocument::Error {
                error: NO_DEALS_MESSAGE.to_string(),
            },
        }
    }
}
