use thiserror::Error;

/// Failures of the history feed, kept distinct from a quiet trading period
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Terminal connection is not initialized")]
    NotInitialized,

    #[error("History request failed: {reason}")]
    Transport { reason: String },

    #[error("Malformed history record in {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },
}

/// Errors related to order routing through the terminal
///
/// The display strings are what relay clients see in `error` fields.
#[derive(Debug, Error, PartialEq)]
pub enum TerminalError {
    #[error("Symbol not found")]
    SymbolNotFound { symbol: String },

    #[error("Failed to select symbol")]
    SymbolSelectFailed { symbol: String },

    #[error("Order failed: {comment}")]
    OrderRejected { retcode: u32, comment: String },

    #[error("Position not found")]
    PositionNotFound { ticket: u64 },

    #[error("Close failed: {comment}")]
    CloseRejected { retcode: u32, comment: String },

    #[error("Terminal unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors locating a compiled Expert Advisor
#[derive(Debug, Error, PartialEq)]
pub enum AdvisorError {
    #[error("MQ5 file not found")]
    SourceNotFound,

    #[error("EX5 file not found. Please compile in MetaEditor first.")]
    NotCompiled,
}
