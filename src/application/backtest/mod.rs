// Trade statistics over terminal history and report export
pub mod bridge;
pub mod document;

pub use bridge::{BacktestBridge, locate_compiled_advisor};
pub use document::ReportDocument;
