pub mod history_file;
pub mod mock;
pub mod observability;
pub mod relay;
pub mod report_export;

pub use history_file::CsvHistoryFeed;
pub use mock::MockTerminal;
pub use report_export::ReportExporter;
