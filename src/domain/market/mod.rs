// Market data domain
pub mod timeframe;
