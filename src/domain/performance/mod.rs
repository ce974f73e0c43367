// Trade statistics over terminal history
pub mod deal_statistics;
pub mod stats;
