// Market data domain
pub mod market;

// Trade statistics domain
pub mod performance;

// Port interfaces
pub mod ports;

// Core trading domain
pub mod trading;

// Domain-specific error types
pub mod errors;
