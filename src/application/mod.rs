// History analysis and report export
pub mod backtest;

// Request handling on top of the trading terminal
pub mod terminal_gateway;
