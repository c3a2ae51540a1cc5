// src/backtest/mod.rs
// Trade simulation and performance metrics

pub mod metrics;
pub mod runner;
pub mod types;

// Re-export main types and functions
pub use metrics::{calculate_max_drawdown, calculate_metrics, daily_returns, drawdown_series};
pub use runner::{run_backtest, Backtester};
pub use types::*;
