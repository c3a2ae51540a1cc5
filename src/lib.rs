//! # MACD Backtest
//!
//! Single-asset backtester for a MACD crossover strategy with optional
//! stochastic confirmation.
//!
//! ## Features
//! - MACD and stochastic indicators with adjusted or SMA-seeded EMAs
//! - Crossover and zero-crossover signals, stochastic confirmation window
//! - Long-only simulation with commission and whole or fractional shares
//! - Yahoo chart API fetcher with a CSV cache, CSV and parquet loaders
//! - CSV / JSON reports and SVG charts
//!
//! ## Example
//! ```
//! use macd_backtest::{macd, sma, EmaMode};
//!
//! let prices = vec![44.0, 44.5, 45.0, 44.5, 45.5, 46.0, 45.5, 46.5];
//!
//! let sma_values = sma(&prices, 3);
//! let series = macd(&prices, 3, 6, 2, EmaMode::Adjusted);
//! assert_eq!(series.len(), prices.len());
//! assert!(sma_values[1].is_nan());
//! ```

pub mod backtest;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod momentum;
pub mod moving_averages;
pub mod oscillators;
pub mod pipeline;
pub mod report;
pub mod strategy;

// Re-export commonly used items at crate root
pub use backtest::{run_backtest, BacktestConfig, BacktestMetrics, BacktestResult, Backtester, PositionSizing};
pub use data::{DataFetcher, FetchRequest, PriceBar, PriceSeries, YahooClient};
pub use error::{Error, Result};
pub use momentum::{macd, MacdSeries};
pub use moving_averages::{ema, ewm_mean, sma, EmaMode};
pub use oscillators::{stoch_d, stoch_k, stochastic, StochasticSeries};
pub use pipeline::{analyze, Analysis, PriceSource};
pub use strategy::{MacdParams, Signal, StochasticParams, StrategyConfig};
