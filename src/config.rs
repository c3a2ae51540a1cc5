//! Command-line and environment configuration
//!
//! Every flag falls back to a `BACKTEST_*` environment variable; the binary
//! loads a `.env` file first so those can live next to the data.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::backtest::{BacktestConfig, PositionSizing};
use crate::data::FetchRequest;
use crate::error::Result;
use crate::moving_averages::EmaMode;
use crate::pipeline::PriceSource;
use crate::strategy::{MacdParams, StochasticParams, StrategyConfig};

#[derive(Debug, Parser)]
#[command(
    name = "backtest",
    version,
    about = "MACD crossover backtester with optional stochastic confirmation",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments for `run` when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,
}

impl Cli {
    /// The subcommand to execute, `run` by default
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch prices, backtest, write the table, report and charts
    Run(RunArgs),
    /// Fetch prices into the cache only
    Fetch(FetchArgs),
    /// Write indicators and signals without simulating
    Indicators(IndicatorsArgs),
}

/// Price data selection
#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Ticker symbol
    #[arg(long, env = "BACKTEST_SYMBOL", default_value = "AAPL")]
    pub symbol: String,

    /// First day to fetch (YYYY-MM-DD)
    #[arg(long, env = "BACKTEST_START_DATE", default_value = "2022-01-01")]
    pub start_date: NaiveDate,

    /// Day after the last one to fetch (YYYY-MM-DD)
    #[arg(long, env = "BACKTEST_END_DATE", default_value = "2024-01-01")]
    pub end_date: NaiveDate,

    /// Bar interval passed to the chart API
    #[arg(long, env = "BACKTEST_INTERVAL", default_value = "1d")]
    pub interval: String,

    /// Directory for the CSV price cache
    #[arg(long, env = "BACKTEST_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Read prices from this CSV file instead of fetching
    #[arg(long, env = "BACKTEST_CSV", conflicts_with = "parquet")]
    pub csv: Option<PathBuf>,

    /// Read prices from this parquet file instead of fetching
    #[arg(long, env = "BACKTEST_PARQUET")]
    pub parquet: Option<PathBuf>,

    /// Ignore the cache and download again
    #[arg(long, env = "BACKTEST_REFRESH")]
    pub refresh: bool,
}

impl DataArgs {
    pub fn fetch_request(&self) -> Result<FetchRequest> {
        FetchRequest::new(self.symbol.trim(), self.start_date, self.end_date, self.interval.clone())
    }

    pub fn price_source(&self) -> Result<PriceSource> {
        let symbol = self.symbol.trim().to_string();
        match self.csv.as_ref().or(self.parquet.as_ref()) {
            Some(path) => Ok(PriceSource::File {
                path: path.clone(),
                symbol,
            }),
            None => Ok(PriceSource::Remote {
                request: self.fetch_request()?,
                refresh: self.refresh,
            }),
        }
    }
}

/// Indicator and signal settings
#[derive(Debug, Clone, Args)]
pub struct StrategyArgs {
    /// Fast EMA period
    #[arg(long, env = "BACKTEST_FAST_PERIOD", default_value_t = 10)]
    pub fast_period: usize,

    /// Slow EMA period
    #[arg(long, env = "BACKTEST_SLOW_PERIOD", default_value_t = 20)]
    pub slow_period: usize,

    /// Signal EMA period
    #[arg(long, env = "BACKTEST_SIGNAL_PERIOD", default_value_t = 7)]
    pub signal_period: usize,

    /// EMA flavour: adjusted or sma-seeded
    #[arg(long, env = "BACKTEST_EMA_MODE", default_value_t = EmaMode::Adjusted)]
    pub ema_mode: EmaMode,

    /// Require stochastic confirmation of MACD signals
    #[arg(long, env = "BACKTEST_STOCHASTIC")]
    pub stochastic: bool,

    /// Stochastic %K lookback
    #[arg(long, env = "BACKTEST_K_PERIOD", default_value_t = 14)]
    pub k_period: usize,

    /// Stochastic %D smoothing
    #[arg(long, env = "BACKTEST_D_PERIOD", default_value_t = 3)]
    pub d_period: usize,

    /// %K level below which bullish crossovers count
    #[arg(long, env = "BACKTEST_OVERSOLD", default_value_t = 20.0)]
    pub oversold: f64,

    /// %K level above which bearish crossovers count
    #[arg(long, env = "BACKTEST_OVERBOUGHT", default_value_t = 80.0)]
    pub overbought: f64,

    /// Bars on each side of a MACD signal searched for confirmation
    #[arg(long, env = "BACKTEST_CONFIRM_WINDOW", default_value_t = 3)]
    pub confirm_window: usize,
}

impl StrategyArgs {
    pub fn strategy_config(&self) -> Result<StrategyConfig> {
        let macd = MacdParams::new(self.fast_period, self.slow_period, self.signal_period, self.ema_mode)?;
        let stochastic = self.stochastic.then(|| StochasticParams {
            k_period: self.k_period,
            d_period: self.d_period,
            oversold: self.oversold,
            overbought: self.overbought,
            confirm_before: self.confirm_window,
            confirm_after: self.confirm_window,
        });

        let config = StrategyConfig { macd, stochastic };
        config.validate()?;
        Ok(config)
    }
}

/// Account settings
#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    /// Initial capital
    #[arg(long, env = "BACKTEST_CAPITAL", default_value_t = 100_000.0)]
    pub capital: f64,

    /// Commission rate per trade side
    #[arg(long, env = "BACKTEST_COMMISSION", default_value_t = 0.001)]
    pub commission: f64,

    /// Share sizing: whole-shares, whole-shares-net or fractional
    #[arg(long, env = "BACKTEST_SIZING", default_value_t = PositionSizing::WholeShares)]
    pub sizing: PositionSizing,

    /// Shorthand for `--sizing fractional`
    #[arg(long, env = "BACKTEST_FRACTIONAL", conflicts_with = "sizing")]
    pub fractional: bool,

    /// Annual risk-free rate for the Sharpe and Sortino ratios
    #[arg(long, env = "BACKTEST_RISK_FREE_RATE", default_value_t = 0.0)]
    pub risk_free_rate: f64,
}

impl AccountArgs {
    pub fn backtest_config(&self) -> Result<BacktestConfig> {
        let config = BacktestConfig {
            initial_capital: self.capital,
            commission: self.commission,
            sizing: if self.fractional {
                PositionSizing::Fractional
            } else {
                self.sizing
            },
            risk_free_rate: self.risk_free_rate,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    #[command(flatten)]
    pub account: AccountArgs,

    /// Directory for the table, report and charts
    #[arg(long, env = "BACKTEST_OUTPUT_DIR", default_value = "./results")]
    pub output_dir: PathBuf,

    /// Skip chart rendering
    #[arg(long, env = "BACKTEST_NO_PLOTS")]
    pub no_plots: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Debug, Clone, Args)]
pub struct IndicatorsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Directory for the indicator table
    #[arg(long, env = "BACKTEST_OUTPUT_DIR", default_value = "./results")]
    pub output_dir: PathBuf,
}
