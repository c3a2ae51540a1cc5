// src/backtest/types.rs
// Core types for the trade simulation and its results

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::strategy::Signal;

// ============================================================================
// Configuration
// ============================================================================

/// How many shares a buy acquires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizing {
    /// `floor(cash / price)` shares; the buy is skipped when the
    /// commission pushes the cost above the cash
    #[default]
    WholeShares,
    /// Largest whole number of shares the cash covers, commission included
    WholeSharesNet,
    /// All available cash, fractional shares allowed
    Fractional,
}

impl fmt::Display for PositionSizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSizing::WholeShares => write!(f, "whole-shares"),
            PositionSizing::WholeSharesNet => write!(f, "whole-shares-net"),
            PositionSizing::Fractional => write!(f, "fractional"),
        }
    }
}

impl FromStr for PositionSizing {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "whole-shares" | "whole" => Ok(PositionSizing::WholeShares),
            "whole-shares-net" | "net" => Ok(PositionSizing::WholeSharesNet),
            "fractional" => Ok(PositionSizing::Fractional),
            other => Err(format!(
                "unknown sizing: {other} (expected whole-shares, whole-shares-net or fractional)"
            )),
        }
    }
}

/// Account and cost settings for a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Proportional commission charged on both sides of a trade
    pub commission: f64,
    #[serde(default)]
    pub sizing: PositionSizing,
    /// Annual rate subtracted in the Sharpe and Sortino ratios
    #[serde(default)]
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            commission: 0.001,
            sizing: PositionSizing::WholeShares,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::invalid(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.commission.is_finite() || !(0.0..1.0).contains(&self.commission) {
            return Err(Error::invalid(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::invalid("risk-free rate must be finite"));
        }
        Ok(())
    }
}

// ============================================================================
// Trades
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    /// Cash paid for a buy or received for a sell, commission included
    pub amount: f64,
    pub commission: f64,
}

/// A buy and the sell that closed it.
///
/// A position still held on the last bar is reported with `open = true`,
/// marked to market at the last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTrip {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: f64,
    /// `(exit - entry) / entry` on prices, before costs
    pub price_return: f64,
    /// Portfolio value just before the buy
    pub entry_equity: f64,
    /// Portfolio value just after the sell
    pub exit_equity: f64,
    pub equity_return: f64,
    pub open: bool,
}

impl RoundTrip {
    pub fn is_win(&self) -> bool {
        self.price_return > 0.0
    }
}

// ============================================================================
// Results
// ============================================================================

/// Simulation state at the close of one bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
    pub shares: f64,
    pub cash: f64,
    pub portfolio_value: f64,
    /// None on the first bar
    pub daily_return: Option<f64>,
    /// `(value - running peak) / running peak`, never positive
    pub drawdown: f64,
    pub buy_hold_value: f64,
}

/// Monthly return
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

/// Backtest performance metrics
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BacktestMetrics {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bars: usize,
    pub calendar_days: i64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub win_rate: f64,
    pub avg_trade: f64,
    pub num_trades: usize,
    pub final_value: f64,
    pub buy_hold_return: f64,
    pub best_day: f64,
    pub worst_day: f64,
}

/// Full simulation output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub days: Vec<DayRow>,
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub metrics: BacktestMetrics,
    pub monthly: Vec<MonthlyReturn>,
}

impl BacktestResult {
    pub fn portfolio_values(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.portfolio_value).collect()
    }

    pub fn buy_hold_values(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.buy_hold_value).collect()
    }

    pub fn drawdowns(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.drawdown).collect()
    }
}
