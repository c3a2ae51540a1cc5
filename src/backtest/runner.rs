// src/backtest/runner.rs
// Single-position simulation over a signal series

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backtest::metrics::{calculate_metrics, calculate_monthly_returns};
use crate::backtest::types::*;
use crate::data::{PriceBar, PriceSeries};
use crate::error::{Error, Result};
use crate::strategy::Signal;

/// Position held between a buy and its sell
#[derive(Debug, Clone, Copy)]
struct OpenPosition {
    date: NaiveDate,
    price: f64,
    shares: f64,
    equity: f64,
}

/// Long-only, all-in backtester for one symbol
#[derive(Debug, Clone)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Trade `signals` against the closes of `prices`.
    ///
    /// Signals beyond the end of the slice are treated as Hold. A Buy only
    /// executes while flat, a Sell only while holding.
    pub fn run(&self, prices: &PriceSeries, signals: &[Signal]) -> Result<BacktestResult> {
        let bars = prices.bars();
        let first = bars
            .first()
            .ok_or_else(|| Error::InsufficientData(format!("no price bars for {}", prices.symbol())))?;

        let capital = self.config.initial_capital;
        let commission = self.config.commission;

        let mut cash = capital;
        let mut shares = 0.0;
        let mut position: Option<OpenPosition> = None;
        let mut peak = f64::NEG_INFINITY;
        let mut prev_value: Option<f64> = None;

        let mut days = Vec::with_capacity(bars.len());
        let mut trades = Vec::new();
        let mut round_trips = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            let signal = signals.get(i).copied().unwrap_or_default();
            let price = bar.close;
            let tradable = price.is_finite() && price > 0.0;

            match signal {
                Signal::Buy if position.is_none() && tradable => {
                    if let Some(trade) = self.buy(bar, cash) {
                        position = Some(OpenPosition {
                            date: bar.date,
                            price,
                            shares: trade.shares,
                            equity: cash,
                        });
                        cash -= trade.amount;
                        shares = trade.shares;
                        debug!(date = %bar.date, price, shares, "buy");
                        trades.push(trade);
                    }
                }
                Signal::Sell if tradable => {
                    if let Some(open) = position.take() {
                        let gross = open.shares * price;
                        let proceeds = gross * (1.0 - commission);
                        cash += proceeds;
                        shares = 0.0;
                        debug!(date = %bar.date, price, shares = open.shares, "sell");

                        trades.push(Trade {
                            date: bar.date,
                            action: TradeAction::Sell,
                            price,
                            shares: open.shares,
                            amount: proceeds,
                            commission: gross - proceeds,
                        });
                        round_trips.push(round_trip(open, bar.date, price, cash, false));
                    }
                }
                _ => {}
            }

            let value = cash + shares * price;
            if value > peak {
                peak = value;
            }
            let drawdown = if peak > 0.0 { (value - peak) / peak } else { 0.0 };
            let daily_return = prev_value.filter(|&p| p != 0.0).map(|p| value / p - 1.0);
            prev_value = Some(value);

            days.push(DayRow {
                date: bar.date,
                price,
                signal,
                shares,
                cash,
                portfolio_value: value,
                daily_return,
                drawdown,
                buy_hold_value: buy_hold(capital, first.close, price),
            });
        }

        // Mark a position still held at the end to the last close
        if let (Some(open), Some(last)) = (position, days.last()) {
            round_trips.push(round_trip(open, last.date, last.price, last.portfolio_value, true));
        }

        let values: Vec<f64> = days.iter().map(|d| d.portfolio_value).collect();
        let benchmark: Vec<f64> = days.iter().map(|d| d.buy_hold_value).collect();
        let dates = prices.dates();

        let metrics = calculate_metrics(
            &values,
            &benchmark,
            &dates,
            &round_trips,
            capital,
            self.config.risk_free_rate,
        );
        let monthly = calculate_monthly_returns(&dates, &values);

        info!(
            symbol = prices.symbol(),
            trades = trades.len(),
            final_value = metrics.final_value,
            total_return = metrics.total_return,
            "backtest complete"
        );

        Ok(BacktestResult {
            days,
            trades,
            round_trips,
            metrics,
            monthly,
        })
    }

    /// Size a buy at the bar's close; None when nothing can be bought
    fn buy(&self, bar: &PriceBar, cash: f64) -> Option<Trade> {
        let price = bar.close;
        let unit_cost = price * (1.0 + self.config.commission);

        let (shares, amount) = match self.config.sizing {
            PositionSizing::WholeShares => {
                let shares = (cash / price).floor();
                (shares, shares * unit_cost)
            }
            PositionSizing::WholeSharesNet => {
                let shares = (cash / unit_cost).floor();
                (shares, shares * unit_cost)
            }
            PositionSizing::Fractional => (cash / unit_cost, cash),
        };

        if shares <= 0.0 || !shares.is_finite() || amount > cash {
            return None;
        }

        Some(Trade {
            date: bar.date,
            action: TradeAction::Buy,
            price,
            shares,
            amount,
            commission: amount - shares * price,
        })
    }
}

fn round_trip(open: OpenPosition, exit_date: NaiveDate, exit_price: f64, exit_equity: f64, still_open: bool) -> RoundTrip {
    RoundTrip {
        entry_date: open.date,
        entry_price: open.price,
        exit_date,
        exit_price,
        shares: open.shares,
        price_return: (exit_price - open.price) / open.price,
        entry_equity: open.equity,
        exit_equity,
        equity_return: exit_equity / open.equity - 1.0,
        open: still_open,
    }
}

fn buy_hold(capital: f64, first_close: f64, close: f64) -> f64 {
    if first_close > 0.0 {
        capital * close / first_close
    } else {
        capital
    }
}

/// Run a backtest with `config`
pub fn run_backtest(prices: &PriceSeries, signals: &[Signal], config: &BacktestConfig) -> Result<BacktestResult> {
    Backtester::new(*config)?.run(prices, signals)
}
