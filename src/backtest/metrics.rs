// src/backtest/metrics.rs
// Performance metrics calculation

use chrono::{Datelike, NaiveDate};

use crate::backtest::types::{BacktestMetrics, MonthlyReturn, RoundTrip};
use crate::common::{mean, pct_change, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calculate all metrics from the portfolio and buy-and-hold curves.
///
/// `values` and `buy_hold` are per-bar portfolio values aligned with
/// `dates`; only closed round trips count towards the trade statistics.
pub fn calculate_metrics(
    values: &[f64],
    buy_hold: &[f64],
    dates: &[NaiveDate],
    round_trips: &[RoundTrip],
    initial_capital: f64,
    risk_free_rate: f64,
) -> BacktestMetrics {
    if values.is_empty() {
        return BacktestMetrics::default();
    }

    let start_date = dates.first().copied();
    let end_date = dates.last().copied();
    let calendar_days = match (start_date, end_date) {
        (Some(s), Some(e)) => (e - s).num_days(),
        _ => 0,
    };

    let returns = daily_returns(values);

    // Total return
    let final_value = *values.last().unwrap_or(&initial_capital);
    let total_return = final_value / initial_capital - 1.0;

    // Annualized over calendar days
    let annualized_return = if calendar_days > 0 {
        (1.0 + total_return).powf(365.0 / calendar_days as f64) - 1.0
    } else {
        0.0
    };

    let volatility = annualized_volatility(&returns, TRADING_DAYS_PER_YEAR);
    let max_drawdown = calculate_max_drawdown(values);

    let calmar_ratio = if max_drawdown != 0.0 {
        annualized_return / max_drawdown.abs()
    } else {
        0.0
    };

    let excess = annualized_return - risk_free_rate;
    let sharpe_ratio = if volatility > 0.0 { excess / volatility } else { 0.0 };

    let downside_vol = downside_deviation(&returns, TRADING_DAYS_PER_YEAR);
    let sortino_ratio = if downside_vol > 0.0 {
        excess / downside_vol
    } else {
        0.0
    };

    // Trade statistics over closed round trips
    let closed: Vec<&RoundTrip> = round_trips.iter().filter(|rt| !rt.open).collect();
    let num_trades = closed.len();
    let (win_rate, avg_trade) = if num_trades > 0 {
        let wins = closed.iter().filter(|rt| rt.is_win()).count();
        let returns: Vec<f64> = closed.iter().map(|rt| rt.price_return).collect();
        (wins as f64 / num_trades as f64, mean(&returns))
    } else {
        (0.0, 0.0)
    };

    let buy_hold_return = match (buy_hold.first(), buy_hold.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    };

    // Best/worst day
    let best_day = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let worst_day = returns.iter().copied().fold(f64::INFINITY, f64::min);

    BacktestMetrics {
        start_date,
        end_date,
        bars: values.len(),
        calendar_days,
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown,
        calmar_ratio,
        win_rate,
        avg_trade,
        num_trades,
        final_value,
        buy_hold_return,
        best_day: if best_day.is_finite() { best_day } else { 0.0 },
        worst_day: if worst_day.is_finite() { worst_day } else { 0.0 },
    }
}

/// Bar-to-bar returns of a value curve, skipping the first bar and any
/// undefined change
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    pct_change(values).into_iter().filter(|r| r.is_finite()).collect()
}

/// Sample standard deviation scaled by `sqrt(trading_days)`
fn annualized_volatility(returns: &[f64], trading_days: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    sample_std(returns) * trading_days.sqrt()
}

/// Calculate downside deviation (for Sortino ratio)
fn downside_deviation(returns: &[f64], trading_days: f64) -> f64 {
    let sum_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r.powi(2)).sum();
    if sum_sq == 0.0 {
        return 0.0;
    }

    let downside_var = sum_sq / returns.len() as f64;
    downside_var.sqrt() * trading_days.sqrt()
}

/// Running drawdown of each value from its peak so far, never positive
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&value| {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                (value - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Calculate maximum drawdown
pub fn calculate_max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::min)
}

/// Compound daily returns into calendar months.
///
/// `values` and `dates` are aligned per bar; the first bar only seeds the
/// curve.
pub fn calculate_monthly_returns(dates: &[NaiveDate], values: &[f64]) -> Vec<MonthlyReturn> {
    let mut monthly = Vec::new();
    let mut current: Option<(i32, u32)> = None;
    let mut month_return = 1.0;

    for (i, ret) in pct_change(values).into_iter().enumerate().skip(1) {
        let Some(date) = dates.get(i) else { break };
        let key = (date.year(), date.month());

        if current != Some(key) {
            if let Some((year, month)) = current {
                monthly.push(MonthlyReturn {
                    year,
                    month,
                    value: month_return - 1.0,
                });
            }
            current = Some(key);
            month_return = 1.0;
        }

        if ret.is_finite() {
            month_return *= 1.0 + ret;
        }
    }

    // Don't forget last month
    if let Some((year, month)) = current {
        monthly.push(MonthlyReturn {
            year,
            month,
            value: month_return - 1.0,
        });
    }

    monthly
}
