// src/report/summary.rs
// Plain-text performance summary for the console

use std::fmt::Write;

use crate::backtest::BacktestMetrics;

const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn pct(value: f64) -> String {
    format!("{:>8.2}%", value * 100.0)
}

/// Whole-dollar amount with thousands separators: `1,234,567`
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round().abs() as u64;
    let digits = rounded.to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value.round() < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// The results block printed after a run
pub fn format_summary(symbol: &str, metrics: &BacktestMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PERFORMANCE RESULTS ({symbol})");
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Total Return:      {}", pct(metrics.total_return));
    let _ = writeln!(out, "Annualized Return: {}", pct(metrics.annualized_return));
    let _ = writeln!(out, "Volatility:        {}", pct(metrics.volatility));
    let _ = writeln!(out, "Sharpe Ratio:      {:>8.2}", metrics.sharpe_ratio);
    let _ = writeln!(out, "Sortino Ratio:     {:>8.2}", metrics.sortino_ratio);
    let _ = writeln!(out, "Max Drawdown:      {}", pct(metrics.max_drawdown));
    let _ = writeln!(out, "Calmar Ratio:      {:>8.2}", metrics.calmar_ratio);
    let _ = writeln!(out, "Trades:            {:>8}", metrics.num_trades);
    let _ = writeln!(out, "Win Rate:          {}", pct(metrics.win_rate));
    let _ = writeln!(out, "Avg Trade:         {}", pct(metrics.avg_trade));
    let _ = writeln!(out, "Final Value:       ${:>8}", format_money(metrics.final_value));
    let _ = writeln!(out, "Buy & Hold Return: {}", pct(metrics.buy_hold_return));
    out
}

/// Data range and signal counts printed before the results
pub fn format_overview(
    symbol: &str,
    bars: usize,
    range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    macd_periods: (usize, usize, usize),
    buys: usize,
    sells: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MACD Trading Strategy Backtesting: {symbol}");
    let _ = writeln!(out, "{}", rule());
    match range {
        Some((first, last)) => {
            let _ = writeln!(out, "Data: {bars} points, {first} to {last}");
        }
        None => {
            let _ = writeln!(out, "Data: {bars} points");
        }
    }
    let (fast, slow, signal) = macd_periods;
    let _ = writeln!(out, "MACD params: {fast}, {slow}, {signal}");
    let _ = writeln!(out, "Signals: {buys} buy, {sells} sell");
    out
}
