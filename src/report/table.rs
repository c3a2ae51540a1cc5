// src/report/table.rs
// Price table augmented with indicator, signal and simulation columns

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;

use crate::backtest::BacktestResult;
use crate::data::PriceSeries;
use crate::error::{Error, Result};
use crate::strategy::{Signal, StrategyOutput};

/// NaN becomes a null cell
fn nullable(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.is_finite().then_some(*v)).collect()
}

fn signal_values(signals: &[Signal]) -> Vec<i32> {
    signals.iter().map(|s| i32::from(s.value())).collect()
}

fn float_column(name: &str, values: &[f64]) -> Column {
    Column::new(name.into(), nullable(values))
}

/// One row per bar: OHLCV, indicators, signals and, when given, the
/// simulated account state.
pub fn augmented_frame(
    prices: &PriceSeries,
    output: &StrategyOutput,
    result: Option<&BacktestResult>,
) -> Result<DataFrame> {
    let n = prices.len();
    if output.macd.len() != n || output.signals.signal.len() != n {
        return Err(Error::invalid(format!(
            "indicator length {} does not match {} price bars",
            output.macd.len(),
            n
        )));
    }

    let dates: Vec<String> = prices.dates().iter().map(|d| d.to_string()).collect();
    let mut columns = vec![
        Column::new("Date".into(), dates),
        float_column("Open", &prices.opens()),
        float_column("High", &prices.highs()),
        float_column("Low", &prices.lows()),
        float_column("Close", &prices.closes()),
        float_column("Volume", &prices.volumes()),
        float_column("ema_fast", &output.macd.ema_fast),
        float_column("ema_slow", &output.macd.ema_slow),
        float_column("macd_line", &output.macd.macd_line),
        float_column("signal_line", &output.macd.signal_line),
        float_column("histogram", &output.macd.histogram),
    ];

    if let Some(stoch) = &output.stochastic {
        columns.push(float_column("stoch_k", &stoch.k_percent));
        columns.push(float_column("stoch_d", &stoch.d_percent));
    }

    let signals = &output.signals;
    columns.push(Column::new("macd_crossover".into(), signal_values(&signals.macd.macd_crossover)));
    columns.push(Column::new("zero_crossover".into(), signal_values(&signals.macd.zero_crossover)));
    columns.push(Column::new("macd_signal".into(), signal_values(&signals.macd.signal)));
    if let Some(stoch_signals) = &signals.stochastic {
        columns.push(Column::new("stoch_signal".into(), signal_values(stoch_signals)));
    }
    columns.push(Column::new("signal".into(), signal_values(&signals.signal)));

    if let Some(result) = result {
        if result.days.len() != n {
            return Err(Error::invalid(format!(
                "simulation length {} does not match {} price bars",
                result.days.len(),
                n
            )));
        }
        let days = &result.days;
        let shares: Vec<f64> = days.iter().map(|d| d.shares).collect();
        let cash: Vec<f64> = days.iter().map(|d| d.cash).collect();
        let daily: Vec<Option<f64>> = days.iter().map(|d| d.daily_return).collect();

        columns.push(float_column("position", &shares));
        columns.push(float_column("cash", &cash));
        columns.push(float_column("portfolio_value", &result.portfolio_values()));
        columns.push(Column::new("daily_return".into(), daily));
        columns.push(float_column("drawdown", &result.drawdowns()));
        columns.push(float_column("buy_hold_value", &result.buy_hold_values()));
    }

    Ok(DataFrame::new(columns)?)
}

/// Write `df` as CSV, creating the parent directory
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{run_backtest, BacktestConfig};
    use crate::data::PriceBar;
    use crate::strategy::{evaluate, StochasticParams, StrategyConfig};
    use chrono::NaiveDate;

    fn prices(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.4).sin() * 5.0;
                PriceBar {
                    date: start + chrono::Days::new(i as u64),
                    open: c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: c,
                    volume: 1_000.0,
                }
            })
            .collect();
        PriceSeries::new("TBL", bars)
    }

    #[test]
    fn test_indicator_only_frame() {
        let p = prices(60);
        let output = evaluate(&StrategyConfig::default(), &p).unwrap();
        let df = augmented_frame(&p, &output, None).unwrap();

        assert_eq!(df.height(), 60);
        assert!(df.column("macd_line").is_ok());
        assert!(df.column("stoch_k").is_err());
        assert!(df.column("portfolio_value").is_err());
    }

    #[test]
    fn test_full_frame_with_nulls() {
        let p = prices(60);
        let config = StrategyConfig {
            stochastic: Some(StochasticParams::default()),
            ..Default::default()
        };
        let output = evaluate(&config, &p).unwrap();
        let result = run_backtest(&p, &output.signals.signal, &BacktestConfig::default()).unwrap();
        let df = augmented_frame(&p, &output, Some(&result)).unwrap();

        assert_eq!(df.height(), 60);
        // %K is undefined for the first 13 bars
        assert_eq!(df.column("stoch_k").unwrap().null_count(), 13);
        assert_eq!(df.column("daily_return").unwrap().null_count(), 1);
        assert!(df.column("stoch_signal").is_ok());
    }

    #[test]
    fn test_write_table() {
        let p = prices(40);
        let output = evaluate(&StrategyConfig::default(), &p).unwrap();
        let mut df = augmented_frame(&p, &output, None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("TBL_backtest.csv");
        write_table(&mut df, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Date,Open,High,Low,Close,Volume,ema_fast"));
        assert_eq!(text.lines().count(), 41);
    }
}
