// src/report/mod.rs
// Run outputs: console summary, augmented CSV table, JSON report and charts

pub mod charts;
pub mod summary;
pub mod table;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::backtest::{BacktestConfig, BacktestMetrics, MonthlyReturn, RoundTrip, Trade};
use crate::error::Result;
use crate::strategy::StrategyConfig;

pub use charts::{plot_macd, plot_metrics, plot_performance};
pub use summary::{format_money, format_overview, format_summary};
pub use table::{augmented_frame, write_table};

/// File names written for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub table: PathBuf,
    pub report: PathBuf,
    pub macd_chart: PathBuf,
    pub performance_chart: PathBuf,
    pub metrics_chart: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, symbol: &str) -> Self {
        Self {
            table: output_dir.join(format!("{symbol}_backtest.csv")),
            report: output_dir.join(format!("{symbol}_report.json")),
            macd_chart: output_dir.join(format!("macd_{symbol}.svg")),
            performance_chart: output_dir.join(format!("performance_{symbol}.svg")),
            metrics_chart: output_dir.join(format!("metrics_{symbol}.svg")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
}

/// Settings and results of one run, as written to `{symbol}_report.json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub symbol: &'a str,
    pub strategy: &'a StrategyConfig,
    pub backtest: &'a BacktestConfig,
    pub signals: SignalCounts,
    pub metrics: &'a BacktestMetrics,
    pub trades: &'a [Trade],
    pub round_trips: &'a [RoundTrip],
    pub monthly_returns: &'a [MonthlyReturn],
}

/// Pretty-printed JSON; non-finite numbers are written as null
pub fn write_json_report(path: &Path, report: &JsonReport<'_>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
