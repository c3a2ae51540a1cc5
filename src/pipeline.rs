// src/pipeline.rs
// fetch -> indicators -> signals -> simulate -> report

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::backtest::{BacktestConfig, BacktestResult, Backtester};
use crate::data::{load_file, DataFetcher, FetchRequest, PriceSeries};
use crate::error::{Error, Result};
use crate::report::{self, JsonReport, OutputPaths, SignalCounts};
use crate::strategy::{self, StrategyConfig, StrategyOutput};

/// Where the price bars come from
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    /// Chart API download, cached as CSV under the fetcher's data dir
    Remote { request: FetchRequest, refresh: bool },
    /// Local CSV or parquet file, used in full
    File { path: PathBuf, symbol: String },
}

impl PriceSource {
    pub fn symbol(&self) -> &str {
        match self {
            PriceSource::Remote { request, .. } => &request.symbol,
            PriceSource::File { symbol, .. } => symbol,
        }
    }
}

pub async fn load_prices(source: &PriceSource, fetcher: &DataFetcher) -> Result<PriceSeries> {
    let prices = match source {
        PriceSource::Remote { request, refresh } => fetcher.fetch(request, *refresh).await?,
        PriceSource::File { path, symbol } => load_file(path, symbol)?,
    };

    match (prices.first_date(), prices.last_date()) {
        (Some(first), Some(last)) => {
            info!(symbol = prices.symbol(), bars = prices.len(), %first, %last, "prices loaded");
            Ok(prices)
        }
        _ => Err(Error::NoData(source.symbol().to_string())),
    }
}

/// Indicators, signals and the simulation for one price series
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub prices: PriceSeries,
    pub strategy: StrategyOutput,
    pub backtest: BacktestResult,
}

impl Analysis {
    pub fn signal_counts(&self) -> SignalCounts {
        SignalCounts {
            buy: self.strategy.signals.buy_count(),
            sell: self.strategy.signals.sell_count(),
        }
    }
}

/// Run the strategy and the simulation over `prices`.
///
/// Pure: the same prices and settings always give the same result.
pub fn analyze(prices: PriceSeries, strategy: &StrategyConfig, backtest: &BacktestConfig) -> Result<Analysis> {
    if prices.is_empty() {
        return Err(Error::InsufficientData(format!("no price bars for {}", prices.symbol())));
    }

    let warmup = strategy.macd.slow() + strategy.macd.signal();
    if prices.len() < warmup {
        warn!(
            symbol = prices.symbol(),
            bars = prices.len(),
            warmup,
            "fewer bars than the MACD warm-up, signals will be sparse"
        );
    }

    let output = strategy::evaluate(strategy, &prices)?;
    let result = Backtester::new(*backtest)?.run(&prices, &output.signals.signal)?;

    Ok(Analysis {
        prices,
        strategy: output,
        backtest: result,
    })
}

/// Write the table, JSON report and (unless `plots` is false) the charts
pub fn write_outputs(
    analysis: &Analysis,
    strategy: &StrategyConfig,
    backtest: &BacktestConfig,
    output_dir: &Path,
    plots: bool,
) -> Result<OutputPaths> {
    let symbol = analysis.prices.symbol();
    let paths = OutputPaths::new(output_dir, symbol);

    let mut table = report::augmented_frame(&analysis.prices, &analysis.strategy, Some(&analysis.backtest))?;
    report::write_table(&mut table, &paths.table)?;
    info!(path = %paths.table.display(), "table saved");

    let json = JsonReport {
        symbol,
        strategy,
        backtest,
        signals: analysis.signal_counts(),
        metrics: &analysis.backtest.metrics,
        trades: &analysis.backtest.trades,
        round_trips: &analysis.backtest.round_trips,
        monthly_returns: &analysis.backtest.monthly,
    };
    report::write_json_report(&paths.report, &json)?;
    info!(path = %paths.report.display(), "report saved");

    if plots {
        report::plot_macd(&paths.macd_chart, &analysis.prices, &analysis.strategy)?;
        report::plot_performance(&paths.performance_chart, symbol, &analysis.backtest)?;
        report::plot_metrics(&paths.metrics_chart, symbol, &analysis.backtest.metrics)?;
        info!(dir = %output_dir.display(), "charts saved");
    }

    Ok(paths)
}

/// Compute indicators and signals only and write them to
/// `{output_dir}/{symbol}_indicators.csv`
pub fn write_indicators(prices: &PriceSeries, strategy: &StrategyConfig, output_dir: &Path) -> Result<PathBuf> {
    let output = strategy::evaluate(strategy, prices)?;
    let mut table = report::augmented_frame(prices, &output, None)?;

    let path = output_dir.join(format!("{}_indicators.csv", prices.symbol()));
    report::write_table(&mut table, &path)?;
    info!(
        path = %path.display(),
        buys = output.signals.buy_count(),
        sells = output.signals.sell_count(),
        "indicators saved"
    );
    Ok(path)
}
