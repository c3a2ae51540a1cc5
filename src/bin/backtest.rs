//! MACD backtest CLI
//!
//! Usage: backtest [run|fetch|indicators] [--symbol AAPL] [--start-date ...] ...

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use macd_backtest::config::{Cli, Command, FetchArgs, IndicatorsArgs, RunArgs};
use macd_backtest::data::{DataFetcher, YahooClient};
use macd_backtest::logging::init_logging;
use macd_backtest::pipeline::{analyze, load_prices, write_indicators, write_outputs};
use macd_backtest::report::{format_overview, format_summary};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    if let Err(e) = execute(cli.into_command()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run(args).await,
        Command::Fetch(args) => fetch(args).await,
        Command::Indicators(args) => indicators(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let strategy = args.strategy.strategy_config()?;
    let account = args.account.backtest_config()?;
    let source = args.data.price_source()?;
    let fetcher = DataFetcher::new(&args.data.data_dir, YahooClient::new());

    let prices = load_prices(&source, &fetcher)
        .await
        .with_context(|| format!("loading prices for {}", source.symbol()))?;

    let analysis = analyze(prices, &strategy, &account).context("running backtest")?;
    let counts = analysis.signal_counts();
    let range = analysis.prices.first_date().zip(analysis.prices.last_date());
    let macd = &strategy.macd;

    println!(
        "{}",
        format_overview(
            analysis.prices.symbol(),
            analysis.prices.len(),
            range,
            (macd.fast(), macd.slow(), macd.signal()),
            counts.buy,
            counts.sell,
        )
    );
    println!("{}", format_summary(analysis.prices.symbol(), &analysis.backtest.metrics));

    let paths = write_outputs(&analysis, &strategy, &account, &args.output_dir, !args.no_plots)
        .with_context(|| format!("writing results to {}", args.output_dir.display()))?;
    println!("Table:  {}", paths.table.display());
    println!("Report: {}", paths.report.display());
    if !args.no_plots {
        println!("Charts: {}", args.output_dir.display());
    }
    Ok(())
}

async fn fetch(args: FetchArgs) -> Result<()> {
    let request = args.data.fetch_request()?;
    let fetcher = DataFetcher::new(&args.data.data_dir, YahooClient::new());

    let prices = fetcher
        .fetch(&request, args.data.refresh)
        .await
        .with_context(|| format!("fetching {}", request.symbol))?;

    println!(
        "{}: {} bars cached at {}",
        prices.symbol(),
        prices.len(),
        fetcher.cache_path(&request).display()
    );
    Ok(())
}

async fn indicators(args: IndicatorsArgs) -> Result<()> {
    let strategy = args.strategy.strategy_config()?;
    let source = args.data.price_source()?;
    let fetcher = DataFetcher::new(&args.data.data_dir, YahooClient::new());

    let prices = load_prices(&source, &fetcher)
        .await
        .with_context(|| format!("loading prices for {}", source.symbol()))?;

    let path = write_indicators(&prices, &strategy, &args.output_dir)?;
    println!("Indicators: {}", path.display());
    Ok(())
}
