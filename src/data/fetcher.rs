//! Historical price fetching
//!
//! Daily bars come from the Yahoo Finance chart API and are cached as CSV
//! files so repeated runs over the same window work offline.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::bars::{PriceBar, PriceSeries};
use crate::data::csv_store::{read_csv, write_csv};
use crate::error::{Error, Result};

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// What to download: `[start, end)` at `interval`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: String,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate, interval: impl Into<String>) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(Error::invalid("symbol must not be empty"));
        }
        if start >= end {
            return Err(Error::invalid(format!("start date {start} must be before end date {end}")));
        }
        Ok(Self {
            symbol,
            start,
            end,
            interval: interval.into(),
        })
    }

    /// `{symbol}_{start}_{end}_{interval}.csv`
    pub fn cache_file_name(&self) -> String {
        format!("{}_{}_{}_{}.csv", self.symbol, self.start, self.end, self.interval)
    }
}

// Yahoo Finance chart response
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// HTTP client for the chart endpoint
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_client(YAHOO_CHART_URL, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Download and clean the bars for `request`
    pub async fn fetch_bars(&self, request: &FetchRequest) -> Result<PriceSeries> {
        let url = format!("{}/{}", self.base_url, request.symbol);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", day_start_timestamp(request.start).to_string()),
                ("period2", day_start_timestamp(request.end).to_string()),
                ("interval", request.interval.clone()),
                ("events", "history".to_string()),
            ])
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<ChartResponse> = serde_json::from_str(&body).ok();

        if let Some(error) = parsed.as_ref().and_then(|r| r.chart.error.as_ref()) {
            return Err(Error::Fetch {
                symbol: request.symbol.clone(),
                message: format!("{} - {}", error.code, error.description),
            });
        }
        if !status.is_success() {
            return Err(Error::Fetch {
                symbol: request.symbol.clone(),
                message: format!("HTTP {status}"),
            });
        }

        let response = match parsed {
            Some(r) => r,
            None => serde_json::from_str::<ChartResponse>(&body)?,
        };

        let data = response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| Error::NoData(request.symbol.clone()))?;

        let series = PriceSeries::new(request.symbol.clone(), chart_bars(data));
        if series.is_empty() {
            return Err(Error::NoData(request.symbol.clone()));
        }
        Ok(series)
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0)
}

/// Zip the parallel quote arrays into bars, skipping incomplete rows
fn chart_bars(data: ChartData) -> Vec<PriceBar> {
    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PriceBar {
                date,
                open: value_at(&quote.open, i)?,
                high: value_at(&quote.high, i)?,
                low: value_at(&quote.low, i)?,
                close: value_at(&quote.close, i)?,
                volume: value_at(&quote.volume, i)?,
            })
        })
        .collect()
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Fetches bars and keeps a CSV copy per request in `data_dir`
#[derive(Debug, Clone)]
pub struct DataFetcher {
    data_dir: PathBuf,
    client: YahooClient,
}

impl DataFetcher {
    pub fn new(data_dir: impl Into<PathBuf>, client: YahooClient) -> Self {
        Self {
            data_dir: data_dir.into(),
            client,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_path(&self, request: &FetchRequest) -> PathBuf {
        self.data_dir.join(request.cache_file_name())
    }

    /// Serve from the cache when present (unless `refresh`), otherwise
    /// download and write the cache.
    pub async fn fetch(&self, request: &FetchRequest, refresh: bool) -> Result<PriceSeries> {
        let path = self.cache_path(request);

        if !refresh && path.exists() {
            let cached = read_csv(&path, &request.symbol)?;
            if !cached.is_empty() {
                info!(path = %path.display(), bars = cached.len(), "loaded cached prices");
                return Ok(cached);
            }
            warn!(path = %path.display(), "cache file is empty, fetching again");
        }

        let series = self.client.fetch_bars(request).await?;
        fs::create_dir_all(&self.data_dir)?;
        write_csv(&series, &path)?;
        info!(path = %path.display(), bars = series.len(), "data saved");
        Ok(series)
    }
}
