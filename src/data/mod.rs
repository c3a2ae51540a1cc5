// src/data/mod.rs
// Price data: bar model, file formats and the HTTP fetcher

pub mod bars;
pub mod csv_store;
pub mod fetcher;
pub mod parquet_store;

use std::path::Path;

pub use bars::{PriceBar, PriceSeries};
pub use csv_store::{read_csv, write_csv};
pub use fetcher::{DataFetcher, FetchRequest, YahooClient};
pub use parquet_store::read_parquet;

use crate::error::{Error, Result};

/// Load a local price file, picking the reader from the extension
/// (`.parquet` or anything else as CSV). An empty result is an error.
pub fn load_file(path: &Path, symbol: &str) -> Result<PriceSeries> {
    let is_parquet = path
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("parquet"));

    let series = if is_parquet {
        read_parquet(path, symbol)?
    } else {
        read_csv(path, symbol)?
    };

    if series.is_empty() {
        return Err(Error::NoData(format!("{symbol} in {}", path.display())));
    }
    Ok(series)
}
