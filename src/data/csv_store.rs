// src/data/csv_store.rs
// CSV price files: the fetch cache and user-supplied OHLCV exports

use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

use crate::data::bars::{PriceBar, PriceSeries};
use crate::error::{Error, Result};

/// Column headers written to the cache, in order
pub const CSV_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Write `series` as `Date,Open,High,Low,Close,Volume`
pub fn write_csv(series: &PriceSeries, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let dates: Vec<String> = series
        .dates()
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    let mut df = df!(
        CSV_COLUMNS[0] => dates,
        CSV_COLUMNS[1] => series.opens(),
        CSV_COLUMNS[2] => series.highs(),
        CSV_COLUMNS[3] => series.lows(),
        CSV_COLUMNS[4] => series.closes(),
        CSV_COLUMNS[5] => series.volumes()
    )?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

/// Read an OHLCV CSV file.
///
/// Column names match case-insensitively and extra columns are ignored.
/// Rows with an empty cell are dropped; a cell that is present but not a
/// number (or not a date) is an error.
pub fn read_csv(path: &Path, symbol: &str) -> Result<PriceSeries> {
    // Everything is read as text and cast per column, so a type guessed from
    // the leading rows cannot reject later ones
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let dates = date_column(&df, path)?;
    let opens = numeric_column(&df, "Open", path)?;
    let highs = numeric_column(&df, "High", path)?;
    let lows = numeric_column(&df, "Low", path)?;
    let closes = numeric_column(&df, "Close", path)?;
    let volumes = numeric_column(&df, "Volume", path)?;

    let mut bars = Vec::with_capacity(df.height());
    let mut dropped = 0usize;
    for i in 0..df.height() {
        match (dates[i], opens[i], highs[i], lows[i], closes[i], volumes[i]) {
            (Some(date), Some(open), Some(high), Some(low), Some(close), Some(volume)) => {
                bars.push(PriceBar { date, open, high, low, close, volume })
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(path = %path.display(), dropped, "dropped rows with missing values");
    }

    Ok(PriceSeries::new(symbol, bars))
}

fn find_column<'a>(df: &'a DataFrame, names: &[&str], path: &Path) -> Result<&'a Column> {
    let actual = df
        .get_column_names()
        .into_iter()
        .find(|c| names.iter().any(|n| c.as_str().eq_ignore_ascii_case(n)))
        .map(|c| c.to_string())
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: names[0].to_string(),
        })?;
    Ok(df.column(&actual)?)
}

fn numeric_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<f64>>> {
    let original = find_column(df, &[name], path)?.as_materialized_series();
    let casted = original.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        if value.is_none() && !matches!(original.get(i)?, AnyValue::Null) {
            return Err(Error::MalformedRow {
                path: path.to_path_buf(),
                row: i + 1,
                message: format!("{name} is not a number: {}", original.get(i)?),
            });
        }
        out.push(value.filter(|v| v.is_finite()));
    }
    Ok(out)
}

fn date_column(df: &DataFrame, path: &Path) -> Result<Vec<Option<NaiveDate>>> {
    let casted = find_column(df, &["Date", "Datetime"], path)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = casted.str()?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            None => Ok(None),
            Some(raw) => parse_date(raw).map(Some).ok_or_else(|| Error::MalformedRow {
                path: path.to_path_buf(),
                row: i + 1,
                message: format!("unparseable date: {raw}"),
            }),
        })
        .collect()
}

/// `YYYY-MM-DD`, optionally followed by a time and offset
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2022, 1, 3);
        assert_eq!(parse_date("2022-01-03"), expected);
        assert_eq!(parse_date("2022-01-03 00:00:00-05:00"), expected);
        assert_eq!(parse_date(" 2022-01-03 "), expected);
        assert_eq!(parse_date("03/01/2022"), None);
    }

    #[test]
    fn test_read_ignores_extra_columns_and_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume,Dividends\n\
             2024-01-03,10,11,9,10.5,100,0\n\
             2024-01-02,9,10,8,9.5,200,0\n",
        )
        .unwrap();

        let s = read_csv(&path, "ABC").unwrap();
        assert_eq!(s.symbol(), "ABC");
        assert_eq!(s.closes(), vec![9.5, 10.5]);
        assert_eq!(s.volumes(), vec![200.0, 100.0]);
    }

    #[test]
    fn test_read_drops_rows_with_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        fs::write(
            &path,
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02,9,10,8,9.5,200\n\
             2024-01-03,10,11,9,,100\n\
             2024-01-04,10,11,9,10.2,100\n",
        )
        .unwrap();

        let s = read_csv(&path, "ABC").unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_read_rejects_malformed_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02,9,10,8,9.5,200\n\
             2024-01-03,10,11,9,oops,100\n",
        )
        .unwrap();

        match read_csv(&path, "ABC") {
            Err(Error::MalformedRow { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_read_integer_prices_followed_by_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late_decimals.csv");
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut text = String::from("Date,Open,High,Low,Close,Volume\n");
        for i in 0..150u64 {
            let close = if i < 120 { "100" } else { "100.5" };
            let date = start + chrono::Days::new(i);
            text.push_str(&format!("{date},100,101,99,{close},1000\n"));
        }
        fs::write(&path, text).unwrap();

        let s = read_csv(&path, "ABC").unwrap();
        assert_eq!(s.len(), 150);
        assert_eq!(s.closes()[119], 100.0);
        assert_eq!(s.closes()[149], 100.5);
    }

    #[test]
    fn test_read_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "Date,Open,High,Low,Volume\n2024-01-02,9,10,8,200\n").unwrap();

        assert!(matches!(
            read_csv(&path, "ABC"),
            Err(Error::MissingColumn { column, .. }) if column == "Close"
        ));
    }
}
