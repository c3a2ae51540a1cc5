// src/data/parquet_store.rs
// Read OHLCV bars from a parquet file using Arrow

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::data::bars::{PriceBar, PriceSeries};
use crate::error::{Error, Result};

/// Load a parquet price file.
///
/// Schema: `Date` (timestamp, date or string) plus numeric `Open`, `High`,
/// `Low`, `Close`, `Volume` columns in any order and any numeric type.
/// Nulls drop the row.
pub fn read_parquet(path: &Path, symbol: &str) -> Result<PriceSeries> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut bars = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let dates = column(&batch, "Date", &DataType::Date32, path)?;
        let dates = downcast::<Date32Array>(&dates)?;
        let opens = column(&batch, "Open", &DataType::Float64, path)?;
        let highs = column(&batch, "High", &DataType::Float64, path)?;
        let lows = column(&batch, "Low", &DataType::Float64, path)?;
        let closes = column(&batch, "Close", &DataType::Float64, path)?;
        let volumes = column(&batch, "Volume", &DataType::Float64, path)?;

        let (opens, highs, lows, closes, volumes) = (
            downcast::<Float64Array>(&opens)?,
            downcast::<Float64Array>(&highs)?,
            downcast::<Float64Array>(&lows)?,
            downcast::<Float64Array>(&closes)?,
            downcast::<Float64Array>(&volumes)?,
        );

        for i in 0..batch.num_rows() {
            let date: Option<NaiveDate> = if dates.is_null(i) { None } else { dates.value_as_date(i) };
            let Some(date) = date else { continue };
            if [opens, highs, lows, closes, volumes].iter().any(|a| a.is_null(i)) {
                continue;
            }
            bars.push(PriceBar {
                date,
                open: opens.value(i),
                high: highs.value(i),
                low: lows.value(i),
                close: closes.value(i),
                volume: volumes.value(i),
            });
        }
    }

    Ok(PriceSeries::new(symbol, bars))
}

/// Find `name` (case-insensitive) and cast it to `to`
fn column(batch: &RecordBatch, name: &str, to: &DataType, path: &Path) -> Result<ArrayRef> {
    let schema = batch.schema();
    let index = schema
        .fields()
        .iter()
        .position(|f| f.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })?;
    Ok(cast(batch.column(index).as_ref(), to)?)
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::invalid("unexpected arrow array type after cast"))
}
