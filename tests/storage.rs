//! CSV cache and local file loading

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use macd_backtest::data::{load_file, read_csv, write_csv};
use macd_backtest::{PriceBar, PriceSeries};

fn bar_strategy() -> impl Strategy<Value = (u64, [f64; 5])> {
    (0u64..3_000, prop::array::uniform5(0.01f64..10_000.0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_cache_round_trip(raw in prop::collection::vec(bar_strategy(), 1..60)) {
        let base = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let bars: Vec<PriceBar> = raw
            .into_iter()
            .map(|(day, [open, high, low, close, volume])| PriceBar {
                date: base + Days::new(day),
                open,
                high,
                low,
                close,
                volume: volume.round(),
            })
            .collect();
        let series = PriceSeries::new("RT", bars);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RT.csv");
        write_csv(&series, &path).unwrap();

        prop_assert_eq!(read_csv(&path, "RT").unwrap(), series);
    }
}

#[test]
fn test_load_file_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.CSV");
    std::fs::write(
        &path,
        "Datetime,Open,High,Low,Close,Volume\n\
         2024-02-01 00:00:00-05:00,1,2,0.5,1.5,100\n\
         2024-02-02 00:00:00-05:00,1.5,2.5,1,2,200\n",
    )
    .unwrap();

    let series = load_file(&path, "X").unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 2, 1));
}

#[test]
fn test_load_file_empty_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "Date,Open,High,Low,Close,Volume\n2024-02-01,,,,,\n").unwrap();

    assert!(load_file(&path, "X").is_err());
}

#[test]
fn test_load_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_file(&dir.path().join("missing.parquet"), "X").is_err());
}

#[test]
fn test_series_dates_strictly_increase_after_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dupes.csv");
    std::fs::write(
        &path,
        "Date,Open,High,Low,Close,Volume\n\
         2024-02-02,1,1,1,2,1\n\
         2024-02-01,1,1,1,1,1\n\
         2024-02-02,1,1,1,3,1\n",
    )
    .unwrap();

    let series = read_csv(&path, "D").unwrap();
    assert_eq!(series.closes(), vec![1.0, 3.0]);
    let dates = series.dates();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_load_file_with_late_decimal_prices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.csv");
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut text = String::from("Date,Open,High,Low,Close,Volume\n");
    for i in 0..300u64 {
        let price = if i < 250 { "42".to_string() } else { format!("{}.25", 40 + i % 5) };
        text.push_str(&format!("{},{price},{price},{price},{price},500\n", start + Days::new(i)));
    }
    std::fs::write(&path, text).unwrap();

    let series = load_file(&path, "LATE").unwrap();
    assert_eq!(series.len(), 300);
    assert_eq!(series.closes()[299], 44.25);
}
