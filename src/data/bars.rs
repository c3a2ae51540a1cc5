// src/data/bars.rs
// Daily OHLCV bars and the ordered series they live in

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// All five values present and finite
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Bars for a single symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, dropping incomplete bars, sorting by date and
    /// keeping the last bar for any repeated date.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        let mut complete: Vec<PriceBar> = bars.into_iter().filter(PriceBar::is_complete).collect();
        // Stable sort keeps input order among equal dates
        complete.sort_by_key(|b| b.date);

        let mut cleaned: Vec<PriceBar> = Vec::with_capacity(complete.len());
        for bar in complete {
            match cleaned.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => cleaned.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: cleaned,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Calendar days between the first and last bar
    pub fn calendar_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let s = PriceSeries::new("X", vec![bar(5, 3.0), bar(1, 1.0), bar(5, 4.0), bar(2, 2.0)]);
        assert_eq!(s.closes(), vec![1.0, 2.0, 4.0]);
        assert!(s.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_series_drops_incomplete_bars() {
        let mut broken = bar(3, 5.0);
        broken.volume = f64::NAN;
        let s = PriceSeries::new("X", vec![bar(1, 1.0), broken]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_calendar_days() {
        let s = PriceSeries::new("X", vec![bar(1, 1.0), bar(11, 1.0)]);
        assert_eq!(s.calendar_days(), 10);
        assert_eq!(PriceSeries::new("X", vec![]).calendar_days(), 0);
    }
}
