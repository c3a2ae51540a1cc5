//! Momentum indicators
//!
//! MACD and the pieces it is made of.

use serde::Serialize;

use crate::common::sub;
use crate::moving_averages::EmaMode;

/// Every column of a MACD computation, aligned with the input prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd_line.is_empty()
    }
}

/// MACD - Moving Average Convergence Divergence
///
/// Formula:
/// - MACD Line = EMA(fast) - EMA(slow)
/// - Signal Line = EMA(MACD Line, signal_period)
/// - Histogram = MACD Line - Signal Line
///
/// Periods are not validated here; see
/// [`MacdParams`](crate::strategy::MacdParams) for that.
///
/// # Example
/// ```
/// use macd_backtest::{macd, EmaMode};
/// let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
/// let m = macd(&closes, 12, 26, 9, EmaMode::Adjusted);
/// assert_eq!(m.histogram.len(), 40);
/// assert!(m.macd_line[39] > 0.0);
/// ```
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize, mode: EmaMode) -> MacdSeries {
    let ema_fast = mode.apply(closes, fast);
    let ema_slow = mode.apply(closes, slow);
    let macd_line = sub(&ema_fast, &ema_slow);
    let signal_line = mode.apply(&macd_line, signal);
    let histogram = sub(&macd_line, &signal_line);

    MacdSeries {
        ema_fast,
        ema_slow,
        macd_line,
        signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::assert_same_series;
    use crate::moving_averages::{ema, ewm_mean};

    fn sample_closes() -> Vec<f64> {
        (0..60)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_macd_identities_adjusted() {
        let closes = sample_closes();
        let m = macd(&closes, 12, 26, 9, EmaMode::Adjusted);

        let fast = ewm_mean(&closes, 12);
        let slow = ewm_mean(&closes, 26);
        for i in 0..closes.len() {
            assert!((m.macd_line[i] - (fast[i] - slow[i])).abs() < 1e-12);
            assert!((m.histogram[i] - (m.macd_line[i] - m.signal_line[i])).abs() < 1e-12);
        }
        assert_same_series(&m.signal_line, &ewm_mean(&m.macd_line, 9));
    }

    #[test]
    fn test_macd_sma_seeded_warmup() {
        let closes = sample_closes();
        let m = macd(&closes, 12, 26, 9, EmaMode::SmaSeeded);

        // MACD line starts once the slow EMA is seeded
        assert!(m.macd_line[24].is_nan());
        assert!(!m.macd_line[25].is_nan());
        // Signal needs another `signal - 1` MACD values
        assert!(m.signal_line[32].is_nan());
        assert!(!m.signal_line[33].is_nan());
        assert!(m.histogram[32].is_nan());

        assert_same_series(&m.ema_fast, &ema(&closes, 12));
        assert_same_series(&m.ema_slow, &ema(&closes, 26));
    }

    #[test]
    fn test_macd_first_bar_is_zero_when_adjusted() {
        let m = macd(&[50.0, 51.0, 52.0], 2, 3, 2, EmaMode::Adjusted);
        assert_eq!(m.macd_line[0], 0.0);
        assert_eq!(m.histogram[0], 0.0);
    }

    #[test]
    fn test_macd_empty() {
        let m = macd(&[], 12, 26, 9, EmaMode::Adjusted);
        assert!(m.is_empty());
    }
}
