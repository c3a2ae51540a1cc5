//! Moving Average Indicators
//!
//! This module provides the averages the MACD and stochastic indicators
//! are built from:
//! - SMA: Simple Moving Average
//! - EMA: Exponential Moving Average seeded from an SMA
//! - EWM: Exponentially weighted mean with adjusted weights, defined from
//!   the first bar

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{has_enough_data, nan_vec};

/// How exponential averages are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaMode {
    /// Adjusted exponential weighting from the first bar (see [`ewm_mean`])
    #[default]
    Adjusted,
    /// Seeded from the SMA of the first `period` values (see [`ema`])
    SmaSeeded,
}

impl EmaMode {
    /// Apply this flavour of EMA to `values`
    pub fn apply(self, values: &[f64], period: usize) -> Vec<f64> {
        match self {
            EmaMode::Adjusted => ewm_mean(values, period),
            EmaMode::SmaSeeded => ema(values, period),
        }
    }
}

impl fmt::Display for EmaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmaMode::Adjusted => write!(f, "adjusted"),
            EmaMode::SmaSeeded => write!(f, "sma-seeded"),
        }
    }
}

impl FromStr for EmaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adjusted" | "ewm" => Ok(EmaMode::Adjusted),
            "sma-seeded" | "sma_seeded" | "seeded" => Ok(EmaMode::SmaSeeded),
            other => Err(format!("unknown EMA mode: {other} (expected adjusted or sma-seeded)")),
        }
    }
}

/// Simple Moving Average (SMA)
///
/// The arithmetic mean of the last `period` values. Any NaN inside the
/// window makes that output NaN.
///
/// # Example
/// ```
/// use macd_backtest::sma;
/// let prices = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let result = sma(&prices, 3);
/// assert_eq!(result[2], 4.0);  // (2+4+6)/3
/// assert_eq!(result[4], 8.0);  // (6+8+10)/3
/// ```
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    crate::common::rolling(values, period, crate::common::mean)
}

/// Exponential Moving Average (EMA)
///
/// Gives more weight to recent prices using exponential decay.
///
/// # Formula
/// Multiplier = 2 / (period + 1)
/// EMA = (Price - Previous EMA) × Multiplier + Previous EMA
///
/// # Returns
/// Vector of same length as input, NaN until the first `period` valid values
/// have been seen. The first EMA is the SMA of those values.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);
    let multiplier = 2.0 / (period as f64 + 1.0);

    // Find the first valid (non-NaN) starting point
    let mut first_valid = 0;
    while first_valid < n && values[first_valid].is_nan() {
        first_valid += 1;
    }

    if first_valid + period > n {
        return result;
    }

    let first_sma: f64 = values[first_valid..(first_valid + period)].iter().sum::<f64>() / period as f64;
    let start_idx = first_valid + period - 1;
    result[start_idx] = first_sma;

    for i in (start_idx + 1)..n {
        if values[i].is_nan() {
            continue;
        }
        if result[i - 1].is_nan() {
            result[i] = values[i]; // Re-seed if previous result was NaN
        } else {
            result[i] = (values[i] - result[i - 1]) * multiplier + result[i - 1];
        }
    }

    result
}

/// Exponentially weighted mean with adjusted weights
///
/// # Formula
/// α = 2 / (span + 1)
/// EWM_t = Σ (1-α)^i × x_(t-i) / Σ (1-α)^i
///
/// Defined from the very first bar, so there is no warm-up. A NaN input
/// repeats the previous output while the older weights keep decaying.
///
/// # Example
/// ```
/// use macd_backtest::ewm_mean;
/// let result = ewm_mean(&[1.0, 2.0, 3.0], 3);
/// assert_eq!(result[0], 1.0);
/// assert!((result[1] - 2.5 / 1.5).abs() < 1e-12);
/// ```
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    if span == 0 {
        return nan_vec(n);
    }

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut result = nan_vec(n);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut last = f64::NAN;

    for (i, &x) in values.iter().enumerate() {
        numerator *= decay;
        denominator *= decay;
        if !x.is_nan() {
            numerator += x;
            denominator += 1.0;
            last = numerator / denominator;
        }
        result[i] = last;
    }

    result
}
