//! Oscillator Indicators
//!
//! - Stochastic: %K and %D

use serde::Serialize;

use crate::common::{has_enough_data, max, min, nan_vec};
use crate::moving_averages::sma;

/// %K and %D aligned with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StochasticSeries {
    pub k_percent: Vec<f64>,
    pub d_percent: Vec<f64>,
}

/// Stochastic %K
///
/// Shows where price closed relative to high-low range.
///
/// # Formula
/// %K = (Close - Lowest Low) / (Highest High - Lowest Low) × 100
///
/// A flat window (highest == lowest) is undefined and yields NaN.
pub fn stoch_k(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    if !has_enough_data(n, period) || highs.len() != n || lows.len() != n {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);

    for i in (period - 1)..n {
        let highest = max(&highs[(i + 1 - period)..=i]);
        let lowest = min(&lows[(i + 1 - period)..=i]);

        if highest != lowest {
            result[i] = (closes[i] - lowest) / (highest - lowest) * 100.0;
        }
    }

    result
}

/// Stochastic %D
///
/// Simple moving average of %K.
///
/// # Arguments
/// * `k_period` - Period for %K calculation
/// * `d_period` - Smoothing period for %D (typically 3)
pub fn stoch_d(highs: &[f64], lows: &[f64], closes: &[f64], k_period: usize, d_period: usize) -> Vec<f64> {
    sma(&stoch_k(highs, lows, closes, k_period), d_period)
}

/// Both stochastic lines in one pass over the bars
pub fn stochastic(highs: &[f64], lows: &[f64], closes: &[f64], k_period: usize, d_period: usize) -> StochasticSeries {
    let k_percent = stoch_k(highs, lows, closes, k_period);
    let d_percent = sma(&k_percent, d_period);
    StochasticSeries { k_percent, d_percent }
}
