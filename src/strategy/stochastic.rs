//! Stochastic oscillator signals and MACD confirmation

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oscillators::{stochastic, StochasticSeries};
use crate::strategy::signals::{detect_crossovers, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticParams {
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    /// Bars before a MACD signal searched for confirmation
    pub confirm_before: usize,
    /// Bars after a MACD signal searched for confirmation
    pub confirm_after: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            oversold: 20.0,
            overbought: 80.0,
            confirm_before: 3,
            confirm_after: 3,
        }
    }
}

impl StochasticParams {
    pub fn validate(&self) -> Result<()> {
        if self.k_period == 0 || self.d_period == 0 {
            return Err(Error::invalid(format!(
                "stochastic periods must be positive (k={}, d={})",
                self.k_period, self.d_period
            )));
        }
        if !(0.0..=100.0).contains(&self.oversold)
            || !(0.0..=100.0).contains(&self.overbought)
            || self.oversold >= self.overbought
        {
            return Err(Error::invalid(format!(
                "need 0 <= oversold ({}) < overbought ({}) <= 100",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }

    pub fn calculate(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> StochasticSeries {
        stochastic(highs, lows, closes, self.k_period, self.d_period)
    }

    /// Buy on a bullish %K/%D crossover while oversold, sell on a bearish
    /// crossover while overbought.
    pub fn generate_signals(&self, data: &StochasticSeries) -> Vec<Signal> {
        detect_crossovers(&data.k_percent, &data.d_percent)
            .into_iter()
            .zip(data.k_percent.iter())
            .map(|(cross, &k)| match cross {
                Signal::Buy if k < self.oversold => Signal::Buy,
                Signal::Sell if k > self.overbought => Signal::Sell,
                _ => Signal::Hold,
            })
            .collect()
    }
}

/// Keep only the MACD signals that the stochastic signals agree with.
///
/// A buy at bar `i` survives when the stochastic values summed over
/// `[i - before, i + after]` are positive, a sell when they are negative.
/// The window reaches `after` bars into the future.
pub fn confirm_signals(macd: &[Signal], stochastic: &[Signal], before: usize, after: usize) -> Vec<Signal> {
    let n = macd.len().min(stochastic.len());
    let mut result = vec![Signal::Hold; macd.len()];

    for i in 0..n {
        if macd[i] == Signal::Hold {
            continue;
        }
        let start = i.saturating_sub(before);
        let end = (i + after + 1).min(n);
        let votes: i64 = stochastic[start..end].iter().map(|s| s.value() as i64).sum();

        result[i] = match macd[i] {
            Signal::Buy if votes > 0 => Signal::Buy,
            Signal::Sell if votes < 0 => Signal::Sell,
            _ => Signal::Hold,
        };
    }

    result
}
