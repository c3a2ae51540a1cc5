// src/strategy/mod.rs
// Signal generation: MACD crossovers with optional stochastic confirmation

pub mod macd;
pub mod signals;
pub mod stochastic;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::PriceSeries;
use crate::error::Result;
use crate::momentum::MacdSeries;
use crate::oscillators::StochasticSeries;

pub use macd::{MacdParams, MacdSignals, MacdStrategy};
pub use signals::Signal;
pub use stochastic::{confirm_signals, StochasticParams};

/// Everything that decides which signals a price series produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub macd: MacdParams,
    /// When set, MACD signals must be confirmed by the stochastic oscillator
    pub stochastic: Option<StochasticParams>,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        // Deserialized params skip the constructor checks
        let m = &self.macd;
        MacdParams::new(m.fast(), m.slow(), m.signal(), m.ema_mode())?;
        if let Some(stoch) = &self.stochastic {
            stoch.validate()?;
        }
        Ok(())
    }
}

/// Per-bar signals from every rule, plus the one that is traded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFrame {
    pub macd: MacdSignals,
    pub stochastic: Option<Vec<Signal>>,
    /// The signal the backtest trades on
    pub signal: Vec<Signal>,
}

impl SignalFrame {
    pub fn buy_count(&self) -> usize {
        signals::count(&self.signal, Signal::Buy)
    }

    pub fn sell_count(&self) -> usize {
        signals::count(&self.signal, Signal::Sell)
    }
}

/// Indicator columns and signals for one price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyOutput {
    pub macd: MacdSeries,
    pub stochastic: Option<StochasticSeries>,
    pub signals: SignalFrame,
}

/// Compute indicators and signals for `prices`
pub fn evaluate(config: &StrategyConfig, prices: &PriceSeries) -> Result<StrategyOutput> {
    config.validate()?;

    let strategy = MacdStrategy::new(config.macd);
    let closes = prices.closes();
    let macd = strategy.calculate_macd(&closes);
    let macd_signals = strategy.generate_signals(&macd);

    let (stochastic, stochastic_signals, signal) = match &config.stochastic {
        Some(params) => {
            let series = params.calculate(&prices.highs(), &prices.lows(), &closes);
            let stoch_signals = params.generate_signals(&series);
            let confirmed = confirm_signals(
                &macd_signals.signal,
                &stoch_signals,
                params.confirm_before,
                params.confirm_after,
            );
            (Some(series), Some(stoch_signals), confirmed)
        }
        None => (None, None, macd_signals.signal.clone()),
    };

    let frame = SignalFrame {
        macd: macd_signals,
        stochastic: stochastic_signals,
        signal,
    };
    debug!(
        symbol = prices.symbol(),
        buys = frame.buy_count(),
        sells = frame.sell_count(),
        "signals generated"
    );

    Ok(StrategyOutput {
        macd,
        stochastic,
        signals: frame,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceBar;
    use crate::moving_averages::EmaMode;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000.0,
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 / 5.0).sin() * 8.0).collect()
    }

    #[test]
    fn test_evaluate_macd_only() {
        let prices = series(&wave(120));
        let config = StrategyConfig {
            macd: MacdParams::new(10, 20, 7, EmaMode::Adjusted).unwrap(),
            stochastic: None,
        };
        let out = evaluate(&config, &prices).unwrap();
        assert_eq!(out.signals.signal, out.signals.macd.signal);
        assert!(out.stochastic.is_none());
        assert!(out.signals.buy_count() > 0);
        assert!(out.signals.sell_count() > 0);
    }

    #[test]
    fn test_evaluate_with_confirmation_is_subset() {
        let prices = series(&wave(200));
        let config = StrategyConfig {
            macd: MacdParams::new(10, 20, 7, EmaMode::Adjusted).unwrap(),
            stochastic: Some(StochasticParams::default()),
        };
        let out = evaluate(&config, &prices).unwrap();
        for (confirmed, raw) in out.signals.signal.iter().zip(&out.signals.macd.signal) {
            if *confirmed != Signal::Hold {
                assert_eq!(confirmed, raw);
            }
        }
        assert_eq!(out.stochastic.unwrap().k_percent.len(), 200);
    }

    #[test]
    fn test_evaluate_rejects_bad_stochastic() {
        let config = StrategyConfig {
            macd: MacdParams::default(),
            stochastic: Some(StochasticParams { d_period: 0, ..Default::default() }),
        };
        assert!(evaluate(&config, &series(&wave(30))).is_err());
    }
}
