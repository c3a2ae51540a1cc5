//! MACD crossover strategy

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::momentum::{macd, MacdSeries};
use crate::moving_averages::EmaMode;
use crate::strategy::signals::{combine_signals, detect_crossovers, detect_zero_crossovers, Signal};

/// Validated MACD periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    fast: usize,
    slow: usize,
    signal: usize,
    ema_mode: EmaMode,
}

impl MacdParams {
    /// Periods must be positive and the fast period strictly below the slow one.
    pub fn new(fast: usize, slow: usize, signal: usize, ema_mode: EmaMode) -> Result<Self> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(Error::invalid(format!(
                "MACD periods must be positive (fast={fast}, slow={slow}, signal={signal})"
            )));
        }
        if fast >= slow {
            return Err(Error::invalid(format!(
                "fast period ({fast}) must be less than slow period ({slow})"
            )));
        }
        Ok(Self { fast, slow, signal, ema_mode })
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }

    pub fn signal(&self) -> usize {
        self.signal
    }

    pub fn ema_mode(&self) -> EmaMode {
        self.ema_mode
    }
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            ema_mode: EmaMode::Adjusted,
        }
    }
}

/// MACD signals split by the rule that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSignals {
    pub macd_crossover: Vec<Signal>,
    pub zero_crossover: Vec<Signal>,
    pub signal: Vec<Signal>,
}

#[derive(Debug, Clone, Default)]
pub struct MacdStrategy {
    params: MacdParams,
}

impl MacdStrategy {
    pub fn new(params: MacdParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MacdParams {
        &self.params
    }

    pub fn calculate_macd(&self, closes: &[f64]) -> MacdSeries {
        let p = &self.params;
        macd(closes, p.fast, p.slow, p.signal, p.ema_mode)
    }

    /// MACD/signal-line crossovers, with zero-line crossovers filling the
    /// bars where the line crossover is Hold.
    pub fn generate_signals(&self, data: &MacdSeries) -> MacdSignals {
        let macd_crossover = detect_crossovers(&data.macd_line, &data.signal_line);
        let zero_crossover = detect_zero_crossovers(&data.macd_line);
        let signal = combine_signals(&macd_crossover, &zero_crossover);

        MacdSignals {
            macd_crossover,
            zero_crossover,
            signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::signals::count;

    #[test]
    fn test_params_reject_fast_not_below_slow() {
        assert!(MacdParams::new(26, 12, 9, EmaMode::Adjusted).is_err());
        assert!(MacdParams::new(12, 12, 9, EmaMode::Adjusted).is_err());
        assert!(MacdParams::new(12, 26, 9, EmaMode::Adjusted).is_ok());
    }

    #[test]
    fn test_params_reject_zero_periods() {
        assert!(matches!(
            MacdParams::new(0, 26, 9, EmaMode::Adjusted),
            Err(Error::InvalidParameter(_))
        ));
        assert!(MacdParams::new(12, 26, 0, EmaMode::SmaSeeded).is_err());
    }

    #[test]
    fn test_signals_on_v_shaped_prices() {
        // Down then up: MACD must turn from negative to positive, so at
        // least one buy signal appears after the bottom.
        let closes: Vec<f64> = (0..40)
            .map(|i| if i < 20 { 100.0 - i as f64 } else { 80.0 + (i - 20) as f64 * 1.5 })
            .collect();
        let strategy = MacdStrategy::new(MacdParams::new(5, 10, 4, EmaMode::Adjusted).unwrap());
        let m = strategy.calculate_macd(&closes);
        let s = strategy.generate_signals(&m);

        assert_eq!(s.signal.len(), closes.len());
        let first_buy = s.signal.iter().position(|&x| x == Signal::Buy).unwrap();
        assert!(first_buy >= 20);
        assert!(count(&s.zero_crossover, Signal::Buy) >= 1);
    }

    #[test]
    fn test_signal_follows_combination_rule() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 / 4.0).sin() * 3.0).collect();
        let strategy = MacdStrategy::new(MacdParams::new(4, 9, 3, EmaMode::Adjusted).unwrap());
        let s = strategy.generate_signals(&strategy.calculate_macd(&closes));

        for i in 0..closes.len() {
            let expected = if s.macd_crossover[i] != Signal::Hold {
                s.macd_crossover[i]
            } else {
                s.zero_crossover[i]
            };
            assert_eq!(s.signal[i], expected);
        }
    }
}
