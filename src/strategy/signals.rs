//! Discrete trading signals and the crossover rules that produce them

use serde::{Serialize, Serializer};

/// A per-bar trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Numeric encoding: 1 buy, -1 sell, 0 hold
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }

    pub fn from_value(value: i64) -> Signal {
        match value.signum() {
            1 => Signal::Buy,
            -1 => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

/// Crossovers of `line` against `reference`.
///
/// Buy where `line` moves from at-or-below to above, Sell where it moves from
/// at-or-above to below. Comparisons involving NaN never fire, and bar 0 has
/// no previous bar to compare against.
pub fn detect_crossovers(line: &[f64], reference: &[f64]) -> Vec<Signal> {
    let n = line.len().min(reference.len());
    let mut result = vec![Signal::Hold; line.len()];

    for i in 1..n {
        let (cur, prev) = (line[i], line[i - 1]);
        let (ref_cur, ref_prev) = (reference[i], reference[i - 1]);

        if cur > ref_cur && prev <= ref_prev {
            result[i] = Signal::Buy;
        } else if cur < ref_cur && prev >= ref_prev {
            result[i] = Signal::Sell;
        }
    }

    result
}

/// Crossovers of `line` through zero
pub fn detect_zero_crossovers(line: &[f64]) -> Vec<Signal> {
    let zeros = vec![0.0; line.len()];
    detect_crossovers(line, &zeros)
}

/// Line crossovers take precedence; zero crossovers fill in where the
/// line crossover is Hold.
pub fn combine_signals(line_crossovers: &[Signal], zero_crossovers: &[Signal]) -> Vec<Signal> {
    line_crossovers
        .iter()
        .zip(zero_crossovers.iter())
        .map(|(&line, &zero)| if line != Signal::Hold { line } else { zero })
        .collect()
}

/// Number of bars carrying `kind`
pub fn count(signals: &[Signal], kind: Signal) -> usize {
    signals.iter().filter(|&&s| s == kind).count()
}
