//! Position resolution: raw signal → held position.
//!
//! The raw signal is forward-filled (starting flat) and then delayed by one
//! bar, so a decision made on bar `t`'s close is first held on bar `t+1`.
//! A repeated signal value fills to the same position and so never shows up
//! as a second transition.

use crate::domain::strategy::{Signal, SignalSeries};

/// Held exposure per bar in `{-1, 0, 1}`. `positions[0]` is always 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSeries {
    pub positions: Vec<i8>,
}

impl PositionSeries {
    pub fn flat(len: usize) -> Self {
        Self {
            positions: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Indices `i > 0` where `positions[i] != positions[i - 1]`.
    pub fn transitions(&self) -> Vec<usize> {
        self.positions
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] != w[1])
            .map(|(i, _)| i + 1)
            .collect()
    }
}

/// Forward-fill `signals` and delay by exactly one bar.
pub fn resolve(signals: &SignalSeries) -> PositionSeries {
    resolve_signals(&signals.signals)
}

pub fn resolve_signals(signals: &[Option<Signal>]) -> PositionSeries {
    let mut positions = Vec::with_capacity(signals.len());
    let mut last = 0i8;
    for signal in signals {
        positions.push(last);
        if let Some(s) = signal {
            last = s.value();
        }
    }
    PositionSeries { positions }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Option<Signal> = Some(Signal::Long);
    const F: Option<Signal> = Some(Signal::Flat);
    const S: Option<Signal> = Some(Signal::Short);

    #[test]
    fn first_position_is_flat() {
        let p = resolve_signals(&[L, L, L]);
        assert_eq!(p.positions[0], 0);
    }

    #[test]
    fn delays_by_one_bar() {
        let p = resolve_signals(&[None, L, None, F, S, None]);
        assert_eq!(p.positions, vec![0, 0, 1, 1, 0, -1]);
    }

    #[test]
    fn repeated_signals_make_one_transition() {
        let p = resolve_signals(&[None, L, L, L, F, F]);
        assert_eq!(p.positions, vec![0, 0, 1, 1, 1, 0]);
        assert_eq!(p.transitions(), vec![2, 5]);
    }

    #[test]
    fn empty_input() {
        let p = resolve_signals(&[]);
        assert!(p.is_empty());
        assert!(p.transitions().is_empty());
    }

    #[test]
    fn all_unset_stays_flat() {
        let p = resolve_signals(&[None; 5]);
        assert_eq!(p, PositionSeries::flat(5));
    }

    #[test]
    fn last_signal_is_never_held() {
        let p = resolve_signals(&[None, None, S]);
        assert_eq!(p.positions, vec![0, 0, 0]);
    }
}
