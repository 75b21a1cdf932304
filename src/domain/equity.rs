//! Equity accumulation.
//!
//! Walks a position series bar by bar and compounds the net return of the
//! position entering each bar (decided one bar earlier) into a normalized
//! equity curve. Position changes pay `(commission_rate + slippage_rate)`
//! per unit of position moved, charged on the previous bar's equity.

use crate::domain::error::Diagnostic;
use crate::domain::ohlcv::Bar;
use crate::domain::position::PositionSeries;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub drawdown: f64,
}

/// Direction of the position a trade moves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Flat,
    Short,
}

impl Side {
    pub fn from_position(position: i8) -> Self {
        match position.signum() {
            1 => Side::Long,
            -1 => Side::Short,
            _ => Side::Flat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub side: Side,
    /// Signed position change, `position[i] - position[i-1]`.
    pub size: i8,
    pub price: f64,
    pub pnl: f64,
    pub cost: f64,
    pub commission: f64,
    pub slippage: f64,
}

/// Output of [`accumulate`]. All series have one entry per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulation {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub net_returns: Vec<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Accumulation {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve.last().map_or(1.0, |p| p.equity)
    }

    pub fn is_ruined(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::RuinDetected { .. }))
    }
}

pub fn accumulate(
    bars: &[Bar],
    positions: &PositionSeries,
    leverage: f64,
    commission_rate: f64,
    slippage_rate: f64,
) -> Accumulation {
    let n = bars.len().min(positions.len());
    if bars.len() != positions.len() {
        tracing::warn!(
            bars = bars.len(),
            positions = positions.len(),
            "bar and position lengths differ, truncating"
        );
    }

    let mut out = Accumulation {
        equity_curve: Vec::with_capacity(n),
        trades: Vec::new(),
        net_returns: Vec::with_capacity(n),
        diagnostics: Vec::new(),
    };
    let Some(first) = bars.first().filter(|_| n > 0) else {
        return out;
    };

    out.equity_curve.push(EquityPoint {
        timestamp: first.timestamp,
        equity: 1.0,
        drawdown: 0.0,
    });
    out.net_returns.push(0.0);

    let rate = commission_rate + slippage_rate;
    let pos = &positions.positions;
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut ruined = false;

    for i in 1..n {
        let bar = &bars[i];
        if ruined {
            out.equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: 0.0,
                drawdown: -1.0,
            });
            out.net_returns.push(0.0);
            continue;
        }

        let prev_close = bars[i - 1].close;
        let price_return = if prev_close > 0.0 {
            bar.close / prev_close - 1.0
        } else {
            0.0
        };

        let delta = pos[i] - pos[i - 1];
        let gross = f64::from(pos[i - 1]) * price_return * leverage;
        let cost = if delta != 0 {
            equity * f64::from(delta.unsigned_abs()) * rate
        } else {
            0.0
        };
        let mut net = gross - cost / equity;
        let prev_equity = equity;
        equity = prev_equity * (1.0 + net);

        if equity.is_nan() || equity <= 0.0 {
            tracing::warn!(index = i, timestamp = %bar.timestamp, "equity exhausted, holding at zero");
            ruined = true;
            equity = 0.0;
            net = -1.0;
            out.diagnostics.push(Diagnostic::RuinDetected {
                index: i,
                timestamp: bar.timestamp,
            });
        }

        if delta != 0 {
            let (commission, slippage) = if rate > 0.0 {
                (cost * commission_rate / rate, cost * slippage_rate / rate)
            } else {
                (0.0, 0.0)
            };
            out.trades.push(TradeRecord {
                index: i,
                timestamp: bar.timestamp,
                side: Side::from_position(pos[i]),
                size: delta,
                price: bar.close,
                pnl: net * prev_equity,
                cost,
                commission,
                slippage,
            });
        }

        peak = peak.max(equity);
        let drawdown = if peak > 0.0 { (equity - peak) / peak } else { 0.0 };
        out.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
            drawdown,
        });
        out.net_returns.push(net);
    }

    out
}
