//! Performance statistics.
//!
//! Reduces an equity curve, its per-bar net returns and the trade list into
//! a [`PerformanceReport`]. Annualization uses one periods-per-year basis per
//! bar frequency for both return and volatility. Every ratio and tail
//! estimate is finite: a zero denominator or too few observations yields 0,
//! and the defaulted ratio is recorded as a `NumericDegeneracy` diagnostic.

use crate::domain::equity::{EquityPoint, TradeRecord};
use crate::domain::error::Diagnostic;
use crate::domain::frequency::BarFrequency;
use crate::domain::ohlcv::Bar;
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

const VAR_QUANTILE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub net_return: f64,
}

/// One peak-to-recovery episode. `end` is `None` if equity never got back
/// to the prior peak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownPeriod {
    pub start: NaiveDateTime,
    pub trough: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub depth: f64,
    pub duration_bars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub frequency: BarFrequency,
    pub bar_count: usize,
    pub final_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub drawdown_periods: Vec<DrawdownPeriod>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PerformanceReport {
    pub fn is_ruined(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::RuinDetected { .. }))
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    total: usize,
    won: usize,
    lost: usize,
    win_rate: f64,
    profit_factor: f64,
    avg_win: f64,
    avg_loss: f64,
    largest_win: f64,
    largest_loss: f64,
}

pub fn summarize(
    bars: &[Bar],
    equity_curve: &[EquityPoint],
    net_returns: &[f64],
    trades: &[TradeRecord],
    frequency: &BarFrequency,
) -> PerformanceReport {
    let mut diagnostics = Vec::new();
    let ppy = frequency.periods_per_year();
    let bar_count = equity_curve.len();
    let final_equity = equity_curve.last().map_or(1.0, |p| p.equity);

    let final_return = final_equity - 1.0;
    let annual_return = if bar_count == 0 {
        0.0
    } else if final_equity <= 0.0 {
        -1.0
    } else {
        let annual = final_equity.powf(ppy / bar_count as f64) - 1.0;
        finite_or_zero(annual, "annual_return", &mut diagnostics)
    };

    // index 0 carries no return by construction
    let returns = net_returns.get(1..).unwrap_or(&[]);
    let volatility = sample_std(returns) * ppy.sqrt();
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_volatility = sample_std(&downside) * ppy.sqrt();

    let max_drawdown = equity_curve
        .iter()
        .map(|p| p.drawdown)
        .fold(0.0_f64, f64::min)
        .abs();
    let drawdown_periods = drawdown_periods(equity_curve);
    let max_drawdown_duration = drawdown_periods
        .iter()
        .map(|p| p.duration_bars)
        .max()
        .unwrap_or(0);

    let sharpe = ratio(annual_return, volatility, "sharpe", &mut diagnostics);
    let sortino = ratio(annual_return, downside_volatility, "sortino", &mut diagnostics);
    let calmar = ratio(annual_return, max_drawdown, "calmar", &mut diagnostics);

    let (var_95, cvar_95) = tail_risk(returns);
    let stats = trade_stats(trades);

    PerformanceReport {
        frequency: frequency.clone(),
        bar_count,
        final_return,
        annual_return,
        volatility,
        max_drawdown,
        max_drawdown_duration,
        sharpe,
        sortino,
        calmar,
        total_trades: stats.total,
        winning_trades: stats.won,
        losing_trades: stats.lost,
        win_rate: stats.win_rate,
        profit_factor: stats.profit_factor,
        avg_win: stats.avg_win,
        avg_loss: stats.avg_loss,
        largest_win: stats.largest_win,
        largest_loss: stats.largest_loss,
        var_95,
        cvar_95,
        monthly_returns: monthly_returns(bars, net_returns),
        drawdown_periods,
        trades: trades.to_vec(),
        equity_curve: equity_curve.to_vec(),
        diagnostics,
    }
}

fn ratio(numerator: f64, denominator: f64, metric: &'static str, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if denominator > 0.0 {
        finite_or_zero(numerator / denominator, metric, diagnostics)
    } else {
        diagnostics.push(Diagnostic::NumericDegeneracy { metric });
        0.0
    }
}

fn finite_or_zero(value: f64, metric: &'static str, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if value.is_finite() {
        value
    } else {
        diagnostics.push(Diagnostic::NumericDegeneracy { metric });
        0.0
    }
}

/// Sample standard deviation; 0 with fewer than two observations.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn tail_risk(returns: &[f64]) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);
    let var = quantile(&sorted, VAR_QUANTILE);
    let tail: Vec<f64> = sorted.iter().copied().take_while(|r| *r <= var).collect();
    let cvar = if tail.is_empty() {
        0.0
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    };
    (var, cvar)
}

fn trade_stats(trades: &[TradeRecord]) -> TradeStats {
    let mut stats = TradeStats {
        total: trades.len(),
        ..TradeStats::default()
    };
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;

    for trade in trades {
        let pnl = trade.pnl;
        if pnl > 0.0 {
            stats.won += 1;
            total_wins += pnl;
            stats.largest_win = stats.largest_win.max(pnl);
        } else if pnl < 0.0 {
            stats.lost += 1;
            total_losses += pnl.abs();
            stats.largest_loss = stats.largest_loss.max(pnl.abs());
        }
    }

    if stats.total > 0 {
        stats.win_rate = stats.won as f64 / stats.total as f64;
    }
    if total_losses > 0.0 {
        stats.profit_factor = total_wins / total_losses;
    }
    if stats.won > 0 {
        stats.avg_win = total_wins / stats.won as f64;
    }
    if stats.lost > 0 {
        stats.avg_loss = total_losses / stats.lost as f64;
    }
    stats
}

fn monthly_returns(bars: &[Bar], net_returns: &[f64]) -> Vec<MonthlyReturn> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for (bar, r) in bars.iter().zip(net_returns) {
        let key = (bar.timestamp.year(), bar.timestamp.month());
        *buckets.entry(key).or_insert(0.0) += r;
    }
    buckets
        .into_iter()
        .map(|((year, month), net_return)| MonthlyReturn {
            year,
            month,
            net_return,
        })
        .collect()
}

fn drawdown_periods(equity_curve: &[EquityPoint]) -> Vec<DrawdownPeriod> {
    let mut periods = Vec::new();
    let Some(first) = equity_curve.first() else {
        return periods;
    };

    let mut peak = first.equity;
    let mut peak_idx = 0usize;
    let mut trough_idx: Option<usize> = None;

    for (i, point) in equity_curve.iter().enumerate().skip(1) {
        if point.equity >= peak {
            if let Some(t) = trough_idx.take() {
                periods.push(DrawdownPeriod {
                    start: equity_curve[peak_idx].timestamp,
                    trough: equity_curve[t].timestamp,
                    end: Some(point.timestamp),
                    depth: depth(peak, equity_curve[t].equity),
                    duration_bars: i - peak_idx,
                });
            }
            peak = point.equity;
            peak_idx = i;
        } else {
            match trough_idx {
                Some(t) if equity_curve[t].equity <= point.equity => {}
                _ => trough_idx = Some(i),
            }
        }
    }

    if let Some(t) = trough_idx {
        periods.push(DrawdownPeriod {
            start: equity_curve[peak_idx].timestamp,
            trough: equity_curve[t].timestamp,
            end: None,
            depth: depth(peak, equity_curve[t].equity),
            duration_bars: equity_curve.len() - 1 - peak_idx,
        });
    }
    periods
}

fn depth(peak: f64, trough: f64) -> f64 {
    if peak > 0.0 {
        (peak - trough) / peak
    } else {
        0.0
    }
}
