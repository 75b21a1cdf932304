//! Parameter sweeps and multi-symbol batches.
//!
//! Every run is independent, so both are a parallel map over runs with
//! rayon. A failed run is kept as a failure entry and never aborts its
//! siblings. Results are returned in a deterministic order regardless of
//! scheduling.

use crate::domain::backtest::{run_pipeline, BacktestRequest, BacktestResult};
use crate::domain::error::BacktestError;
use crate::domain::metrics::PerformanceReport;
use crate::domain::ohlcv::Bar;
use crate::domain::params::ParameterSet;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named value lists whose cartesian product is swept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterGrid {
    axes: BTreeMap<String, Vec<f64>>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, name: &str, values: Vec<f64>) -> Self {
        self.add_axis(name, values);
        self
    }

    /// An empty value list is ignored.
    pub fn add_axis(&mut self, name: &str, values: Vec<f64>) {
        if values.is_empty() {
            tracing::debug!(parameter = name, "ignoring empty sweep axis");
            return;
        }
        self.axes.insert(name.to_string(), values);
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Number of combinations; an empty grid has exactly one (the base set).
    pub fn size(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    /// All combinations layered over `base`, axes in name order with the
    /// last axis varying fastest.
    pub fn combinations(&self, base: &ParameterSet) -> Vec<ParameterSet> {
        let mut out = vec![base.clone()];
        for (name, values) in &self.axes {
            out = out
                .into_iter()
                .flat_map(|set| {
                    values.iter().map(move |v| {
                        let mut next = set.clone();
                        next.insert(name, *v);
                        next
                    })
                })
                .collect();
        }
        out
    }
}

/// What a sweep ranks runs by. Higher is better for every objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Sharpe,
    FinalReturn,
    Calmar,
    AnnualReturn,
}

impl Objective {
    pub fn score(&self, report: &PerformanceReport) -> f64 {
        match self {
            Objective::Sharpe => report.sharpe,
            Objective::FinalReturn => report.final_return,
            Objective::Calmar => report.calmar,
            Objective::AnnualReturn => report.annual_return,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Objective::Sharpe => "sharpe",
            Objective::FinalReturn => "final_return",
            Objective::Calmar => "calmar",
            Objective::AnnualReturn => "annual_return",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Objective {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sharpe" => Ok(Objective::Sharpe),
            "final_return" | "return" => Ok(Objective::FinalReturn),
            "calmar" => Ok(Objective::Calmar),
            "annual_return" => Ok(Objective::AnnualReturn),
            other => Err(BacktestError::ConfigInvalid {
                section: "sweep".into(),
                key: "objective".into(),
                reason: format!("unknown objective '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedRun {
    pub rank: usize,
    pub score: f64,
    pub result: BacktestResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub parameters: ParameterSet,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub objective: Objective,
    pub runs: Vec<RankedRun>,
    pub failures: Vec<FailedRun>,
}

impl SweepReport {
    pub fn best(&self) -> Option<&RankedRun> {
        self.runs.first()
    }
}

/// Run `request` once per grid combination and rank by `objective`.
/// Ties keep grid order.
pub fn run_sweep(
    request: &BacktestRequest,
    bars: &[Bar],
    grid: &ParameterGrid,
    objective: Objective,
) -> SweepReport {
    let combinations = grid.combinations(&request.parameters);
    tracing::info!(runs = combinations.len(), objective = %objective, "starting sweep");

    let outcomes: Vec<(ParameterSet, Result<BacktestResult, BacktestError>)> = combinations
        .into_par_iter()
        .map(|parameters| {
            let run = request.clone().with_parameters(parameters.clone());
            let outcome = run_pipeline(&run, bars);
            (parameters, outcome)
        })
        .collect();

    let mut scored = Vec::new();
    let mut failures = Vec::new();
    for (parameters, outcome) in outcomes {
        match outcome {
            Ok(result) => scored.push((objective.score(&result.report), result)),
            Err(e) => {
                tracing::warn!(parameters = %parameters, error = %e, "sweep run failed");
                failures.push(FailedRun {
                    parameters,
                    error: e.to_string(),
                });
            }
        }
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    let runs = scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, result))| RankedRun {
            rank: i + 1,
            score,
            result,
        })
        .collect();

    SweepReport {
        objective,
        runs,
        failures,
    }
}

/// Run the same request against several instruments. Output order follows
/// `series`.
pub fn run_batch(
    request: &BacktestRequest,
    series: &[(String, Vec<Bar>)],
) -> Vec<(String, Result<BacktestResult, BacktestError>)> {
    tracing::info!(symbols = series.len(), "starting batch");
    series
        .par_iter()
        .map(|(symbol, bars)| {
            let mut run = request.clone();
            run.symbol = symbol.clone();
            (symbol.clone(), run_pipeline(&run, bars))
        })
        .collect()
}
