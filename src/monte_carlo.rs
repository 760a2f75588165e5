// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Monte Carlo Aggregation

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationParams};
use crate::simulation::simulate_one;
use crate::types::{AggregateStep, MetricStats, SimulationOutput, WeeklyResult};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Batch-level failure: either the configuration was rejected at the
/// boundary, or the caller cancelled between trajectories.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("simulation batch cancelled")]
    Cancelled,
}

// ─── Batch execution ─────────────────────────────────────────────────────────

/// Run N independent trajectories (seed = base + i) and reduce them into
/// per-week cross-run statistics. Trajectories share no mutable state and
/// are dispatched across the rayon pool; results are collected in seed
/// order, so output is independent of scheduling.
pub fn run_simulation(params: &SimulationParams) -> Result<SimulationOutput, EngineError> {
    params.validate()?;
    info!(
        n_sims = params.n_sims,
        weeks = params.t_weeks,
        scenario = ?params.scenario,
        seed = params.seed,
        "monte carlo batch start"
    );

    let trajectories: Vec<Vec<WeeklyResult>> = (0..params.n_sims)
        .into_par_iter()
        .map(|i| simulate_one(params, params.seed.wrapping_add(i as u64)))
        .collect();

    let aggregate = aggregate(&trajectories, params.t_weeks);
    debug!(trajectories = trajectories.len(), "monte carlo batch complete");
    Ok(SimulationOutput { trajectories, aggregate })
}

/// As `run_simulation`, but checks `cancel` between trajectories (never
/// mid-trajectory, so any trajectory that did complete stays deterministic).
/// A set flag surfaces as `EngineError::Cancelled`.
pub fn run_with_cancel(
    params: &SimulationParams,
    cancel: &AtomicBool,
) -> Result<SimulationOutput, EngineError> {
    params.validate()?;

    let partial: Vec<Option<Vec<WeeklyResult>>> = (0..params.n_sims)
        .into_par_iter()
        .map(|i| {
            if cancel.load(Ordering::Relaxed) {
                None
            } else {
                Some(simulate_one(params, params.seed.wrapping_add(i as u64)))
            }
        })
        .collect();

    if partial.iter().any(Option::is_none) {
        info!("monte carlo batch cancelled");
        return Err(EngineError::Cancelled);
    }

    let trajectories: Vec<Vec<WeeklyResult>> = partial.into_iter().flatten().collect();
    let aggregate = aggregate(&trajectories, params.t_weeks);
    Ok(SimulationOutput { trajectories, aggregate })
}

// ─── Reduction ───────────────────────────────────────────────────────────────

/// Per-week, per-metric stats across all trajectories. Non-finite samples
/// are dropped rather than poisoning the aggregate.
fn aggregate(trajectories: &[Vec<WeeklyResult>], t_weeks: u32) -> Vec<AggregateStep> {
    (0..t_weeks)
        .map(|t| {
            let collect = |f: &dyn Fn(&WeeklyResult) -> f64| -> MetricStats {
                let samples: Vec<f64> = trajectories
                    .iter()
                    .filter_map(|tr| tr.get(t as usize))
                    .map(f)
                    .filter(|v| v.is_finite())
                    .collect();
                MetricStats::from_samples(&samples)
            };

            AggregateStep {
                t,
                price: collect(&|w| w.price),
                supply: collect(&|w| w.supply),
                demand: collect(&|w| w.demand),
                demand_served: collect(&|w| w.demand_served),
                providers: collect(&|w| w.providers as f64),
                capacity: collect(&|w| w.capacity),
                service_price: collect(&|w| w.service_price),
                minted: collect(&|w| w.minted),
                burned: collect(&|w| w.burned),
                utilisation: collect(&|w| w.utilisation),
                profit: collect(&|w| w.profit),
                scarcity: collect(&|w| w.scarcity),
                incentive: collect(&|w| w.incentive),
                buy_pressure: collect(&|w| w.buy_pressure),
                sell_pressure: collect(&|w| w.sell_pressure),
                net_flow: collect(&|w| w.net_flow),
                churn_count: collect(&|w| w.churn_count as f64),
                join_count: collect(&|w| w.join_count as f64),
                solvency_ratio: collect(&|w| w.solvency_ratio),
                net_daily_loss: collect(&|w| w.net_daily_loss),
                daily_mint_usd: collect(&|w| w.daily_mint_usd),
                daily_burn_usd: collect(&|w| w.daily_burn_usd),
                urban_count: collect(&|w| w.urban_count as f64),
                rural_count: collect(&|w| w.rural_count as f64),
                weighted_coverage: collect(&|w| w.weighted_coverage),
            }
        })
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
