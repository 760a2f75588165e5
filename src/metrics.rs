// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Derived Metrics

use serde::{Deserialize, Serialize};

use crate::config::SimulationParams;
use crate::types::AggregateStep;

/// Weeks per year for annualisation.
const WEEKS_PER_YEAR: f64 = 52.0;

// ─── Risk metrics ────────────────────────────────────────────────────────────

/// Maximum peak-to-trough decline of the mean price path, as a percentage.
pub fn max_drawdown(steps: &[AggregateStep]) -> f64 {
    let mut peak = match steps.first() {
        Some(s) => s.price.mean,
        None => return 0.0,
    };
    let mut max_dd = 0.0;
    for step in steps {
        if step.price.mean > peak {
            peak = step.price.mean;
        }
        if peak > 0.0 {
            let dd = (peak - step.price.mean) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd * 100.0
}

/// Annualised standard deviation of weekly log returns of the mean price
/// path, as a percentage.
pub fn price_volatility(steps: &[AggregateStep]) -> f64 {
    if steps.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = steps
        .windows(2)
        .filter(|w| w[0].price.mean > 0.0 && w[1].price.mean > 0.0)
        .map(|w| (w[1].price.mean / w[0].price.mean).ln())
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * WEEKS_PER_YEAR.sqrt() * 100.0
}

/// Annualised return over annualised volatility, zero risk-free rate.
pub fn sharpe_ratio(steps: &[AggregateStep]) -> f64 {
    if steps.len() < 2 {
        return 0.0;
    }
    let first = steps[0].price.mean;
    let last = steps[steps.len() - 1].price.mean;
    if first <= 0.0 {
        return 0.0;
    }
    let total_return = (last - first) / first;
    let annualised = total_return * (WEEKS_PER_YEAR / steps.len() as f64);
    let vol = price_volatility(steps) / 100.0;
    if vol == 0.0 {
        return 0.0;
    }
    annualised / vol
}

/// Estimated probability (percent) that the network enters a death spiral,
/// read from where the p10 price path lands relative to a critical floor
/// (default 10% of initial price).
pub fn death_spiral_probability(steps: &[AggregateStep], initial_price: f64) -> f64 {
    let last = match steps.last() {
        Some(s) => s,
        None => return 0.0,
    };
    let critical = initial_price * 0.1;
    if last.price.p10 < critical {
        let ratio = if critical > 0.0 { last.price.p10 / critical } else { 0.0 };
        return (10.0 + (1.0 - ratio) * 40.0).min(90.0);
    }
    if last.price.mean < critical * 2.0 {
        return 5.0;
    }
    0.0
}

// ─── Token metrics ───────────────────────────────────────────────────────────

/// Annualised transacted volume over average supply.
pub fn token_velocity(steps: &[AggregateStep], params: &SimulationParams) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let transacted: f64 = steps.iter().map(|s| s.buy_pressure.mean).sum();
    let avg_supply = steps
        .iter()
        .map(|s| if s.supply.mean > 0.0 { s.supply.mean } else { params.initial_supply })
        .sum::<f64>()
        / steps.len() as f64;
    if avg_supply == 0.0 {
        return 0.0;
    }
    (transacted / avg_supply) * (WEEKS_PER_YEAR / steps.len() as f64)
}

/// Annualised net supply change as a percentage.
pub fn inflation_rate(steps: &[AggregateStep]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let first = steps[0].supply.mean.max(1.0);
    let last = steps[steps.len() - 1].supply.mean.max(1.0);
    let change = (last - first) / first;
    change * (WEEKS_PER_YEAR / steps.len() as f64) * 100.0
}

/// Total minted minus burned over the horizon, in tokens.
pub fn net_emissions(steps: &[AggregateStep]) -> f64 {
    steps.iter().map(|s| s.minted.mean - s.burned.mean).sum()
}

// ─── Provider metrics ────────────────────────────────────────────────────────

/// Final provider count as a percentage of the peak.
pub fn retention_rate(steps: &[AggregateStep], initial_providers: u32) -> f64 {
    if steps.is_empty() {
        return 100.0;
    }
    let peak = steps
        .iter()
        .map(|s| s.providers.mean)
        .fold(initial_providers as f64, f64::max);
    let last = steps[steps.len() - 1].providers.mean;
    if peak == 0.0 {
        return 100.0;
    }
    last / peak * 100.0
}

// ─── Network metrics ─────────────────────────────────────────────────────────

pub fn avg_utilisation(steps: &[AggregateStep]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    steps.iter().map(|s| s.utilisation.mean).sum::<f64>() / steps.len() as f64
}

/// Share of total demand that was actually served, as a percentage.
pub fn demand_satisfaction_rate(steps: &[AggregateStep]) -> f64 {
    let total_demand: f64 = steps.iter().map(|s| s.demand.mean).sum();
    let total_served: f64 = steps.iter().map(|s| s.demand_served.mean).sum();
    if total_demand == 0.0 {
        return 100.0;
    }
    total_served / total_demand * 100.0
}

// ─── Economic metrics ────────────────────────────────────────────────────────

/// Total USD paid for service over the horizon.
pub fn network_revenue(steps: &[AggregateStep]) -> f64 {
    steps.iter().map(|s| s.demand_served.mean * s.service_price.mean).sum()
}

/// Total USD value of rewards minted to providers.
pub fn provider_revenue(steps: &[AggregateStep]) -> f64 {
    steps.iter().map(|s| s.minted.mean * s.price.mean).sum()
}

/// Total USD value destroyed by burning.
pub fn burned_value(steps: &[AggregateStep]) -> f64 {
    steps.iter().map(|s| s.burned.mean * s.price.mean).sum()
}

// ─── Roll-up ─────────────────────────────────────────────────────────────────

/// Everything the reporting layer wants in one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub max_drawdown: f64,
    pub price_volatility: f64,
    pub sharpe_ratio: f64,
    pub death_spiral_probability: f64,
    pub token_velocity: f64,
    pub inflation_rate: f64,
    pub net_emissions: f64,
    pub avg_provider_profit: f64,
    pub provider_profitability: f64,
    pub total_churn: f64,
    pub total_joins: f64,
    pub retention_rate: f64,
    pub avg_utilisation: f64,
    pub demand_satisfaction_rate: f64,
    pub total_network_revenue: f64,
    pub total_provider_revenue: f64,
    pub total_burned_value: f64,
}

pub fn derived_metrics(steps: &[AggregateStep], params: &SimulationParams) -> DerivedMetrics {
    let avg_provider_profit = steps.last().map(|s| s.profit.mean).unwrap_or(0.0);
    let profitable_weeks = steps.iter().filter(|s| s.profit.mean > 0.0).count();
    let provider_profitability =
        profitable_weeks as f64 / steps.len().max(1) as f64 * 100.0;

    DerivedMetrics {
        max_drawdown: max_drawdown(steps),
        price_volatility: price_volatility(steps),
        sharpe_ratio: sharpe_ratio(steps),
        death_spiral_probability: death_spiral_probability(steps, params.initial_price),
        token_velocity: token_velocity(steps, params),
        inflation_rate: inflation_rate(steps),
        net_emissions: net_emissions(steps),
        avg_provider_profit,
        provider_profitability,
        total_churn: steps.iter().map(|s| s.churn_count.mean).sum(),
        total_joins: steps.iter().map(|s| s.join_count.mean).sum(),
        retention_rate: retention_rate(steps, params.initial_providers),
        avg_utilisation: avg_utilisation(steps),
        demand_satisfaction_rate: demand_satisfaction_rate(steps),
        total_network_revenue: network_revenue(steps),
        total_provider_revenue: provider_revenue(steps),
        total_burned_value: burned_value(steps),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
