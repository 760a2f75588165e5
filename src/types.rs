// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Type Definitions

use serde::{Deserialize, Serialize};

// ─── Scenario ────────────────────────────────────────────────────────────────

/// Closed set of alternate weekly-transition behaviors. Exactly one scenario
/// is active per run, selected at configuration time, never mid-run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Organic price action driven by buy/sell/scarcity/dilution pressures.
    Baseline,
    /// Deterministic exponential price decay ("crypto winter"), overriding
    /// the pressure model entirely.
    CrashDecay,
    /// One-time hardware-saturation surge of pending providers at week T/3.
    MassJoin,
    /// Artificially compounded demand signal fed into the price pressures
    /// only; burn accounting still uses true demand.
    DemandBoost,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::Baseline
    }
}

// ─── Demand regime ───────────────────────────────────────────────────────────

/// Shape of the exogenous weekly service-demand series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DemandRegime {
    /// Small multiplicative noise around the base level.
    Consistent,
    /// Exponential decay from an elevated multiple toward a floor.
    DecayFromHigh,
    /// Multiplier increasing linearly with week index.
    Growth,
    /// Noise amplitude scaled well above the other regimes.
    Volatile,
}

impl Default for DemandRegime {
    fn default() -> Self {
        Self::Consistent
    }
}

// ─── Macro regime ────────────────────────────────────────────────────────────

/// Macro drift/volatility environment applied to the organic log-return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MacroRegime {
    Sideways,
    Bearish,
    Bullish,
}

impl Default for MacroRegime {
    fn default() -> Self {
        Self::Sideways
    }
}

impl MacroRegime {
    /// Weekly log-return drift and volatility for this regime.
    pub fn drift_and_vol(self) -> (f64, f64) {
        match self {
            Self::Sideways => (0.002, 0.05),
            Self::Bearish => (-0.01, 0.06),
            Self::Bullish => (0.015, 0.06),
        }
    }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// Cost/location class of a provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// High-cost deployment sharing a crowded reward pool with neighbors.
    Urban,
    /// Low-cost deployment with unique coverage (no reward sharing).
    Rural,
}

/// One-way lifecycle: Pending -> Active -> Churned. Churned is terminal;
/// churn transitions only from Active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderStatus {
    Pending,
    Active,
    Churned,
}

/// A provider agent. Addressed by its stable arena handle `id`, never by
/// reference identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: u32,
    pub kind: ProviderKind,
    /// Service capacity per week. Floored at a small positive minimum.
    pub capacity: f64,
    /// USD operating cost per week. Floored at a small positive minimum.
    pub operational_cost: f64,
    /// Reward-pool crowding score: rural exactly 1.0, urban 1/(1+neighbors).
    pub location_score: f64,
    pub joined_week: u32,
    pub cumulative_profit: f64,
    pub consecutive_loss_weeks: u32,
    pub status: ProviderStatus,
}

// ─── WeeklyResult ────────────────────────────────────────────────────────────

/// Immutable snapshot emitted once per week per trajectory.
///
/// `price` is the week's opening price; `supply` is post mint/burn.
/// Downstream consumers rely on that asymmetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyResult {
    pub t: u32,
    pub price: f64,
    pub supply: f64,
    pub demand: f64,
    pub demand_served: f64,
    pub providers: u32,
    pub capacity: f64,
    pub service_price: f64,
    pub minted: f64,
    pub burned: f64,
    /// Percentage of capacity in use, 0..100.
    pub utilisation: f64,
    /// Average per-provider USD profit this week.
    pub profit: f64,
    /// Normalized excess of demand over capacity.
    pub scarcity: f64,
    /// Lagged reward signal relative to operating cost.
    pub incentive: f64,
    pub buy_pressure: f64,
    pub sell_pressure: f64,
    pub net_flow: f64,
    pub churn_count: u32,
    pub join_count: u32,
    /// burned USD / minted USD per day (floor-guarded denominator).
    pub solvency_ratio: f64,
    pub net_daily_loss: f64,
    pub daily_mint_usd: f64,
    pub daily_burn_usd: f64,
    pub urban_count: u32,
    pub rural_count: u32,
    /// Sum of active providers' location scores.
    pub weighted_coverage: f64,
}

// ─── Cross-run statistics ────────────────────────────────────────────────────

/// Per-metric statistics reduced across all trajectories for one week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub p10: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl MetricStats {
    /// Compute stats from raw samples. Percentiles come from a full sort
    /// (p10 at index floor(n*0.1), p90 at floor(n*0.9)); the standard
    /// deviation is the population form.
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, p10: 0.0, p90: 0.0, min: 0.0, max: 0.0, std_dev: 0.0 };
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let p10 = sorted.get((n as f64 * 0.1).floor() as usize).copied().unwrap_or(0.0);
        let p90 = sorted.get((n as f64 * 0.9).floor() as usize).copied().unwrap_or(0.0);
        Self {
            mean,
            p10,
            p90,
            min: sorted[0],
            max: sorted[n - 1],
            std_dev: variance.sqrt(),
        }
    }
}

/// Cross-run statistics for every tracked metric at one week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStep {
    pub t: u32,
    pub price: MetricStats,
    pub supply: MetricStats,
    pub demand: MetricStats,
    pub demand_served: MetricStats,
    pub providers: MetricStats,
    pub capacity: MetricStats,
    pub service_price: MetricStats,
    pub minted: MetricStats,
    pub burned: MetricStats,
    pub utilisation: MetricStats,
    pub profit: MetricStats,
    pub scarcity: MetricStats,
    pub incentive: MetricStats,
    pub buy_pressure: MetricStats,
    pub sell_pressure: MetricStats,
    pub net_flow: MetricStats,
    pub churn_count: MetricStats,
    pub join_count: MetricStats,
    pub solvency_ratio: MetricStats,
    pub net_daily_loss: MetricStats,
    pub daily_mint_usd: MetricStats,
    pub daily_burn_usd: MetricStats,
    pub urban_count: MetricStats,
    pub rural_count: MetricStats,
    pub weighted_coverage: MetricStats,
}

// ─── Batch output ────────────────────────────────────────────────────────────

/// Everything a Monte Carlo batch produces: the per-trajectory weekly
/// sequences (N of them, each of length T) and the per-week aggregate
/// (length exactly T). External consumers read these; nothing feeds back
/// into the engine mid-run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub trajectories: Vec<Vec<WeeklyResult>>,
    pub aggregate: Vec<AggregateStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_empty() {
        let s = MetricStats::from_samples(&[]);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn test_stats_ordering() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let s = MetricStats::from_samples(&samples);
        assert!(s.p10 <= s.mean && s.mean <= s.p90);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 99.0);
        assert!((s.p10 - 10.0).abs() < f64::EPSILON);
        assert!((s.p90 - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_single_sample() {
        let s = MetricStats::from_samples(&[5.0]);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.p10, 5.0);
        assert_eq!(s.p90, 5.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn test_scenario_tags_round_trip() {
        let json = serde_json::to_string(&Scenario::CrashDecay).unwrap();
        assert_eq!(json, "\"crash-decay\"");
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Scenario::CrashDecay);
    }
}
