// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Configuration Boundary

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DemandRegime, MacroRegime, Scenario};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Configuration rejected at the boundary, before any trajectory starts.
/// Inside a running trajectory nothing errors: degenerate states are
/// floor-guarded instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("time horizon must be at least one week")]
    EmptyHorizon,
    #[error("trajectory count must be at least one")]
    NoTrajectories,
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie in [0, 1] (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("min_service_price {min} exceeds max_service_price {max}")]
    ServicePriceBand { min: f64, max: f64 },
    #[error("investor unlock week {week} is outside the {horizon}-week horizon")]
    UnlockOutsideHorizon { week: u32, horizon: u32 },
    #[error("investor unlock at week {week} requires a positive sell fraction")]
    UnlockWithoutSellFraction { week: u32 },
    #[error("crash-decay scenario cannot be combined with an investor unlock")]
    ContradictoryShock,
}

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Full configuration record for one Monte Carlo batch. These are the only
/// recognized inputs; a batch is a pure function of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Time horizon in weeks (T).
    pub t_weeks: u32,
    pub initial_supply: f64,
    pub initial_price: f64,
    /// USD depth of the 50/50 constant-product liquidity pool.
    pub initial_liquidity: f64,
    pub max_mint_weekly: f64,
    /// Fraction of tokens spent on service that is burned.
    pub burn_fraction: f64,

    pub demand_regime: DemandRegime,
    pub base_demand: f64,
    pub demand_volatility: f64,

    pub initial_providers: u32,
    pub base_capacity_per_provider: f64,
    /// Relative std-dev of drawn capacity.
    pub capacity_std_dev: f64,
    pub provider_cost_per_week: f64,
    /// Relative std-dev of drawn operating cost.
    pub cost_std_dev: f64,
    /// Probability a new provider is urban.
    pub urban_share: f64,

    /// Weekly profit below which a loss week is counted.
    pub churn_threshold: f64,
    /// Weeks between a join decision and coming online.
    pub hardware_lead_time: u32,
    /// Average weekly profit that attracts new providers.
    pub profit_threshold_to_join: f64,
    pub max_provider_growth_rate: f64,
    pub max_provider_churn_rate: f64,

    pub base_service_price: f64,
    pub min_service_price: f64,
    pub max_service_price: f64,
    pub service_price_elasticity: f64,

    pub k_buy_pressure: f64,
    pub k_sell_pressure: f64,
    pub k_demand_price: f64,
    pub k_mint_price: f64,

    /// Weeks of delay on the published reward ("incentive") signal.
    pub reward_lag_weeks: u32,
    pub scenario: Scenario,
    /// Scheduled investor-unlock dump week, if any.
    pub investor_unlock_week: Option<u32>,
    /// Fraction of supply sold into the pool at the unlock week.
    pub investor_sell_pct: f64,
    pub macro_regime: MacroRegime,

    pub seed: u64,
    /// Trajectory count (N).
    pub n_sims: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            t_weeks: 52,
            initial_supply: 1_000_000.0,
            initial_price: 0.5,
            initial_liquidity: 500_000.0,
            max_mint_weekly: 10_000.0,
            burn_fraction: 0.1,
            demand_regime: DemandRegime::Consistent,
            base_demand: 2_000.0,
            demand_volatility: 0.1,
            initial_providers: 100,
            base_capacity_per_provider: 100.0,
            capacity_std_dev: 0.1,
            provider_cost_per_week: 10.0,
            cost_std_dev: 0.1,
            urban_share: 0.3,
            churn_threshold: 0.0,
            hardware_lead_time: 4,
            profit_threshold_to_join: 20.0,
            max_provider_growth_rate: 0.1,
            max_provider_churn_rate: 0.2,
            base_service_price: 1.0,
            min_service_price: 0.1,
            max_service_price: 10.0,
            service_price_elasticity: 0.1,
            k_buy_pressure: 0.05,
            k_sell_pressure: 0.05,
            k_demand_price: 0.01,
            k_mint_price: 0.01,
            reward_lag_weeks: 2,
            scenario: Scenario::Baseline,
            investor_unlock_week: None,
            investor_sell_pct: 0.0,
            macro_regime: MacroRegime::Sideways,
            seed: 42,
            n_sims: 100,
        }
    }
}

impl SimulationParams {
    /// Validate the record. Called once per batch before any trajectory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.t_weeks == 0 {
            return Err(ConfigError::EmptyHorizon);
        }
        if self.n_sims == 0 {
            return Err(ConfigError::NoTrajectories);
        }

        for (field, value) in [
            ("initial_supply", self.initial_supply),
            ("initial_price", self.initial_price),
            ("initial_liquidity", self.initial_liquidity),
            ("base_capacity_per_provider", self.base_capacity_per_provider),
            ("provider_cost_per_week", self.provider_cost_per_week),
            ("profit_threshold_to_join", self.profit_threshold_to_join),
            ("base_service_price", self.base_service_price),
            ("min_service_price", self.min_service_price),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        for (field, value) in [
            ("burn_fraction", self.burn_fraction),
            ("urban_share", self.urban_share),
            ("max_provider_churn_rate", self.max_provider_churn_rate),
            ("investor_sell_pct", self.investor_sell_pct),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        for (field, value) in [
            ("max_mint_weekly", self.max_mint_weekly),
            ("base_demand", self.base_demand),
            ("demand_volatility", self.demand_volatility),
            ("capacity_std_dev", self.capacity_std_dev),
            ("cost_std_dev", self.cost_std_dev),
            ("max_provider_growth_rate", self.max_provider_growth_rate),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.min_service_price > self.max_service_price {
            return Err(ConfigError::ServicePriceBand {
                min: self.min_service_price,
                max: self.max_service_price,
            });
        }

        if let Some(week) = self.investor_unlock_week {
            if week >= self.t_weeks {
                return Err(ConfigError::UnlockOutsideHorizon { week, horizon: self.t_weeks });
            }
            if self.investor_sell_pct <= 0.0 {
                return Err(ConfigError::UnlockWithoutSellFraction { week });
            }
            if self.scenario == Scenario::CrashDecay {
                return Err(ConfigError::ContradictoryShock);
            }
        }

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(SimulationParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let params = SimulationParams { t_weeks: 0, ..Default::default() };
        assert_eq!(params.validate(), Err(ConfigError::EmptyHorizon));
    }

    #[test]
    fn test_zero_trajectories_rejected() {
        let params = SimulationParams { n_sims: 0, ..Default::default() };
        assert_eq!(params.validate(), Err(ConfigError::NoTrajectories));
    }

    #[test]
    fn test_burn_fraction_out_of_range() {
        let params = SimulationParams { burn_fraction: 1.5, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::OutOfRange { field: "burn_fraction", .. })
        ));
    }

    #[test]
    fn test_unlock_outside_horizon_rejected() {
        let params = SimulationParams {
            t_weeks: 52,
            investor_unlock_week: Some(60),
            investor_sell_pct: 0.2,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::UnlockOutsideHorizon { .. })));
    }

    #[test]
    fn test_unlock_without_sell_fraction_rejected() {
        let params = SimulationParams {
            investor_unlock_week: Some(10),
            investor_sell_pct: 0.0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::UnlockWithoutSellFraction { .. })));
    }

    #[test]
    fn test_crash_decay_with_unlock_contradictory() {
        let params = SimulationParams {
            scenario: Scenario::CrashDecay,
            investor_unlock_week: Some(10),
            investor_sell_pct: 0.2,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::ContradictoryShock));
    }

    #[test]
    fn test_inverted_service_price_band_rejected() {
        let params = SimulationParams {
            min_service_price: 5.0,
            max_service_price: 1.0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::ServicePriceBand { .. })));
    }

    #[test]
    fn test_params_round_trip_json() {
        let params = SimulationParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: SimulationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.t_weeks, params.t_weeks);
        assert_eq!(back.scenario, params.scenario);
        assert_eq!(back.seed, params.seed);
    }
}
