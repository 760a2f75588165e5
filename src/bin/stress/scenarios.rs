// Stress Scenario Definitions — named parameter presets with pass criteria
// All scenario logic lives in the configuration record; zero engine changes

use depin_engine::{DemandRegime, MacroRegime, Scenario, SimulationParams};

// ─── Scenario configuration ─────────────────────────────────────────────────

pub struct StressScenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub params: SimulationParams,
    pub criteria: PassCriteria,
}

/// Thresholds a scenario's derived metrics must satisfy. Unset checks pass.
pub struct PassCriteria {
    pub max_death_spiral_pct: Option<f64>,
    pub min_retention_pct: Option<f64>,
    pub max_drawdown_pct: Option<f64>,
    pub min_demand_satisfaction_pct: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_death_spiral_pct: None,
            min_retention_pct: None,
            max_drawdown_pct: None,
            min_demand_satisfaction_pct: None,
        }
    }
}

// ─── Scenario definitions ───────────────────────────────────────────────────

pub fn scenarios() -> Vec<StressScenario> {
    vec![
        // ─── Market conditions ──────────────────────────────────────────
        StressScenario {
            name: "BASELINE",
            label: "Baseline Market",
            category: "market",
            params: SimulationParams::default(),
            criteria: PassCriteria {
                max_death_spiral_pct: Some(50.0),
                min_retention_pct: Some(40.0),
                min_demand_satisfaction_pct: Some(80.0),
                ..Default::default()
            },
        },
        StressScenario {
            name: "BULL_GROWTH",
            label: "Bull Market / Growing Demand",
            category: "market",
            params: SimulationParams {
                macro_regime: MacroRegime::Bullish,
                demand_regime: DemandRegime::Growth,
                ..Default::default()
            },
            criteria: PassCriteria {
                max_death_spiral_pct: Some(25.0),
                min_retention_pct: Some(40.0),
                ..Default::default()
            },
        },
        StressScenario {
            name: "BEAR_VOLATILE",
            label: "Bear Market / Volatile Demand",
            category: "market",
            params: SimulationParams {
                macro_regime: MacroRegime::Bearish,
                demand_regime: DemandRegime::Volatile,
                demand_volatility: 0.3,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
        StressScenario {
            name: "DEMAND_COLLAPSE",
            label: "Demand Decay From High",
            category: "market",
            params: SimulationParams {
                macro_regime: MacroRegime::Bearish,
                demand_regime: DemandRegime::DecayFromHigh,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
        // ─── Thesis scenarios ───────────────────────────────────────────
        StressScenario {
            name: "CRYPTO_WINTER",
            label: "Crypto Winter (-90% decay)",
            category: "thesis",
            params: SimulationParams {
                scenario: Scenario::CrashDecay,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
        StressScenario {
            name: "HARDWARE_SATURATION",
            label: "Hardware Saturation (mass join)",
            category: "thesis",
            params: SimulationParams {
                scenario: Scenario::MassJoin,
                ..Default::default()
            },
            criteria: PassCriteria {
                min_demand_satisfaction_pct: Some(80.0),
                ..Default::default()
            },
        },
        StressScenario {
            name: "UTILITY_VALIDATION",
            label: "Utility Validation (demand boost)",
            category: "thesis",
            params: SimulationParams {
                scenario: Scenario::DemandBoost,
                ..Default::default()
            },
            criteria: PassCriteria {
                max_death_spiral_pct: Some(25.0),
                min_demand_satisfaction_pct: Some(80.0),
                ..Default::default()
            },
        },
        // ─── Liquidity shocks ───────────────────────────────────────────
        StressScenario {
            name: "UNLOCK_CLIFF_20",
            label: "Investor Unlock 20% @ w26",
            category: "shock",
            params: SimulationParams {
                investor_unlock_week: Some(26),
                investor_sell_pct: 0.2,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
        StressScenario {
            name: "UNLOCK_CLIFF_50",
            label: "Investor Unlock 50% @ w26",
            category: "shock",
            params: SimulationParams {
                investor_unlock_week: Some(26),
                investor_sell_pct: 0.5,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
        StressScenario {
            name: "THIN_POOL_DUMP",
            label: "Thin Pool / 20% Dump @ w13",
            category: "shock",
            params: SimulationParams {
                initial_liquidity: 100_000.0,
                investor_unlock_week: Some(13),
                investor_sell_pct: 0.2,
                ..Default::default()
            },
            criteria: PassCriteria::default(),
        },
    ]
}
