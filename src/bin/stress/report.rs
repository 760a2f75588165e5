// Stress Report Types — structured output for independent analysis

use serde::Serialize;

use depin_engine::metrics::DerivedMetrics;

// ─── Per-scenario report ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub label: String,
    pub category: String,
    pub n_runs: u32,
    pub pass: bool,
    pub failures: Vec<String>,
    pub metrics: DerivedMetrics,
    pub final_price_mean: f64,
    pub final_price_p10: f64,
    pub final_price_p90: f64,
    pub final_providers_mean: f64,
    pub elapsed_ms: u128,
}

// ─── Top-level report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StressReport {
    pub timestamp: String,
    pub version: &'static str,
    pub rng: &'static str,
    pub base_seed: u64,
    pub runs_per_scenario: u32,
    pub summary: Summary,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
