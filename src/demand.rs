// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Demand Generation

use crate::rng::RandomSource;
use crate::types::DemandRegime;

/// Noise amplitude per unit of configured volatility. At the default
/// volatility of 0.1 these give the canonical 3% / 5% / 20% bands.
const CONSISTENT_NOISE: f64 = 0.3;
const SHAPED_NOISE: f64 = 0.5;
const VOLATILE_NOISE: f64 = 2.0;

/// Weeks per simulated year, used by the seasonal generator.
const WEEKS_PER_YEAR: f64 = 52.0;

// ─── Series generation ───────────────────────────────────────────────────────

/// Generate the exogenous weekly demand series for one trajectory.
///
/// Consumes exactly one `normal()` draw (two base draws) per week regardless
/// of regime, so trajectories stay draw-aligned across regime choices. All
/// outputs are floored at zero.
pub fn generate(
    t_weeks: u32,
    base: f64,
    regime: DemandRegime,
    volatility: f64,
    rng: &mut RandomSource,
) -> Vec<f64> {
    (0..t_weeks)
        .map(|t| {
            let noise = rng.normal();
            let week = t as f64;
            let demand = match regime {
                DemandRegime::Consistent => base * (1.0 + CONSISTENT_NOISE * volatility * noise),
                DemandRegime::DecayFromHigh => {
                    base * (1.6 * (-week / 10.0).exp() + 0.6)
                        * (1.0 + SHAPED_NOISE * volatility * noise)
                }
                DemandRegime::Growth => {
                    base * (0.8 + 0.02 * week) * (1.0 + SHAPED_NOISE * volatility * noise)
                }
                DemandRegime::Volatile => base * (1.0 + VOLATILE_NOISE * volatility * noise),
            };
            demand.max(0.0)
        })
        .collect()
}

/// Generate a seasonally modulated series: annual sinusoid of the given
/// amplitude on top of consistent-regime noise. One `normal()` per week.
pub fn generate_seasonal(
    t_weeks: u32,
    base: f64,
    amplitude: f64,
    volatility: f64,
    rng: &mut RandomSource,
) -> Vec<f64> {
    (0..t_weeks)
        .map(|t| {
            let noise = rng.normal();
            let phase = (t as f64 / WEEKS_PER_YEAR) * std::f64::consts::TAU;
            let seasonal = 1.0 + amplitude * phase.sin();
            (base * seasonal * (1.0 + CONSISTENT_NOISE * volatility * noise)).max(0.0)
        })
        .collect()
}

/// Apply a multiplicative shock to a demand window: weeks in
/// [week, week + duration) are scaled by `magnitude` (0.5 halves demand,
/// 1.5 boosts it). Weeks outside the series are ignored.
pub fn apply_shock(series: &mut [f64], week: usize, magnitude: f64, duration: usize) {
    let end = week.saturating_add(duration).min(series.len());
    for d in series.iter_mut().take(end).skip(week) {
        *d = (*d * magnitude).max(0.0);
    }
}

/// Summary of a demand series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Mean/min/max/std of a series. Empty series yields all zeros.
pub fn series_stats(series: &[f64]) -> SeriesStats {
    if series.is_empty() {
        return SeriesStats { mean: 0.0, min: 0.0, max: 0.0, std_dev: 0.0 };
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    SeriesStats {
        mean,
        min: series.iter().copied().fold(f64::INFINITY, f64::min),
        max: series.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std_dev: variance.sqrt(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
