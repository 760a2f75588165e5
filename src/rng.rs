// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Deterministic Random Source

use std::f64::consts::PI;

/// Multiplier / increment / modulus of the 32-bit linear-congruential
/// recurrence. The exact constants are part of the reproducibility contract:
/// the same seed must yield the same draw sequence on every platform.
const LCG_MULT: u64 = 1_664_525;
const LCG_INC: u64 = 1_013_904_223;
const LCG_MOD: u64 = 1 << 32;

/// Seed substituted when a caller passes zero (a zero state would collapse
/// the first draw to the bare increment on every run).
const FALLBACK_SEED: u64 = 42;

/// Smallest uniform value fed into the Box-Muller log; avoids ln(0).
const UNIFORM_FLOOR: f64 = 1e-12;

// ─── RandomSource ────────────────────────────────────────────────────────────

/// Seeded deterministic pseudo-random source. All randomness in the engine
/// flows through one of these; every derived operation consumes a fixed,
/// documented number of base draws so that two runs with the same seed stay
/// draw-for-draw identical.
#[derive(Debug, Clone)]
pub struct RandomSource {
    state: u64,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { state: seed % LCG_MOD }
    }

    /// Next uniform value in [0, 1). Consumes one base draw.
    pub fn next(&mut self) -> f64 {
        self.state = (self.state.wrapping_mul(LCG_MULT).wrapping_add(LCG_INC)) % LCG_MOD;
        self.state as f64 / LCG_MOD as f64
    }

    /// Standard normal variate via the Box-Muller transform.
    /// Consumes exactly two base draws.
    pub fn normal(&mut self) -> f64 {
        let u = self.next().max(UNIFORM_FLOOR);
        let v = self.next();
        (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
    }

    /// Normal variate with the given mean and standard deviation.
    /// Consumes exactly two base draws.
    pub fn normal_with(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.normal()
    }

    /// Uniform integer in [lo, hi] inclusive. Consumes one base draw.
    /// Degenerate ranges (hi < lo) return lo.
    pub fn rand_int(&mut self, lo: i64, hi: i64) -> i64 {
        let r = self.next();
        if hi < lo {
            return lo;
        }
        lo + (r * (hi - lo + 1) as f64).floor() as i64
    }

    /// Uniform float in [lo, hi). Consumes one base draw.
    pub fn rand_float(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next() * (hi - lo)
    }

    /// Pick one element uniformly. Consumes one base draw even for an empty
    /// slice, so sequences stay aligned across branches.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let r = self.next();
        if items.is_empty() {
            return None;
        }
        let idx = (r * items.len() as f64).floor() as usize;
        items.get(idx.min(items.len() - 1))
    }

    /// Fisher-Yates shuffle in place. Consumes len - 1 base draws
    /// (zero for slices shorter than two elements).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rand_int(0, i as i64) as usize;
            items.swap(i, j);
        }
    }

    /// Exponential variate with rate lambda. Consumes one base draw.
    pub fn exponential(&mut self, lambda: f64) -> f64 {
        let u = self.next();
        -(1.0 - u).max(UNIFORM_FLOOR).ln() / lambda.max(UNIFORM_FLOOR)
    }

    /// Short hex tag for labelling runs and reports.
    /// Consumes exactly eight base draws, one per character.
    pub fn ident(&mut self) -> String {
        (0..8)
            .map(|_| {
                let d = self.rand_int(0, 15) as u32;
                char::from_digit(d, 16).unwrap_or('0')
            })
            .collect()
    }

    /// Reset to a new seed, with the same zero-seed substitution as `new`.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Current raw state, for debugging and draw-count assertions.
    pub fn state(&self) -> u64 {
        self.state
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomSource::new(12345);
        let mut b = RandomSource::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
        assert_eq!(a.rand_int(0, 100), b.rand_int(0, 100));
        assert_eq!(a.normal().to_bits(), b.normal().to_bits());
    }

    #[test]
    fn test_different_seeds_diverge_on_first_draw() {
        let mut a = RandomSource::new(12345);
        let mut b = RandomSource::new(67890);
        assert_ne!(a.next().to_bits(), b.next().to_bits());
    }

    #[test]
    fn test_zero_seed_falls_back() {
        let mut zero = RandomSource::new(0);
        let mut fallback = RandomSource::new(FALLBACK_SEED);
        assert_eq!(zero.next().to_bits(), fallback.next().to_bits());
    }

    #[test]
    fn test_normal_consumes_exactly_two_draws() {
        let mut a = RandomSource::new(7);
        let mut b = RandomSource::new(7);
        a.normal();
        b.next();
        b.next();
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_uniform_buckets_roughly_even() {
        let mut rng = RandomSource::new(123);
        let mut buckets = [0u32; 10];
        let n = 10_000;
        for _ in 0..n {
            let v = rng.next();
            buckets[(v * 10.0) as usize] += 1;
        }
        for count in buckets {
            let pct = count as f64 / n as f64;
            assert!(pct > 0.08 && pct < 0.12, "bucket share {} out of range", pct);
        }
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = RandomSource::new(123);
        let n = 5_000;
        let values: Vec<f64> = (0..n).map(|_| rng.normal()).collect();
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "normal mean {} too far from 0", mean);
        assert!((var.sqrt() - 1.0).abs() < 0.05, "normal std {} too far from 1", var.sqrt());
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = RandomSource::new(99);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn test_pick_consumes_draw_even_when_empty() {
        let mut a = RandomSource::new(5);
        let mut b = RandomSource::new(5);
        let empty: [u32; 0] = [];
        assert!(a.pick(&empty).is_none());
        b.next();
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_exponential_positive() {
        let mut rng = RandomSource::new(11);
        for _ in 0..1000 {
            assert!(rng.exponential(0.5) >= 0.0);
        }
    }

    #[test]
    fn test_ident_shape() {
        let mut rng = RandomSource::new(3);
        let tag = rng.ident();
        assert_eq!(tag.len(), 8);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn prop_next_in_unit_interval(seed in any::<u64>()) {
            let mut rng = RandomSource::new(seed);
            for _ in 0..64 {
                let v = rng.next();
                prop_assert!((0.0..1.0).contains(&v));
            }
        }

        #[test]
        fn prop_rand_int_in_bounds(seed in any::<u64>(), lo in -100i64..100, span in 0i64..100) {
            let mut rng = RandomSource::new(seed);
            let hi = lo + span;
            for _ in 0..32 {
                let v = rng.rand_int(lo, hi);
                prop_assert!(v >= lo && v <= hi);
            }
        }
    }
}
