// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Shock Handling

use std::collections::HashMap;

use tracing::debug;

use crate::providers::ProviderPool;
use crate::rng::RandomSource;
use crate::types::ProviderKind;

/// Price floor used when forming ratios against a possibly collapsed price.
const PRICE_FLOOR: f64 = 1e-4;

/// Panic probabilities: underwater base, severe-collapse escalation, and the
/// flat urban sensitivity bonus (higher OPEX operators capitulate faster).
const PANIC_BASE: f64 = 0.2;
const PANIC_SEVERE: f64 = 0.8;
const PANIC_URBAN_BONUS: f64 = 0.3;

// ─── Constant-product reserve ────────────────────────────────────────────────

/// Two-asset constant-product pool: `usd * tokens = k`, with k held fixed
/// across organic weeks and only rebased by an explicit trade or resync.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityPool {
    pub usd: f64,
    pub tokens: f64,
    k: f64,
}

impl LiquidityPool {
    /// Initialise a 50/50 pool holding `liquidity_usd` against tokens priced
    /// at `price`.
    pub fn new(liquidity_usd: f64, price: f64) -> Self {
        let usd = liquidity_usd;
        let tokens = usd / price.max(PRICE_FLOOR);
        Self { usd, tokens, k: usd * tokens }
    }

    /// Spot price implied by the current reserves.
    pub fn spot(&self) -> f64 {
        self.usd / self.tokens.max(PRICE_FLOOR)
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Sell `amount` tokens into the pool and return the new spot price.
    /// The product `usd * tokens` is preserved exactly.
    pub fn sell(&mut self, amount: f64) -> f64 {
        self.tokens += amount;
        self.usd = self.k / self.tokens.max(PRICE_FLOOR);
        let spot = self.spot();
        debug!(amount, spot, "liquidity shock applied");
        spot
    }

    /// Rebase reserves to an externally determined price, assuming arbitrage
    /// has equalized the pool: `usd = sqrt(k * price)`, `tokens = sqrt(k / price)`.
    pub fn resync(&mut self, price: f64) {
        let price = price.max(PRICE_FLOOR);
        self.usd = (self.k * price).sqrt();
        self.tokens = (self.k / price).sqrt();
    }
}

// ─── Panic churn ─────────────────────────────────────────────────────────────

/// Immediate capitulation pass run in the week of a price shock.
///
/// For each active provider the previous revenue is reconstructed from last
/// week's profit (`revenue = profit + cost`) and scaled by the price ratio
/// to estimate instantaneous profitability at the shocked price. Underwater
/// estimates panic at 20%, rising to 80% when revenue collapses below half
/// of operating cost; urban providers carry a flat +30%. One uniform draw
/// per active provider decides the exit.
pub fn process_panic(
    pool: &mut ProviderPool,
    price_before: f64,
    price_after: f64,
    previous_profits: &HashMap<u32, f64>,
    rng: &mut RandomSource,
) -> u32 {
    let price_ratio = price_after / price_before.max(PRICE_FLOOR);

    let mut exits: Vec<u32> = Vec::new();
    for agent in pool.active() {
        let last_profit = previous_profits.get(&agent.id).copied().unwrap_or(0.0);
        let last_revenue = last_profit + agent.operational_cost;
        let estimated_revenue = last_revenue * price_ratio;
        let estimated_profit = estimated_revenue - agent.operational_cost;

        let mut panic_prob = 0.0;
        if estimated_profit < 0.0 {
            panic_prob = PANIC_BASE;
            if estimated_revenue < agent.operational_cost * 0.5 {
                panic_prob = PANIC_SEVERE;
            }
            if agent.kind == ProviderKind::Urban {
                panic_prob += PANIC_URBAN_BONUS;
            }
        }

        if rng.next() < panic_prob {
            exits.push(agent.id);
        }
    }

    for id in &exits {
        pool.retire(*id);
    }
    exits.len() as u32
}

// ─── Tests ───────────────────────────────────────────────────────────────────
