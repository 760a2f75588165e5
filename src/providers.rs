// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Provider Pool

use std::collections::HashMap;

use crate::config::SimulationParams;
use crate::rng::RandomSource;
use crate::types::{Provider, ProviderKind, ProviderStatus};

/// Floors applied to drawn provider attributes.
const MIN_CAPACITY: f64 = 10.0;
const MIN_COST: f64 = 1.0;

/// Operating-cost multipliers by deployment class.
const URBAN_COST_MULT: f64 = 1.5;
const RURAL_COST_MULT: f64 = 0.8;

/// Hard ceiling on the per-provider weekly churn probability.
const MAX_CHURN_PROB: f64 = 0.9;

// ─── Pool ────────────────────────────────────────────────────────────────────

/// Arena of provider agents. Agents are addressed by stable `u32` handles
/// (their index) and move through the one-way Pending -> Active -> Churned
/// lifecycle; records are never removed.
#[derive(Debug, Clone, Default)]
pub struct ProviderPool {
    agents: Vec<Provider>,
}

/// Outcome of one weekly stay/leave/join pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionOutcome {
    pub churn_count: u32,
    pub join_count: u32,
}

impl ProviderPool {
    /// Seed the pool with the configured number of active providers at week 0.
    pub fn initialise(rng: &mut RandomSource, params: &SimulationParams) -> Self {
        let mut pool = Self::default();
        for _ in 0..params.initial_providers {
            pool.spawn(rng, params, 0, ProviderStatus::Active);
        }
        pool
    }

    /// Create one provider with heterogeneous characteristics and push it
    /// into the arena.
    ///
    /// Draw cost: 1 uniform (class) + 2 (capacity) + 2 (cost), plus 2 more
    /// for the crowding draw when the class comes up urban.
    pub fn spawn(
        &mut self,
        rng: &mut RandomSource,
        params: &SimulationParams,
        joined_week: u32,
        status: ProviderStatus,
    ) -> u32 {
        let is_urban = rng.next() < params.urban_share;
        let (kind, cost_mult) = if is_urban {
            (ProviderKind::Urban, URBAN_COST_MULT)
        } else {
            (ProviderKind::Rural, RURAL_COST_MULT)
        };

        let capacity = (params.base_capacity_per_provider
            * (1.0 + params.capacity_std_dev * rng.normal()))
        .max(MIN_CAPACITY);
        let operational_cost = (params.provider_cost_per_week
            * cost_mult
            * (1.0 + params.cost_std_dev * rng.normal()))
        .max(MIN_COST);

        // Urban deployments split rewards with 2-5 simulated neighbors in the
        // same cell; rural coverage is unique.
        let location_score = if is_urban {
            let neighbors = 2.0 + (rng.normal() * 1.5).abs();
            1.0 / (1.0 + neighbors)
        } else {
            1.0
        };

        let id = self.agents.len() as u32;
        self.agents.push(Provider {
            id,
            kind,
            capacity,
            operational_cost,
            location_score,
            joined_week,
            cumulative_profit: 0.0,
            consecutive_loss_weeks: 0,
            status,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&Provider> {
        self.agents.get(id as usize)
    }

    /// Active -> Churned, the only externally reachable transition.
    /// Pending and already-churned agents are left untouched.
    pub fn retire(&mut self, id: u32) -> bool {
        match self.agents.get_mut(id as usize) {
            Some(agent) if agent.status == ProviderStatus::Active => {
                agent.status = ProviderStatus::Churned;
                true
            }
            _ => false,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Provider> {
        self.agents.iter().filter(|a| a.status == ProviderStatus::Active)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn pending_count(&self) -> usize {
        self.agents.iter().filter(|a| a.status == ProviderStatus::Pending).count()
    }

    pub fn churned_count(&self) -> usize {
        self.agents.iter().filter(|a| a.status == ProviderStatus::Churned).count()
    }

    pub fn total_capacity(&self) -> f64 {
        self.active().map(|a| a.capacity).sum()
    }

    pub fn urban_count(&self) -> usize {
        self.active().filter(|a| a.kind == ProviderKind::Urban).count()
    }

    pub fn rural_count(&self) -> usize {
        self.active().filter(|a| a.kind == ProviderKind::Rural).count()
    }

    /// Sum of active location scores: the crowding-discounted coverage of
    /// the network.
    pub fn weighted_coverage(&self) -> f64 {
        self.active().map(|a| a.location_score).sum()
    }

    /// Weekly stay/leave/join pass, driven by last week's per-provider
    /// profits. One uniform draw per active provider decides exit; the
    /// pool-wide churn cap reinstates the most recently flagged candidates
    /// first. Pending agents graduate once the hardware lead time elapses,
    /// and attractive average profit (or the one-time mass-join surge)
    /// admits new pending providers.
    pub fn decide(
        &mut self,
        profits: &HashMap<u32, f64>,
        params: &SimulationParams,
        week: u32,
        rng: &mut RandomSource,
    ) -> DecisionOutcome {
        let pre_active = self.active_count();

        // Stay/leave per active agent, in arena order.
        let mut flagged: Vec<u32> = Vec::new();
        for agent in self.agents.iter_mut().filter(|a| a.status == ProviderStatus::Active) {
            let profit = profits.get(&agent.id).copied().unwrap_or(0.0);
            agent.cumulative_profit += profit;
            if profit < params.churn_threshold {
                agent.consecutive_loss_weeks += 1;
            } else {
                agent.consecutive_loss_weeks = agent.consecutive_loss_weeks.saturating_sub(1);
            }

            let prob = churn_probability(agent.consecutive_loss_weeks, profit, params);
            if rng.next() < prob {
                flagged.push(agent.id);
            }
        }

        // Pool-wide churn cap: excess candidates stay after all.
        let max_churn = (pre_active as f64 * params.max_provider_churn_rate).floor() as usize;
        flagged.truncate(max_churn.min(flagged.len()));
        for id in &flagged {
            self.agents[*id as usize].status = ProviderStatus::Churned;
        }
        let churn_count = flagged.len() as u32;

        // Graduate pending agents whose hardware arrived.
        let mut join_count = 0u32;
        for agent in self.agents.iter_mut().filter(|a| a.status == ProviderStatus::Pending) {
            if week.saturating_sub(agent.joined_week) >= params.hardware_lead_time {
                agent.status = ProviderStatus::Active;
                join_count += 1;
            }
        }

        // New joins: mass-join surge overrides the growth logic for its week.
        let avg_profit = average_profit(profits);
        let post_active = self.active_count();
        let potential_joins = if params.scenario == crate::types::Scenario::MassJoin
            && week == params.t_weeks / 3
        {
            pre_active * 2
        } else if avg_profit > params.profit_threshold_to_join {
            let attractiveness = (avg_profit - params.profit_threshold_to_join)
                / params.profit_threshold_to_join;
            (post_active as f64 * params.max_provider_growth_rate * attractiveness.min(1.0))
                .floor() as usize
        } else {
            0
        };

        for _ in 0..potential_joins {
            self.spawn(rng, params, week, ProviderStatus::Pending);
        }

        DecisionOutcome { churn_count, join_count }
    }
}

// ─── Churn schedule ──────────────────────────────────────────────────────────

/// Step-function churn probability from consecutive loss weeks: 5% after one
/// loss week, 15% after three, 40% after six, 70% after nine, plus a flat
/// 10% when the week's profit is deeply negative. Capped at 90%.
pub fn churn_probability(
    consecutive_loss_weeks: u32,
    current_profit: f64,
    params: &SimulationParams,
) -> f64 {
    let mut prob: f64 = 0.0;
    if consecutive_loss_weeks > 0 {
        prob = 0.05;
    }
    if consecutive_loss_weeks > 2 {
        prob = 0.15;
    }
    if consecutive_loss_weeks > 5 {
        prob = 0.40;
    }
    if consecutive_loss_weeks > 8 {
        prob = 0.70;
    }
    if current_profit < -params.churn_threshold {
        prob += 0.1;
    }
    prob.min(MAX_CHURN_PROB)
}

/// Mean profit across the ledger; zero for an empty pool.
pub fn average_profit(profits: &HashMap<u32, f64>) -> f64 {
    if profits.is_empty() {
        return 0.0;
    }
    profits.values().sum::<f64>() / profits.len() as f64
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimulationParams {
        SimulationParams { initial_providers: 50, ..Default::default() }
    }

    #[test]
    fn test_initialise_counts() {
        let mut rng = RandomSource::new(1);
        let pool = ProviderPool::initialise(&mut rng, &params());
        assert_eq!(pool.active_count(), 50);
        assert_eq!(pool.pending_count(), 0);
        assert_eq!(pool.churned_count(), 0);
    }

    #[test]
    fn test_spawn_floors_hold() {
        let mut rng = RandomSource::new(2);
        let p = SimulationParams {
            base_capacity_per_provider: 1.0,
            capacity_std_dev: 5.0,
            provider_cost_per_week: 0.01,
            cost_std_dev: 5.0,
            ..params()
        };
        let mut pool = ProviderPool::default();
        for _ in 0..200 {
            pool.spawn(&mut rng, &p, 0, ProviderStatus::Active);
        }
        for agent in pool.active() {
            assert!(agent.capacity >= MIN_CAPACITY);
            assert!(agent.operational_cost >= MIN_COST);
        }
    }

    #[test]
    fn test_urban_crowding_score() {
        let mut rng = RandomSource::new(3);
        let mut pool = ProviderPool::default();
        for _ in 0..300 {
            pool.spawn(&mut rng, &params(), 0, ProviderStatus::Active);
        }
        for agent in pool.active() {
            match agent.kind {
                ProviderKind::Rural => assert_eq!(agent.location_score, 1.0),
                ProviderKind::Urban => {
                    // 2-5+ neighbors puts the score well below 1/3.
                    assert!(agent.location_score < 0.34, "score {}", agent.location_score);
                    assert!(agent.location_score > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_urban_share_roughly_configured() {
        let mut rng = RandomSource::new(4);
        let mut pool = ProviderPool::default();
        for _ in 0..2000 {
            pool.spawn(&mut rng, &params(), 0, ProviderStatus::Active);
        }
        let share = pool.urban_count() as f64 / pool.active_count() as f64;
        assert!((share - 0.3).abs() < 0.05, "urban share {}", share);
    }

    #[test]
    fn test_churn_probability_monotonic() {
        let p = params();
        let one = churn_probability(1, -10.0, &p);
        let ten = churn_probability(10, -10.0, &p);
        assert!(ten > one);
        assert!(ten <= MAX_CHURN_PROB);
    }

    #[test]
    fn test_churn_probability_zero_without_losses() {
        let p = params();
        assert_eq!(churn_probability(0, 5.0, &p), 0.0);
    }

    #[test]
    fn test_retire_terminal() {
        let mut rng = RandomSource::new(5);
        let mut pool = ProviderPool::default();
        let id = pool.spawn(&mut rng, &params(), 0, ProviderStatus::Active);
        assert!(pool.retire(id));
        assert!(!pool.retire(id), "churned is terminal");
        assert_eq!(pool.churned_count(), 1);
    }

    #[test]
    fn test_churn_cap_enforced() {
        let mut rng = RandomSource::new(6);
        let p = SimulationParams {
            initial_providers: 100,
            max_provider_churn_rate: 0.1,
            ..Default::default()
        };
        let mut pool = ProviderPool::initialise(&mut rng, &p);
        // Deep sustained losses push every agent toward the 90% cap.
        let losses: HashMap<u32, f64> = (0..100).map(|id| (id, -1000.0)).collect();
        for week in 1..=3 {
            let before = pool.active_count();
            let outcome = pool.decide(&losses, &p, week, &mut rng);
            let cap = (before as f64 * p.max_provider_churn_rate).floor() as u32;
            assert!(outcome.churn_count <= cap, "churn {} exceeds cap {}", outcome.churn_count, cap);
        }
    }

    #[test]
    fn test_pending_graduate_after_lead_time() {
        let mut rng = RandomSource::new(7);
        let p = SimulationParams { hardware_lead_time: 4, ..params() };
        let mut pool = ProviderPool::default();
        pool.spawn(&mut rng, &p, 2, ProviderStatus::Pending);
        let profits = HashMap::new();

        let early = pool.decide(&profits, &p, 5, &mut rng);
        assert_eq!(early.join_count, 0);
        assert_eq!(pool.pending_count(), 1);

        let on_time = pool.decide(&profits, &p, 6, &mut rng);
        assert_eq!(on_time.join_count, 1);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_profitable_pool_attracts_joins() {
        let mut rng = RandomSource::new(8);
        let p = SimulationParams {
            initial_providers: 100,
            profit_threshold_to_join: 20.0,
            max_provider_growth_rate: 0.1,
            ..Default::default()
        };
        let mut pool = ProviderPool::initialise(&mut rng, &p);
        let profits: HashMap<u32, f64> = (0..100).map(|id| (id, 100.0)).collect();
        pool.decide(&profits, &p, 1, &mut rng);
        // Attractiveness saturates at 1, so growth is capped at 10%.
        assert!(pool.pending_count() > 0);
        assert!(pool.pending_count() <= 10);
    }

    #[test]
    fn test_mass_join_surge() {
        let mut rng = RandomSource::new(9);
        let p = SimulationParams {
            initial_providers: 60,
            scenario: crate::types::Scenario::MassJoin,
            t_weeks: 52,
            ..Default::default()
        };
        let mut pool = ProviderPool::initialise(&mut rng, &p);
        let profits: HashMap<u32, f64> = (0..60).map(|id| (id, 0.0)).collect();

        pool.decide(&profits, &p, 16, &mut rng);
        assert_eq!(pool.pending_count(), 0, "no surge before week T/3");

        pool.decide(&profits, &p, 17, &mut rng);
        assert!(
            pool.pending_count() >= 100,
            "surge should inject ~2x active, got {}",
            pool.pending_count()
        );
    }

    #[test]
    fn test_empty_pool_noop() {
        let mut rng = RandomSource::new(10);
        let mut pool = ProviderPool::default();
        let outcome = pool.decide(&HashMap::new(), &params(), 1, &mut rng);
        assert_eq!(outcome.churn_count, 0);
        assert_eq!(outcome.join_count, 0);
        assert_eq!(average_profit(&HashMap::new()), 0.0);
    }
}
