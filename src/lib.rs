// Copyright 2026 Hypermesh Foundation. All rights reserved.
// DePIN Stress Suite - Engine

pub mod config;
pub mod demand;
pub mod metrics;
pub mod monte_carlo;
pub mod providers;
pub mod rng;
pub mod shock;
pub mod simulation;
pub mod types;

pub use config::{ConfigError, SimulationParams};
pub use monte_carlo::{run_simulation, run_with_cancel, EngineError};
pub use providers::{churn_probability, ProviderPool};
pub use rng::RandomSource;
pub use shock::LiquidityPool;
pub use simulation::{simulate_one, Trajectory};
pub use types::*;
