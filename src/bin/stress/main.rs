// DePIN Stress Runner — Monte Carlo per scenario, derived-metric pass
// criteria, JSON report for independent analysis
//
// Usage:
//   cargo run --release --bin stress                  # all scenarios
//   cargo run --release --bin stress -- --runs 20     # quicker batches
//   cargo run --release --bin stress -- UNLOCK        # filter by name
//   cargo run --release --bin stress -- --seed 7      # custom base seed

mod report;
mod scenarios;

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use depin_engine::metrics::derived_metrics;
use depin_engine::run_simulation;

use report::{ScenarioReport, StressReport, Summary};
use scenarios::{scenarios, StressScenario};

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "stress", about = "DePIN token-economy stress runner")]
struct Cli {
    /// Trajectories per scenario.
    #[arg(long, default_value_t = 100)]
    runs: u32,

    /// Base random seed (trajectory i uses seed + i).
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output directory for the JSON report.
    #[arg(long, default_value = "stress-results")]
    out: PathBuf,

    /// Only run scenarios whose name, label or category contains this.
    filter: Option<String>,
}

// ─── Evaluation ─────────────────────────────────────────────────────────────

fn run_scenario(scenario: &StressScenario, runs: u32, seed: u64) -> ScenarioReport {
    let start = Instant::now();

    let mut params = scenario.params.clone();
    params.n_sims = runs;
    params.seed = seed;

    let output = match run_simulation(&params) {
        Ok(output) => output,
        Err(err) => {
            // Presets are validated by construction; an error here is a bug
            // in the scenario table, not in the engine.
            panic!("scenario {} rejected: {err}", scenario.name);
        }
    };

    let metrics = derived_metrics(&output.aggregate, &params);
    let last = output.aggregate.last().expect("horizon is at least one week");

    let mut failures = Vec::new();
    let c = &scenario.criteria;
    if let Some(max) = c.max_death_spiral_pct {
        if metrics.death_spiral_probability > max {
            failures.push(format!(
                "death spiral {:.1}% > {:.1}%",
                metrics.death_spiral_probability, max
            ));
        }
    }
    if let Some(min) = c.min_retention_pct {
        if metrics.retention_rate < min {
            failures.push(format!("retention {:.1}% < {:.1}%", metrics.retention_rate, min));
        }
    }
    if let Some(max) = c.max_drawdown_pct {
        if metrics.max_drawdown > max {
            failures.push(format!("drawdown {:.1}% > {:.1}%", metrics.max_drawdown, max));
        }
    }
    if let Some(min) = c.min_demand_satisfaction_pct {
        if metrics.demand_satisfaction_rate < min {
            failures.push(format!(
                "demand satisfaction {:.1}% < {:.1}%",
                metrics.demand_satisfaction_rate, min
            ));
        }
    }

    ScenarioReport {
        name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: runs,
        pass: failures.is_empty(),
        failures,
        metrics,
        final_price_mean: last.price.mean,
        final_price_p10: last.price.p10,
        final_price_p90: last.price.p90,
        final_providers_mean: last.providers.mean,
        elapsed_ms: start.elapsed().as_millis(),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let all = scenarios();

    let to_run: Vec<&StressScenario> = match &cli.filter {
        Some(f) => {
            let f = f.to_lowercase();
            all.iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f)
                        || s.label.to_lowercase().contains(&f)
                        || s.category.to_lowercase().contains(&f)
                })
                .collect()
        }
        None => all.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  DePIN Stress Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!(
        "  {:<34} {:>9} {:>9} {:>8} {:>9} {:>7}",
        "Scenario", "Retain%", "Drawdn%", "Spiral%", "FinalPx", "Time"
    );
    println!("  {}", "-".repeat(84));

    let suite_start = Instant::now();
    let mut reports = Vec::with_capacity(to_run.len());

    for scenario in &to_run {
        info!(name = scenario.name, "running scenario");
        let report = run_scenario(scenario, cli.runs, cli.seed);

        let status = if report.pass { "PASS" } else { "FAIL" };
        println!(
            "  {:<34} {:>8.1} {:>8.1} {:>8.1} {:>9.4} {:>5}ms  {}",
            report.label,
            report.metrics.retention_rate,
            report.metrics.max_drawdown,
            report.metrics.death_spiral_probability,
            report.final_price_mean,
            report.elapsed_ms,
            status,
        );
        for failure in &report.failures {
            println!("      !! {}", failure);
        }

        reports.push(report);
    }

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.pass).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(84));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total,
        passed,
        failed,
        suite_start.elapsed().as_secs_f64()
    );

    // ─── Write JSON report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let timestamp = ts.to_string();

    let report = StressReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        rng: "lcg32",
        base_seed: cli.seed,
        runs_per_scenario: cli.runs,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        scenarios: reports,
    };

    if let Err(err) = std::fs::create_dir_all(&cli.out) {
        eprintln!("Failed to create {}: {err}", cli.out.display());
        std::process::exit(1);
    }
    let path = cli.out.join(format!("stress-{timestamp}.json"));
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            if let Err(err) = std::fs::write(&path, json) {
                eprintln!("Failed to write {}: {err}", path.display());
                std::process::exit(1);
            }
            println!("  Results saved to: {}\n", path.display());
        }
        Err(err) => {
            eprintln!("Failed to serialize report: {err}");
            std::process::exit(1);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
