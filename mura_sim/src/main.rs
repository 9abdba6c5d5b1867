//! MÜRA viewer simulator CLI
//!
//! Replays viewer scenarios deterministically and reports pass/fail.

use clap::Parser;
use mura_core::{RecenterPolicy, ViewerConfig};
use mura_env::TokioContext;
use mura_sim::scenarios::ScenarioId;
use mura_sim::{ScenarioResult, ScenarioRunner, SimConfig, ViewerExport};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Upper bound for `--max-path-len` and `--steps`.
const MAX_CLI_POINTS: i64 = 5_000;

/// MÜRA live position viewer simulator
#[derive(Parser, Debug)]
#[command(name = "mura-sim")]
#[command(about = "Run deterministic viewer scenarios for MÜRA", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Scenario to run (walk, follow, partial, late, early, drift, overflow, outage, invalid_link, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Share-link query string, e.g. "?id=abc123"
    #[arg(long)]
    link: Option<String>,

    /// Recenter mode (follow, free-roam)
    #[arg(short, long, default_value = "follow")]
    mode: String,

    /// Free-roam recenter threshold in meters
    #[arg(long)]
    threshold_m: Option<f64>,

    /// Maximum number of points kept in the path
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u32).range(1..=MAX_CLI_POINTS))]
    max_path_len: u32,

    /// Points per simulated route
    #[arg(long, default_value = "40", value_parser = clap::value_parser!(u32).range(0..=MAX_CLI_POINTS))]
    steps: u32,

    /// Per-axis jitter of the simulated walk, in degrees
    #[arg(long, default_value = "0.0008")]
    delta: f64,

    /// Tick cadence of the simulated walk
    #[arg(long, default_value = "1200")]
    interval_ms: u64,

    /// Sleep on the real clock instead of the virtual one
    #[arg(long)]
    realtime: bool,

    /// Verbose output (logs every render command)
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the command log of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn parse_mode(args: &Args) -> Result<RecenterPolicy, String> {
    let mode: RecenterPolicy = args.mode.parse()?;
    match (mode, args.threshold_m) {
        (RecenterPolicy::FreeRoam { .. }, Some(t)) if t.is_finite() && t >= 0.0 => {
            Ok(RecenterPolicy::FreeRoam { threshold_m: t })
        }
        (RecenterPolicy::FreeRoam { .. }, Some(t)) => Err(format!("Invalid threshold: {}", t)),
        (RecenterPolicy::Follow, Some(_)) => Err("--threshold-m requires --mode free-roam".to_string()),
        (mode, None) => Ok(mode),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("MÜRA viewer simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!(
                "Available scenarios: {}, all",
                ScenarioId::all().iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
            );
            std::process::exit(1);
        })]
    };

    let recenter = parse_mode(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        eprintln!("Error: --export only supports a single scenario and seed");
        std::process::exit(1);
    }

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let viewer = ViewerConfig::default()
        .with_recenter(recenter)
        .with_max_path_len(args.max_path_len as usize);

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(SimConfig {
            seed,
            steps: args.steps as usize,
            delta_deg: args.delta,
            interval: Duration::from_millis(args.interval_ms),
            link: args.link.clone(),
            log_commands: args.verbose && !args.json,
        })
        .with_viewer_config(viewer.clone());

        for scenario in &scenarios {
            let result = if args.realtime {
                runner.run_with(TokioContext::shared(), *scenario).await
            } else {
                runner.run(*scenario).await
            };

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}, mode={}) PASSED | accepted={} path={}",
                        scenario.name(),
                        seed,
                        result.mode.name(),
                        result.stats.accepted,
                        result.final_path.len()
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    if let Some(export_path) = &args.export {
        if let Some(result) = all_results.first() {
            match ViewerExport::from_result(result).write_to_file(export_path) {
                Ok(()) => info!("Exported {} steps to {}", result.steps.len(), export_path),
                Err(e) => {
                    error!("Failed to write export: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "session": r.session,
                    "mode": r.mode.name(),
                    "passed": r.passed,
                    "events": r.stats.events,
                    "accepted": r.stats.accepted,
                    "path_len": r.final_path.len(),
                    "time_secs": r.elapsed_secs,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_counts_are_bounded() {
        assert!(Args::try_parse_from(["mura-sim", "--max-path-len", "0"]).is_err());
        assert!(Args::try_parse_from(["mura-sim", "--max-path-len", "18446744073709551615"]).is_err());
        assert!(Args::try_parse_from(["mura-sim", "--steps", "5001"]).is_err());

        let args = Args::try_parse_from(["mura-sim", "--max-path-len", "5000", "--steps", "0"]).unwrap();
        assert_eq!(args.max_path_len, 5000);
        assert_eq!(args.steps, 0);
    }
}
