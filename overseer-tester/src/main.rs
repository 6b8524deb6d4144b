mod scenarios;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;

use scenarios::{ScenarioCtx, all_scenarios};

#[derive(Debug, Parser)]
#[command(name = "overseer-tester", version = "0.1.0")]
#[command(about = "Scenario-driven QA for the Overseer progression core")]
struct Args {
    /// Scenario to run, or "all"
    #[arg(long, default_value = "all")]
    scenario: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Seed for deterministic runs
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Directory for scenarios that exercise on-disk storage
    /// (defaults to a scratch directory under the system temp dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let scenarios = all_scenarios();

    if args.list {
        println!("Available scenarios:");
        for scenario in &scenarios {
            println!("  {:<16} {}", scenario.name.bold(), scenario.description);
        }
        return Ok(());
    }

    let selected: Vec<_> = if args.scenario == "all" {
        scenarios.iter().collect()
    } else {
        let matched: Vec<_> = scenarios
            .iter()
            .filter(|scenario| scenario.name == args.scenario)
            .collect();
        if matched.is_empty() {
            bail!(
                "unknown scenario '{}' (try --list for the available set)",
                args.scenario
            );
        }
        matched
    };

    let data_dir = args
        .data_dir
        .unwrap_or_else(|| std::env::temp_dir().join("overseer-tester"));
    let ctx = ScenarioCtx {
        seed: args.seed,
        data_dir,
    };

    let mut failures = 0usize;
    for scenario in &selected {
        let started = Instant::now();
        match (scenario.run)(&ctx) {
            Ok(()) => {
                println!(
                    "{} {:<16} ({} ms)",
                    "PASS".green().bold(),
                    scenario.name,
                    started.elapsed().as_millis()
                );
            }
            Err(err) => {
                failures += 1;
                println!("{} {:<16} {err:#}", "FAIL".red().bold(), scenario.name);
            }
        }
    }

    println!(
        "\n{} passed, {} failed (seed {})",
        selected.len() - failures,
        failures,
        ctx.seed
    );
    if failures > 0 {
        bail!("{failures} scenario(s) failed");
    }
    Ok(())
}
