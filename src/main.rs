use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use refsteal::{Harness, HarnessConfig, ResourceLimits};

#[derive(Parser)]
#[command(name = "refsteal", version, about = "Reference-count ownership checks for container mutation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every registered scenario with the container it exercises.
    List,
    /// Run scenarios and report whether each met its expectation.
    Run {
        /// Only run scenarios whose name contains this substring.
        #[arg(short, long)]
        filter: Option<String>,
        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
        /// JSON file with `max_allocations` / `max_memory` limits for each scenario.
        #[arg(long, value_name = "FILE")]
        limits: Option<PathBuf>,
        /// Stop after the first failing scenario.
        #[arg(long)]
        fail_fast: bool,
    },
}

fn main() {
    refsteal::logging::init();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    }
}

/// Returns whether every selected scenario passed.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    match cli.command {
        Command::List => {
            cmd_list();
            Ok(true)
        }
        Command::Run {
            filter,
            json,
            limits,
            fail_fast,
        } => {
            let limits = match limits {
                Some(path) => read_limits(&path)?,
                None => ResourceLimits::default(),
            };
            let config = HarnessConfig {
                filter,
                fail_fast,
                limits,
            };
            cmd_run(config, json)
        }
    }
}

fn cmd_list() {
    let harness = Harness::default();
    for scenario in harness.scenarios() {
        println!("{:<6} {}", scenario.container, scenario.name);
    }
}

fn cmd_run(config: HarnessConfig, json: bool) -> Result<bool> {
    let harness = Harness::new(config);
    let report = harness.run();
    if json {
        println!("{}", report.to_json().context("serialize report")?);
    } else {
        println!("{report}");
    }
    Ok(report.all_passed())
}

fn read_limits(path: &Path) -> Result<ResourceLimits> {
    let text = fs::read_to_string(path).with_context(|| format!("read limits file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse limits file {}", path.display()))
}
