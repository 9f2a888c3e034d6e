//! collatz-pool driver
//!
//! Sweeps the configured worker counts over one fixed input range and prints
//! a summary per run.

use clap::{Arg, ArgAction, Command};
use collatz_pool::core::config::{OutputFormat, ThreadCount};
use collatz_pool::core::logging;
use collatz_pool::system::metrics;
use collatz_pool::{Config, Error, ParallelAggregator, Result, RunSummary, StepCounter};
use std::path::Path;
use tracing::{error, info};

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("collatz-pool")
        .version(collatz_pool::VERSION)
        .about("Parallel Collatz step-count aggregation over a worker pool.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("numbers")
                .short('n')
                .long("numbers")
                .value_name("N")
                .help("Process the integers 1..=N")
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("LIST")
                .help("Comma-separated worker counts to sweep, e.g. 1,2,4,auto")
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_name("K")
                .help("Fail a run when any input needs more than K steps")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Result format (text, json)")
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .action(ArgAction::SetTrue)
                .help("Print Prometheus metrics after the sweep")
        )
        .get_matches();

    // Load configuration
    let mut config = Config::load_from(matches.get_one::<String>("config").map(Path::new))?;

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging
    logging::init(&config.logging);
    metrics::init_registry();

    info!("Starting {} v{}", collatz_pool::NAME, collatz_pool::VERSION);

    let aggregator = ParallelAggregator::new(StepCounter::from_limit(config.workload.max_iterations))
        .with_queue_capacity(config.workload.queue_capacity);

    let numbers = config.workload.numbers;
    for workers in config.resolved_thread_counts() {
        if config.output.format == OutputFormat::Text {
            println!("\nRunning with {} workers...", workers);
        }

        match aggregator.run(numbers, workers) {
            Ok(summary) => print_summary(&summary, config.output.format)?,
            Err(e) => {
                // One bad run must not end the sweep
                error!(workers, error = %e, "Run failed");
                eprintln!("Error: {}", e);
            }
        }
    }

    if config.metrics.enabled {
        print!("{}", metrics::collect_metrics());
    }

    info!("Sweep complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(numbers) = matches.get_one::<String>("numbers") {
        config.workload.numbers = numbers.parse()
            .map_err(|e| Error::config(format!("Invalid number count: {}", e)))?;
    }

    if let Some(threads) = matches.get_one::<String>("threads") {
        config.workload.thread_counts = ThreadCount::parse_list(threads)?;
    }

    if let Some(limit) = matches.get_one::<String>("max-iterations") {
        config.workload.max_iterations = Some(limit.parse()
            .map_err(|e| Error::config(format!("Invalid iteration limit: {}", e)))?);
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if let Some(format) = matches.get_one::<String>("format") {
        config.output.format = format.parse()?;
    }

    if matches.get_flag("metrics") {
        config.metrics.enabled = true;
    }

    Ok(())
}

/// Render one run summary to stdout
fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Average steps: {:.2}", summary.mean_steps);
            println!(
                "Largest: {} with {} steps",
                summary.max_number, summary.max_steps
            );
            println!(
                "Processed {} numbers in {:.3}s",
                summary.processed_count,
                summary.elapsed.as_secs_f64()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(summary)?);
        }
    }
    Ok(())
}
