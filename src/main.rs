// Storefront Dataset Generator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/storefront-datagen generate --sessions sessions.csv --output-dir out/
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/storefront-datagen --config datagen.json --seed 42 --verbose \
//     generate --sessions sessions.csv
// ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::process;
use storefront_datagen::simulation::{
    LoggingConfig, LoggingError, RunOrchestrator, RunStatistics, StageRequest,
};
use storefront_datagen::storage::{CsvSessionSource, LocalBlobStore, SchemaCheckingLoader};
use storefront_datagen::types::{CliArgs, Command, GeneratorConfig};
use tracing::{error, info};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    if args.print_config {
        match GeneratorConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = init_logging(&args) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Starting Storefront Dataset Generator");

    // Load configuration from CLI arguments and optional config file
    let config = match GeneratorConfig::from_cli_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - nothing will be generated or written.");
        print_configuration_summary(&config);
        if let Some(command) = &args.command {
            if let Err(e) = check_inputs(command) {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
            eprintln!("All inputs are readable.");
        }
        return;
    }

    if let Some(path) = &args.save_config {
        if let Err(e) = config.save_to_file(path) {
            error!("Failed to save configuration: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        info!("Saved effective configuration to {}", path.display());
        if args.command.is_none() {
            return;
        }
    }

    let Some(command) = args.command else {
        eprintln!("No command given. Run with --help to see the available commands.");
        process::exit(2);
    };

    print_startup_banner(&config);

    match run(config, command) {
        Ok(stats) => {
            print!("{}", stats.summary_report());
            info!("Storefront Dataset Generator completed successfully");
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(args: &CliArgs) -> Result<(), LoggingError> {
    let mut logging = LoggingConfig::from_flags(args.verbose, args.debug);
    if args.log_json {
        logging = logging.with_json_format();
    }
    if let Some(directory) = &args.log_dir {
        logging = logging.with_file_logging(directory.clone());
    }
    logging.init()
}

/// Run one command
fn run(config: GeneratorConfig, command: Command) -> Result<RunStatistics> {
    let orchestrator = RunOrchestrator::new(config).context("Invalid configuration")?;

    let stats = match command {
        Command::Generate { sessions, output_dir } => {
            eprintln!("Generating registrations and orders from {}...", sessions.display());
            let source = CsvSessionSource::new(&sessions);
            orchestrator
                .generate(&source, &output_dir)
                .with_context(|| format!("Failed to generate from {}", sessions.display()))?
        }
        Command::Registrations { sessions, output } => {
            eprintln!("Generating registrations from {}...", sessions.display());
            let source = CsvSessionSource::new(&sessions);
            orchestrator
                .registrations(&source, &output)
                .with_context(|| format!("Failed to generate registrations into {}", output.display()))?
        }
        Command::Orders { sessions, registrations, output } => {
            eprintln!("Generating orders from {}...", sessions.display());
            let source = CsvSessionSource::new(&sessions);
            orchestrator
                .orders(&source, &registrations, &output)
                .with_context(|| format!("Failed to generate orders into {}", output.display()))?
        }
        Command::Normalize { input, output, .. } => {
            eprintln!("Normalizing {}...", input.display());
            orchestrator
                .normalize(&input, &output)
                .with_context(|| format!("Failed to normalize {}", input.display()))?
        }
        Command::Stage { sessions, registrations, transactions, bucket, write_mode } => {
            let request = StageRequest { sessions, registrations, transactions, write_mode };
            if request.is_empty() {
                bail!("Nothing to stage: pass --sessions, --registrations or --transactions");
            }
            eprintln!("Staging extracts into {}...", bucket.display());
            let store = LocalBlobStore::open(&bucket)
                .with_context(|| format!("Failed to open bucket {}", bucket.display()))?;
            let mut loader = SchemaCheckingLoader::new();
            orchestrator.stage(&request, &store, &mut loader).context("Staging failed")?
        }
    };

    eprintln!("Run completed!");
    Ok(stats)
}

/// Check that every input file of `command` exists
fn check_inputs(command: &Command) -> Result<()> {
    let inputs: Vec<&Path> = match command {
        Command::Generate { sessions, .. } | Command::Registrations { sessions, .. } => {
            vec![sessions.as_path()]
        }
        Command::Orders { sessions, registrations, .. } => {
            vec![sessions.as_path(), registrations.as_path()]
        }
        Command::Normalize { input, .. } => vec![input.as_path()],
        Command::Stage { sessions, registrations, transactions, .. } => {
            [sessions, registrations, transactions]
                .into_iter()
                .flatten()
                .map(|p| p.as_path())
                .collect()
        }
    };

    for input in inputs {
        if !input.is_file() {
            bail!("Input file not found: {}", input.display());
        }
    }
    Ok(())
}

/// Print startup banner
fn print_startup_banner(config: &GeneratorConfig) {
    eprintln!("Storefront Dataset Generator");
    eprintln!("============================");
    eprintln!("Synthetic registrations, orders and deliveries from session data");
    eprintln!();
    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &GeneratorConfig) {
    eprintln!("Configuration:");
    eprintln!("  Registration Count: {}", config.registration_count);
    eprintln!(
        "  First-Time Purchase Rate: {:.0}%-{:.0}%",
        config.first_time_purchase_rate.min * 100.0,
        config.first_time_purchase_rate.max * 100.0
    );
    eprintln!(
        "  Returning Purchase Rate: {:.0}%-{:.0}%",
        config.returning_purchase_rate.min * 100.0,
        config.returning_purchase_rate.max * 100.0
    );
    eprintln!(
        "  Locations: {} ({} priority, drawn {:.0}% of the time)",
        config.location_count,
        config.priority_location_count,
        config.priority_location_probability * 100.0
    );
    eprintln!(
        "  Business Hours: {:02}:00-{:02}:00",
        config.business_hours.start_hour, config.business_hours.end_hour
    );
    eprintln!("  Shipping Options: {}", config.shipping_options.len());
    eprintln!("  Timestamp Columns: {}", config.normalizer.timestamp_columns.join(", "));
    eprintln!("  Max Bad Records: {}", config.normalizer.max_bad_records);
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}
