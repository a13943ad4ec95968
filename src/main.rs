use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fmkpi::aggregator::KpiAggregator;
use fmkpi::config::Config;
use fmkpi::error::ConfigError;
use fmkpi::extractor::{EventExtractor, TextSource};
use fmkpi::states::StateTable;
use log::{error, info, warn};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Command-line arguments for the factory KPI pipeline
#[derive(Parser)]
#[command(
    name = "fmkpi",
    about = "Factory monitoring KPI pipeline - event extraction and production analysis",
    long_about = "Extracts message-bus events embedded in exported log files, computes production \
                  KPIs (rate, per-device readings, stall detection) over them, and cleans \
                  exclusive state CSV exports."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        global = true,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract embedded events from a JSON log export
    Extract {
        /// JSON array of log entries; read from stdin when omitted
        log_file: Option<PathBuf>,
    },
    /// Compute KPIs from an extracted event list
    Analyze {
        /// Event list produced by `extract`; read from stdin when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Extract events from a log export and analyze them in one step
    Run {
        /// JSON array of log entries
        log_file: PathBuf,
    },
    /// Load an exclusive state CSV export with durations in seconds
    States {
        /// Exclusive state CSV export
        csv_file: PathBuf,
        /// Print total seconds per state instead of per-line rows
        #[arg(long)]
        summary: bool,
    },
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

/// Load configuration, falling back to defaults on any problem
fn load_config(config_path: Option<&Path>) -> Config {
    let Some(path) = config_path else {
        info!("No configuration file specified, using defaults");
        return Config::default();
    };

    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(config) => config,
        Err(ConfigError::ReadError(_)) => {
            warn!(
                "Configuration file '{}' not found or unreadable, using defaults",
                path.display()
            );
            Config::default()
        }
        Err(e) => {
            error!("Configuration error in '{}': {}", path.display(), e);
            warn!("Using default configuration due to invalid config file");
            Config::default()
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to encode output")?;
    println!("{}", text);
    Ok(())
}

/// Re-encode a hand-off list for display without altering its content
fn print_encoded(encoded: &str, pretty: bool) -> Result<()> {
    if !pretty {
        println!("{}", encoded);
        return Ok(());
    }
    let value: serde_json::Value =
        serde_json::from_str(encoded).context("Extracted event list is not valid JSON")?;
    print_json(&value, true)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn run(cli: &Cli, config: Config) -> Result<()> {
    let extractor = EventExtractor::new(config.extractor);
    let aggregator = KpiAggregator::new(config.analysis);

    match &cli.command {
        Command::Extract { log_file } => {
            let encoded = match log_file {
                Some(path) => extractor.extract_to_json(path),
                None => {
                    let text = read_input(None)?;
                    extractor.extract_source_to_json(&TextSource::new(text))
                }
            };
            print_encoded(&encoded, cli.pretty)
        }
        Command::Analyze { input } => {
            let encoded = read_input(input.as_deref())?;
            print_json(&aggregator.aggregate(&encoded), cli.pretty)
        }
        Command::Run { log_file } => {
            let encoded = extractor.extract_to_json(log_file);
            print_json(&aggregator.aggregate(&encoded), cli.pretty)
        }
        Command::States { csv_file, summary } => {
            let table = StateTable::from_path(csv_file, &config.states)
                .with_context(|| format!("Failed to load state export {}", csv_file.display()))?;
            if *summary {
                let totals: serde_json::Map<String, serde_json::Value> = table
                    .total_seconds_by_state()
                    .into_iter()
                    .map(|(state, seconds)| (state, seconds.into()))
                    .collect();
                print_json(&totals, cli.pretty)
            } else {
                print_json(&table, cli.pretty)
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config = load_config(cli.config.as_deref());

    if let Err(e) = run(&cli, config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
