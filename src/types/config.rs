//! Configuration for the dataset generator
//!
//! Settings are layered: built-in defaults, then an optional JSON configuration file
//! (every field optional), then command line overrides.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cohort::RateRange;
use crate::delivery::BusinessHours;
use crate::normalize::NormalizerConfig;
use crate::shipping::{default_shipping_options, ShippingOption};
use crate::storage::WriteMode;

/// Command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "storefront-datagen",
    version,
    about = "Generates synthetic registrations and orders from web session extracts",
    long_about = "Generates synthetic e-commerce data from a table of web sessions: user registrations, \
orders with shipping assignments and delivery timelines. Also normalizes raw session extracts and \
stages CSVs for bulk loading.

EXAMPLES:
    # Generate registrations.csv and transactions.csv next to the sessions file
    storefront-datagen generate --sessions sessions.csv --output-dir out/

    # Reproducible run with a config file
    storefront-datagen --config datagen.json --seed 42 generate --sessions sessions.csv

    # Repair timestamps and metadata in a raw extract
    storefront-datagen normalize --input raw_sessions.csv --output sessions.csv

    # Stage extracts into a local bucket and check them against the table schemas
    storefront-datagen stage --sessions sessions.csv --registrations registrations.csv \\
        --transactions transactions.csv --bucket bucket/

    # Generate a configuration template
    storefront-datagen --print-config > datagen.json

CONFIGURATION:
    1. Command line arguments (highest priority)
    2. Configuration file (--config, JSON)
    3. Default values (lowest priority)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Number of visits to register
    #[arg(long, global = true)]
    pub registration_count: Option<usize>,

    /// Size of the shipping location pool
    #[arg(long, global = true)]
    pub location_count: Option<usize>,

    /// Number of priority locations inside the pool
    #[arg(long, global = true)]
    pub priority_location_count: Option<usize>,

    /// Probability of drawing from the priority locations (0.0-1.0)
    #[arg(long, global = true)]
    pub priority_location_probability: Option<f64>,

    /// Malformed rows tolerated by the loader
    #[arg(long, global = true)]
    pub max_bad_records: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Log as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Validate configuration and inputs without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the default configuration in JSON format and exit
    #[arg(long)]
    pub print_config: bool,

    /// Write the effective configuration, file and flags applied, to this JSON file
    #[arg(long, global = true)]
    pub save_config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate registrations and orders from a sessions CSV
    Generate {
        /// Sessions CSV
        #[arg(long)]
        sessions: PathBuf,
        /// Directory receiving registrations.csv and transactions.csv
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate registrations only
    Registrations {
        /// Sessions CSV
        #[arg(long)]
        sessions: PathBuf,
        /// Output CSV
        #[arg(long, default_value = "registrations.csv")]
        output: PathBuf,
    },

    /// Generate orders from sessions and existing registrations
    Orders {
        /// Sessions CSV
        #[arg(long)]
        sessions: PathBuf,
        /// Registrations CSV written by an earlier run
        #[arg(long)]
        registrations: PathBuf,
        /// Output CSV
        #[arg(long, default_value = "transactions.csv")]
        output: PathBuf,
    },

    /// Repair timestamps and metadata in a raw CSV extract
    Normalize {
        /// Raw CSV
        #[arg(long)]
        input: PathBuf,
        /// Normalized CSV
        #[arg(long)]
        output: PathBuf,
        /// Timestamp columns (repeatable; replaces the configured list)
        #[arg(long = "timestamp-column")]
        timestamp_columns: Vec<String>,
        /// Metadata column (replaces the configured one)
        #[arg(long)]
        metadata_column: Option<String>,
    },

    /// Upload extracts to a local bucket and load them into schema-checked tables
    Stage {
        /// Sessions CSV (normalized before upload)
        #[arg(long)]
        sessions: Option<PathBuf>,
        /// Registrations CSV
        #[arg(long)]
        registrations: Option<PathBuf>,
        /// Transactions CSV
        #[arg(long)]
        transactions: Option<PathBuf>,
        /// Bucket directory
        #[arg(long)]
        bucket: PathBuf,
        /// How existing table rows are treated
        #[arg(long, value_enum, default_value_t = WriteMode::Truncate)]
        write_mode: WriteMode,
    },
}

/// Configuration file structure (every field optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Number of visits to register
    pub registration_count: Option<usize>,
    /// Range the first-time purchase rate is drawn from
    pub first_time_purchase_rate: Option<RateRange>,
    /// Range the returning purchase rate is drawn from
    pub returning_purchase_rate: Option<RateRange>,
    /// Size of the shipping location pool
    pub location_count: Option<usize>,
    /// Number of priority locations
    pub priority_location_count: Option<usize>,
    /// Probability of drawing from the priority locations
    pub priority_location_probability: Option<f64>,
    /// Delivery window
    pub business_hours: Option<BusinessHours>,
    /// Shipping catalog
    pub shipping_options: Option<Vec<ShippingOption>>,
    /// Random seed
    pub seed: Option<u64>,
    /// Normalizer columns and loader tolerance
    pub normalizer: Option<NormalizerConfig>,
}

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of visits to register
    pub registration_count: usize,
    /// Range the first-time purchase rate is drawn from, once per run
    pub first_time_purchase_rate: RateRange,
    /// Range the returning purchase rate is drawn from, once per run
    pub returning_purchase_rate: RateRange,
    /// Size of the shipping location pool
    pub location_count: usize,
    /// Number of priority locations inside the pool
    pub priority_location_count: usize,
    /// Probability of drawing from the priority locations
    pub priority_location_probability: f64,
    /// Delivery window
    pub business_hours: BusinessHours,
    /// Shipping catalog
    pub shipping_options: Vec<ShippingOption>,
    /// Random seed; a fresh entropy seed is used when absent
    pub seed: Option<u64>,
    /// Normalizer columns and loader tolerance
    pub normalizer: NormalizerConfig,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for the generator configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    /// Registration count is invalid
    #[error("Registration count must be greater than 0, got {0}")]
    InvalidRegistrationCount(usize),

    /// Location count is invalid
    #[error("Location count must be greater than 0, got {0}")]
    InvalidLocationCount(usize),

    /// More priority locations than locations
    #[error("Priority location count ({priority}) exceeds location count ({locations})")]
    InvalidPriorityCount {
        /// Configured priority locations
        priority: usize,
        /// Configured locations
        locations: usize,
    },

    /// Probability value is out of range
    #[error("Invalid probability for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidPercentage {
        /// Name of the field
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Rate range is out of order or out of bounds
    #[error("Invalid rate range for {field}: [{min}, {max}] (need 0.0 <= min <= max <= 1.0)")]
    InvalidRateRange {
        /// Name of the field
        field: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Business hours do not describe a window inside a day
    #[error("Invalid business hours: {start}:00-{end}:00")]
    InvalidBusinessHours {
        /// Opening hour
        start: u32,
        /// Closing hour
        end: u32,
    },

    /// Shipping catalog is empty
    #[error("Shipping catalog must contain at least one option")]
    EmptyShippingCatalog,

    /// Shipping option is unnamed or has an inverted transit window
    #[error("Invalid shipping option #{index}: {option}")]
    InvalidShippingOption {
        /// Position in the catalog
        index: usize,
        /// The option as displayed
        option: String,
    },

    /// No timestamp columns to normalize
    #[error("Normalizer needs at least one timestamp column")]
    NoTimestampColumns,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            registration_count: 3_000,
            first_time_purchase_rate: RateRange::new(0.20, 0.30),
            returning_purchase_rate: RateRange::new(0.10, 0.30),
            location_count: 15,
            priority_location_count: 4,
            priority_location_probability: 0.5,
            business_hours: BusinessHours::default(),
            shipping_options: default_shipping_options(),
            seed: None,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(args);
        Ok(config)
    }

    /// Load configuration from a JSON file, filling gaps with defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let content = fs::read_to_string(path)?;
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Merge a partial configuration file with defaults
    pub fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            registration_count: config_file
                .registration_count
                .unwrap_or(defaults.registration_count),
            first_time_purchase_rate: config_file
                .first_time_purchase_rate
                .unwrap_or(defaults.first_time_purchase_rate),
            returning_purchase_rate: config_file
                .returning_purchase_rate
                .unwrap_or(defaults.returning_purchase_rate),
            location_count: config_file.location_count.unwrap_or(defaults.location_count),
            priority_location_count: config_file
                .priority_location_count
                .unwrap_or(defaults.priority_location_count),
            priority_location_probability: config_file
                .priority_location_probability
                .unwrap_or(defaults.priority_location_probability),
            business_hours: config_file.business_hours.unwrap_or(defaults.business_hours),
            shipping_options: config_file.shipping_options.unwrap_or(defaults.shipping_options),
            seed: config_file.seed.or(defaults.seed),
            normalizer: config_file.normalizer.unwrap_or(defaults.normalizer),
        }
    }

    /// Apply command line overrides
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(value) = args.registration_count {
            self.registration_count = value;
        }
        if let Some(value) = args.location_count {
            self.location_count = value;
        }
        if let Some(value) = args.priority_location_count {
            self.priority_location_count = value;
        }
        if let Some(value) = args.priority_location_probability {
            self.priority_location_probability = value;
        }
        if let Some(value) = args.seed {
            self.seed = Some(value);
        }
        if let Some(value) = args.max_bad_records {
            self.normalizer.max_bad_records = value;
        }

        if let Some(Command::Normalize { timestamp_columns, metadata_column, .. }) = &args.command {
            if !timestamp_columns.is_empty() {
                self.normalizer.timestamp_columns = timestamp_columns.clone();
            }
            if let Some(column) = metadata_column {
                self.normalizer.metadata_column = Some(column.clone());
            }
        }
    }

    /// Pretty-printed JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.print_json()?)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// A shipping option with a zero-day minimum is accepted but logged: it allows
    /// deliveries that precede their order.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.registration_count == 0 {
            return Err(ConfigValidationError::InvalidRegistrationCount(self.registration_count));
        }

        if self.location_count == 0 {
            return Err(ConfigValidationError::InvalidLocationCount(self.location_count));
        }
        if self.priority_location_count > self.location_count {
            return Err(ConfigValidationError::InvalidPriorityCount {
                priority: self.priority_location_count,
                locations: self.location_count,
            });
        }
        self.validate_percentage("priority_location_probability", self.priority_location_probability)?;

        self.validate_rate_range("first_time_purchase_rate", self.first_time_purchase_rate)?;
        self.validate_rate_range("returning_purchase_rate", self.returning_purchase_rate)?;

        if !self.business_hours.is_valid() {
            return Err(ConfigValidationError::InvalidBusinessHours {
                start: self.business_hours.start_hour,
                end: self.business_hours.end_hour,
            });
        }

        if self.shipping_options.is_empty() {
            return Err(ConfigValidationError::EmptyShippingCatalog);
        }
        for (index, option) in self.shipping_options.iter().enumerate() {
            if !option.is_valid() {
                return Err(ConfigValidationError::InvalidShippingOption {
                    index,
                    option: option.to_string(),
                });
            }
            if option.min_transit_days == 0 {
                warn!("Shipping option {} allows deliveries before the order time", option);
            }
        }

        if self.normalizer.timestamp_columns.is_empty() {
            return Err(ConfigValidationError::NoTimestampColumns);
        }

        Ok(())
    }

    fn validate_percentage(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidPercentage { field: field.to_string(), value });
        }
        Ok(())
    }

    fn validate_rate_range(&self, field: &str, range: RateRange) -> Result<(), ConfigValidationError> {
        if !range.is_valid() {
            return Err(ConfigValidationError::InvalidRateRange {
                field: field.to_string(),
                min: range.min,
                max: range.max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();

        assert_eq!(config.registration_count, 3_000);
        assert_eq!(config.first_time_purchase_rate, RateRange::new(0.2, 0.3));
        assert_eq!(config.returning_purchase_rate, RateRange::new(0.1, 0.3));
        assert_eq!(config.location_count, 15);
        assert_eq!(config.priority_location_count, 4);
        assert_eq!(config.priority_location_probability, 0.5);
        assert_eq!(config.shipping_options.len(), 5);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "registration_count": 500,
            "first_time_purchase_rate": {"min": 0.5, "max": 0.5},
            "business_hours": {"start_hour": 8, "end_hour": 20},
            "seed": 12345,
            "normalizer": {"metadata_column": null}
        }"#;
        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = GeneratorConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.registration_count, 500);
        assert_eq!(config.first_time_purchase_rate, RateRange::new(0.5, 0.5));
        assert_eq!(config.business_hours, BusinessHours { start_hour: 8, end_hour: 20 });
        assert_eq!(config.seed, Some(12345));
        assert_eq!(config.normalizer.metadata_column, None);
        // Untouched fields keep their defaults.
        assert_eq!(config.location_count, 15);
        assert_eq!(config.normalizer.timestamp_columns.len(), 2);
    }

    #[test]
    fn test_config_file_errors() {
        assert!(matches!(
            GeneratorConfig::from_file("/nonexistent/datagen.json"),
            Err(ConfigError::FileNotFound(_))
        ));

        let toml = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            GeneratorConfig::from_file(toml.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let args = args(&[
            "storefront-datagen",
            "--seed",
            "7",
            "--registration-count",
            "10",
            "--max-bad-records",
            "3",
            "generate",
            "--sessions",
            "sessions.csv",
        ]);

        let config = GeneratorConfig::from_cli_args(&args).unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.registration_count, 10);
        assert_eq!(config.normalizer.max_bad_records, 3);
        assert_eq!(config.location_count, 15);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = args(&["storefront-datagen", "generate", "--sessions", "s.csv", "-v", "--seed", "1"]);

        assert!(args.verbose);
        assert_eq!(args.seed, Some(1));
        match args.command {
            Some(Command::Generate { sessions, output_dir }) => {
                assert_eq!(sessions, PathBuf::from("s.csv"));
                assert_eq!(output_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_normalize_column_overrides() {
        let args = args(&[
            "storefront-datagen",
            "normalize",
            "--input",
            "in.csv",
            "--output",
            "out.csv",
            "--timestamp-column",
            "created",
            "--timestamp-column",
            "updated",
            "--metadata-column",
            "payload",
        ]);

        let config = GeneratorConfig::from_cli_args(&args).unwrap();

        assert_eq!(config.normalizer.timestamp_columns, ["created", "updated"]);
        assert_eq!(config.normalizer.metadata_column.as_deref(), Some("payload"));
    }

    #[test]
    fn test_stage_write_mode() {
        let parsed = args(&["storefront-datagen", "stage", "--bucket", "b", "--write-mode", "append"]);
        assert!(matches!(parsed.command, Some(Command::Stage { write_mode: WriteMode::Append, .. })));

        let parsed = args(&["storefront-datagen", "stage", "--bucket", "b"]);
        assert!(matches!(parsed.command, Some(Command::Stage { write_mode: WriteMode::Truncate, .. })));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = GeneratorConfig { registration_count: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidRegistrationCount(0)));

        config = GeneratorConfig { priority_location_count: 20, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidPriorityCount { .. })));

        config = GeneratorConfig { priority_location_probability: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidPercentage { .. })));

        config = GeneratorConfig {
            returning_purchase_rate: RateRange::new(0.4, 0.1),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidRateRange { .. })));

        config = GeneratorConfig {
            business_hours: BusinessHours { start_hour: 18, end_hour: 9 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidBusinessHours { .. })));

        config = GeneratorConfig { shipping_options: vec![], ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyShippingCatalog));

        config = GeneratorConfig {
            shipping_options: vec![ShippingOption::new("carrier_1", "Ground", 7, 5)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidShippingOption { index: 0, .. })
        ));
    }

    #[test]
    fn test_zero_day_transit_is_accepted() {
        let config = GeneratorConfig {
            shipping_options: vec![ShippingOption::new("carrier_x", "Courier", 0, 1)],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = GeneratorConfig { seed: Some(99), ..Default::default() };
        let json = config.print_json().unwrap();
        let parsed: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
