use crate::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the pipeline
///
/// Every section falls back to its defaults when omitted from the file, so an
/// empty TOML document yields the same configuration as `Config::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for pulling embedded events out of log entries
    pub extractor: ExtractorConfig,
    /// Settings for the KPI computation
    pub analysis: AnalysisConfig,
    /// Settings for the exclusive state CSV export
    pub states: StatesConfig,
}

/// Markers and filters used by the event extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Literal text that precedes the embedded message
    pub start_marker: String,
    /// Literal text that follows the embedded message, if present
    pub end_marker: String,
    /// Events with this `EventName` are dropped
    pub excluded_event: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            start_marker: "RabbitMQ [SendMessage] -- Sent message: ".to_string(),
            end_marker: " to exchange:".to_string(),
            excluded_event: "KPIInitialLoad".to_string(),
        }
    }
}

/// Event kind tracked by the KPI aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub target_event: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_event: "ProductionTotalPartCount".to_string(),
        }
    }
}

/// Layout of the exclusive state CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatesConfig {
    /// Number of preamble lines before the header row
    pub header_row: usize,
    /// Column naming the production line of each row
    pub production_line_column: String,
    /// Column holding the total duration, followed by the total occurrence count
    pub total_column: String,
    /// States to read; each is a duration column followed by its occurrence column
    pub state_names: Vec<String>,
}

impl Default for StatesConfig {
    fn default() -> Self {
        let state_names = [
            "Cycling",
            "Starved",
            "Blocked",
            "Waiting Aux",
            "Paused",
            "Overcycle",
            "Production Hold",
            "Bypass",
            "Break",
            "Waiting Attention",
            "Repair in Progress",
            "Manual Mode",
            "Manual Intervention",
            "Tool Change",
            "Emergency Stop",
            "Setup",
        ];

        Self {
            header_row: 5,
            production_line_column: "Description".to_string(),
            total_column: "Total".to_string(),
            state_names: state_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML for this schema, and
    /// `ConfigError::ValidationError` if a value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all markers and event kinds are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("extractor.start_marker", &self.extractor.start_marker),
            ("extractor.excluded_event", &self.extractor.excluded_event),
            ("analysis.target_event", &self.analysis.target_event),
            (
                "states.production_line_column",
                &self.states.production_line_column,
            ),
        ];

        for (name, value) in required {
            if value.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}
