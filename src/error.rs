use thiserror::Error;

/// Errors raised while pulling embedded events out of log entries
///
/// `Io` and `InputDecode` describe failures to access the log file as a whole.
/// The remaining variants describe why a single entry was skipped; they are
/// collected for diagnostics and never returned from a batch extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode log entries: {0}")]
    InputDecode(String),

    #[error("Log entry does not have the expected shape: {0}")]
    MalformedEntry(String),

    #[error("Start marker not found in log text")]
    MarkerNotFound,

    #[error("Embedded message is not valid JSON: {0}")]
    DecodeFailure(String),

    #[error("Embedded message is missing a required field: {0}")]
    MissingField(String),

    #[error("Event timestamp '{0}' does not match the expected format")]
    InvalidTimestamp(String),
}

/// Errors produced by the KPI aggregator
///
/// The `Display` text is the message carried in the `{"error": ...}` result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Invalid JSON input received by analysis tool.")]
    InvalidInput,

    #[error("No '{0}' events found for analysis.")]
    NoMatchingEvents(String),

    #[error("Invalid timestamp '{value}' in '{kind}' event; expected format {format}.")]
    InvalidTimestamp {
        value: String,
        kind: String,
        format: String,
    },
}

/// Errors that can occur when converting a duration string to seconds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("Duration string is empty")]
    Empty,

    #[error("Expected 2 or 3 colon-separated components, found {0}")]
    WrongArity(usize),

    #[error("Invalid duration component: '{0}'")]
    InvalidComponent(String),

    #[error("Duration '{0}' does not fit in 64 bits of seconds")]
    Overflow(String),
}

/// Errors that can occur while loading the exclusive state table
#[derive(Error, Debug)]
pub enum StateTableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column not found: {0}")]
    MissingColumn(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
