/// Error types for the pipeline
pub mod error;

/// Log entry and event record types
pub mod events;

/// Embedded event extraction from log exports
pub mod extractor;

/// Production KPI aggregation
pub mod aggregator;

/// Exclusive state durations and CSV loading
pub mod states;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{AnalysisError, ConfigError, DurationError, ExtractError, StateTableError};
