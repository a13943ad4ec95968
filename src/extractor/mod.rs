/// Marker-delimited payload location
pub mod marker;

/// Sources of raw log entries
pub mod source;

/// Event extraction from log entries
pub mod event_extractor;

pub use event_extractor::{EventExtractor, ExtractionReport};
pub use source::{FileSource, LogSource, TextSource};
