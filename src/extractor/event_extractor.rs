use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::events::{encode_events, EventRecord, LogEntry};
use crate::extractor::marker::extract_payload;
use crate::extractor::source::{FileSource, LogSource};
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Outcome of extracting events from one batch of log entries
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Accepted events in input order
    pub events: Vec<EventRecord>,
    /// Entries dropped because their `EventName` is the excluded kind
    pub excluded: usize,
    /// Entries that could not be turned into an event, by input index
    pub skipped: Vec<(usize, ExtractError)>,
}

impl ExtractionReport {
    /// Number of entries dropped because the start marker was absent
    pub fn without_marker(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, e)| matches!(e, ExtractError::MarkerNotFound))
            .count()
    }

    /// Number of entries dropped for any reason other than a missing marker
    pub fn malformed(&self) -> usize {
        self.skipped.len() - self.without_marker()
    }
}

/// Pulls embedded event messages out of log entries
///
/// Each entry is processed independently: the message is located between the
/// configured markers, decoded, and kept unless its `EventName` is the
/// excluded kind. A bad entry never stops the batch.
#[derive(Debug, Clone, Default)]
pub struct EventExtractor {
    config: ExtractorConfig,
}

impl EventExtractor {
    /// Create an extractor with the given markers and excluded kind
    ///
    /// # Example
    ///
    /// ```
    /// use fmkpi::config::ExtractorConfig;
    /// use fmkpi::events::LogEntry;
    /// use fmkpi::extractor::EventExtractor;
    ///
    /// let extractor = EventExtractor::new(ExtractorConfig::default());
    /// let entry = LogEntry::with_log(
    ///     "RabbitMQ [SendMessage] -- Sent message: {\"EventName\":\"ProductionTotalPartCount\",\
    ///      \"EventOccured\":\"2024-01-01T00:00:00\",\"DeviceName\":\"D1\",\
    ///      \"EventArgs\":{\"Value\":10}} to exchange: X",
    /// );
    ///
    /// let report = extractor.extract(&[entry]);
    /// assert_eq!(report.events.len(), 1);
    /// assert_eq!(report.events[0].device_name, "D1");
    /// ```
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Decode the event embedded in a single entry
    ///
    /// Returns `Ok(None)` for an event of the excluded kind.
    ///
    /// # Errors
    ///
    /// * `MarkerNotFound` - the log text has no start marker
    /// * `DecodeFailure` - the text between the markers is not JSON
    /// * `MissingField` - the message lacks a required field or has the wrong shape
    /// * `InvalidTimestamp` - `EventOccured` does not match the event time format
    pub fn extract_entry(&self, entry: &LogEntry) -> Result<Option<EventRecord>, ExtractError> {
        let payload = extract_payload(
            entry.log_text(),
            &self.config.start_marker,
            &self.config.end_marker,
        )
        .ok_or(ExtractError::MarkerNotFound)?;

        let message: Value = serde_json::from_str(payload)
            .map_err(|e| ExtractError::DecodeFailure(e.to_string()))?;

        let event_name = message.get("EventName").and_then(Value::as_str);
        if event_name == Some(self.config.excluded_event.as_str()) {
            return Ok(None);
        }

        let event: EventRecord = serde_json::from_value(message)
            .map_err(|e| ExtractError::MissingField(e.to_string()))?;

        if event.occurred_at().is_err() {
            return Err(ExtractError::InvalidTimestamp(event.event_occured));
        }

        Ok(Some(event))
    }

    /// Extract events from typed log entries, preserving input order
    pub fn extract(&self, entries: &[LogEntry]) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        for (index, entry) in entries.iter().enumerate() {
            Self::accept(index, self.extract_entry(entry), &mut report);
        }
        Self::log_summary(entries.len(), &report);
        report
    }

    /// Extract events from untyped entries as loaded from a log export
    ///
    /// An entry whose shape does not match [`LogEntry`] is skipped as
    /// `MalformedEntry`.
    pub fn extract_values(&self, entries: &[Value]) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        for (index, value) in entries.iter().enumerate() {
            let result = decode_entry(value).and_then(|entry| self.extract_entry(&entry));
            Self::accept(index, result, &mut report);
        }
        Self::log_summary(entries.len(), &report);
        report
    }

    /// Extract events from a log source
    ///
    /// Never fails: an unreadable or undecodable source is logged and yields
    /// an empty list.
    pub fn extract_from_source(&self, source: &dyn LogSource) -> Vec<EventRecord> {
        match source.load() {
            Ok(entries) => self.extract_values(&entries).events,
            Err(ExtractError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("The log file '{}' was not found", source.describe());
                Vec::new()
            }
            Err(e) => {
                error!("Could not load log entries from '{}': {}", source.describe(), e);
                Vec::new()
            }
        }
    }

    /// Extract events from a JSON log export on disk
    pub fn extract_from_path(&self, path: &Path) -> Vec<EventRecord> {
        self.extract_from_source(&FileSource::new(path))
    }

    /// Extract events from a log export and encode them for the aggregator
    ///
    /// Returns `"[]"` whenever nothing could be extracted.
    pub fn extract_to_json(&self, path: &Path) -> String {
        self.extract_source_to_json(&FileSource::new(path))
    }

    /// Extract events from a log source and encode them for the aggregator
    pub fn extract_source_to_json(&self, source: &dyn LogSource) -> String {
        let events = self.extract_from_source(source);
        encode_events(&events).unwrap_or_else(|e| {
            error!("Failed to encode extracted events: {}", e);
            "[]".to_string()
        })
    }

    fn accept(
        index: usize,
        result: Result<Option<EventRecord>, ExtractError>,
        report: &mut ExtractionReport,
    ) {
        match result {
            Ok(Some(event)) => {
                debug!(
                    "Extracted event: {} - {} - {}",
                    event.event_occured, event.event_name, event.device_name
                );
                report.events.push(event);
            }
            Ok(None) => report.excluded += 1,
            Err(ExtractError::MarkerNotFound) => {
                report.skipped.push((index, ExtractError::MarkerNotFound));
            }
            Err(e) => {
                debug!("Skipping log entry {}: {}", index, e);
                report.skipped.push((index, e));
            }
        }
    }

    fn log_summary(total: usize, report: &ExtractionReport) {
        info!(
            "Extracted {} events from {} log entries ({} excluded, {} without marker, {} malformed)",
            report.events.len(),
            total,
            report.excluded,
            report.without_marker(),
            report.malformed()
        );
    }
}

fn decode_entry(value: &Value) -> Result<LogEntry, ExtractError> {
    LogEntry::deserialize(value).map_err(|e| ExtractError::MalformedEntry(e.to_string()))
}
