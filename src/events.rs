//! Core record types for the event pipeline
//!
//! This module defines the raw log entry shape read from exported log files and
//! the business event decoded from the message embedded in each entry.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Timestamp format used by `EventOccured`
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One raw entry from an exported log file
///
/// Only `jsonPayload.log` is read; every other field of the export is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(rename = "jsonPayload", default)]
    pub json_payload: Option<JsonPayload>,
}

/// Nested payload of a log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JsonPayload {
    #[serde(default)]
    pub log: Option<String>,
}

impl LogEntry {
    /// Build an entry whose payload carries the given log text
    pub fn with_log(text: impl Into<String>) -> Self {
        Self {
            json_payload: Some(JsonPayload {
                log: Some(text.into()),
            }),
        }
    }

    /// Free-text log line, empty when either level is absent
    pub fn log_text(&self) -> &str {
        self.json_payload
            .as_ref()
            .and_then(|payload| payload.log.as_deref())
            .unwrap_or("")
    }
}

/// Business event decoded from an embedded message
///
/// Field names follow the wire format of the message bus, including the
/// `EventOccured` spelling. Fields beyond the four known ones are kept in
/// `extra` so a decoded record re-encodes to the message it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    #[serde(rename = "EventName")]
    pub event_name: String,
    #[serde(rename = "EventOccured")]
    pub event_occured: String,
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    #[serde(rename = "EventArgs")]
    pub event_args: EventArgs,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Arguments attached to an event
///
/// `Value` keeps the number as written in the message, so an integer reading
/// re-encodes as an integer and large integers keep every digit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventArgs {
    #[serde(rename = "Value")]
    pub value: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Create an event with no extra fields
    pub fn new(
        event_name: impl Into<String>,
        event_occured: impl Into<String>,
        device_name: impl Into<String>,
        value: impl Into<Number>,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            event_occured: event_occured.into(),
            device_name: device_name.into(),
            event_args: EventArgs {
                value: value.into(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Reading carried by the event, as written in the message
    pub fn value(&self) -> &Number {
        &self.event_args.value
    }

    /// Reading as a float for arithmetic
    pub fn reading(&self) -> f64 {
        self.event_args.value.as_f64().unwrap_or_default()
    }

    /// Parse `EventOccured` with the fixed event timestamp format
    pub fn occurred_at(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.event_occured, EVENT_TIME_FORMAT)
    }
}

/// Encode events as the JSON list handed from extraction to analysis
pub fn encode_events(events: &[EventRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

/// Decode a JSON list produced by [`encode_events`]
pub fn decode_events(encoded: &str) -> Result<Vec<EventRecord>, serde_json::Error> {
    serde_json::from_str(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_record_wire_field_names() {
        let event = EventRecord::new("ProductionTotalPartCount", "2024-01-01T00:00:00", "D1", 10);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["EventName"], "ProductionTotalPartCount");
        assert_eq!(value["EventOccured"], "2024-01-01T00:00:00");
        assert_eq!(value["DeviceName"], "D1");
        assert_eq!(value["EventArgs"]["Value"], 10);
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let raw = json!({
            "EventName": "ProductionTotalPartCount",
            "EventOccured": "2024-01-01T00:00:00",
            "DeviceName": "D1",
            "EventArgs": {"Value": 10, "Unit": "parts"},
            "LineId": 7
        });

        let event: EventRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(event.extra["LineId"], 7);
        assert_eq!(event.event_args.extra["Unit"], "parts");

        let encoded = encode_events(std::slice::from_ref(&event)).unwrap();
        let decoded = decode_events(&encoded).unwrap();
        assert_eq!(decoded, vec![event]);
    }

    #[test]
    fn test_value_is_encoded_as_written() {
        let encoded = r#"[{"EventName":"ProductionTotalPartCount","EventOccured":"2024-01-01T00:00:00","DeviceName":"D1","EventArgs":{"Value":10}},{"EventName":"ProductionTotalPartCount","EventOccured":"2024-01-01T00:01:00","DeviceName":"D1","EventArgs":{"Value":9007199254740993}},{"EventName":"ProductionTotalPartCount","EventOccured":"2024-01-01T00:02:00","DeviceName":"D1","EventArgs":{"Value":12.5}}]"#;

        let events = decode_events(encoded).unwrap();
        assert_eq!(events[0].value(), &Number::from(10));
        assert_eq!(events[1].value(), &Number::from(9_007_199_254_740_993_u64));
        assert_eq!(events[2].reading(), 12.5);

        assert_eq!(encode_events(&events).unwrap(), encoded);
    }

    #[test]
    fn test_occurred_at_requires_exact_format() {
        let ok = EventRecord::new("X", "2024-01-01T08:30:15", "D1", 1);
        assert!(ok.occurred_at().is_ok());

        let spaced = EventRecord::new("X", "2024-01-01 08:30:15", "D1", 1);
        assert!(spaced.occurred_at().is_err());

        let fractional = EventRecord::new("X", "2024-01-01T08:30:15.123", "D1", 1);
        assert!(fractional.occurred_at().is_err());
    }

    #[test]
    fn test_log_text_defaults_to_empty() {
        let entry: LogEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(entry.log_text(), "");

        let entry: LogEntry = serde_json::from_str(r#"{"jsonPayload": {}}"#).unwrap();
        assert_eq!(entry.log_text(), "");

        let entry: LogEntry = serde_json::from_str(r#"{"jsonPayload": {"log": "hello"}}"#).unwrap();
        assert_eq!(entry.log_text(), "hello");
    }

    #[test]
    fn test_decode_events_rejects_non_list() {
        assert!(decode_events(r#"{"EventName": "X"}"#).is_err());
        assert!(decode_events("not json").is_err());
        assert_eq!(decode_events("[]").unwrap(), Vec::<EventRecord>::new());
    }
}
