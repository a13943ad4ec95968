//! Production KPI aggregation over extracted events
//!
//! This module provides the KpiAggregator which turns the encoded event list
//! produced by extraction into a production-rate report with per-device last
//! readings and stall detection.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::events::{EventRecord, EVENT_TIME_FORMAT};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// KPI report over the tracked production events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiReport {
    pub overall_summary: OverallSummary,
    /// Last reading of each device in time order, as written in the event
    pub device_performance: BTreeMap<String, Number>,
    pub warnings: Warnings,
}

/// Totals across the whole time window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallSummary {
    /// Number of tracked events after filtering
    pub total_logs_analyzed: usize,
    /// Minutes between the first and last event, rounded to 2 decimals
    pub total_time_window_minutes: f64,
    /// Last value minus first value, rounded to 2 decimals
    ///
    /// Stays an integer when both readings are integers.
    pub total_part_increase: Number,
    /// Increase per minute, rounded to 2 decimals; integer 0 for a zero-length window
    pub average_rate_per_minute: Number,
}

/// Anomalies spotted in the event sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warnings {
    /// The two most recent readings are equal
    pub stalling_detected: bool,
    /// Device of the most recent reading when stalling
    pub stalling_device: Option<String>,
}

/// Result of one aggregation call as handed back to the caller
///
/// Serializes either as the report itself or as `{"error": <message>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KpiOutcome {
    Report(KpiReport),
    Error { error: String },
}

impl KpiOutcome {
    /// The report, if aggregation succeeded
    pub fn report(&self) -> Option<&KpiReport> {
        match self {
            KpiOutcome::Report(report) => Some(report),
            KpiOutcome::Error { .. } => None,
        }
    }

    /// The error message, if aggregation failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            KpiOutcome::Report(_) => None,
            KpiOutcome::Error { error } => Some(error),
        }
    }
}

impl From<Result<KpiReport, AnalysisError>> for KpiOutcome {
    fn from(result: Result<KpiReport, AnalysisError>) -> Self {
        match result {
            Ok(report) => KpiOutcome::Report(report),
            Err(e) => KpiOutcome::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Computes production KPIs from extracted events
///
/// Only events of the configured target kind are considered. They are ordered
/// by `EventOccured` before any metric is computed, so the input order does
/// not matter.
#[derive(Debug, Clone, Default)]
pub struct KpiAggregator {
    config: AnalysisConfig,
}

impl KpiAggregator {
    /// Create an aggregator tracking the configured event kind
    ///
    /// # Examples
    ///
    /// ```
    /// use fmkpi::aggregator::KpiAggregator;
    /// use fmkpi::config::AnalysisConfig;
    ///
    /// let aggregator = KpiAggregator::new(AnalysisConfig::default());
    /// let outcome = aggregator.aggregate("[]");
    /// assert_eq!(
    ///     outcome.error_message(),
    ///     Some("No 'ProductionTotalPartCount' events found for analysis.")
    /// );
    /// ```
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Aggregate an encoded event list
    ///
    /// Never fails: undecodable input, an empty selection and malformed
    /// timestamps all come back as `KpiOutcome::Error`.
    pub fn aggregate(&self, encoded: &str) -> KpiOutcome {
        let result = self.decode(encoded).and_then(|events| self.analyze(&events));
        let outcome = KpiOutcome::from(result);
        if let Some(message) = outcome.error_message() {
            warn!("KPI analysis failed: {}", message);
        }
        outcome
    }

    /// Decode the tracked events from an encoded event list
    ///
    /// Elements of other kinds are dropped before typed decoding, so they only
    /// need an `EventName`.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the text is not a JSON array or
    /// a tracked event lacks one of the required fields.
    pub fn decode(&self, encoded: &str) -> Result<Vec<EventRecord>, AnalysisError> {
        let values: Vec<Value> =
            serde_json::from_str(encoded).map_err(|_| AnalysisError::InvalidInput)?;

        values
            .into_iter()
            .filter(|value| {
                value.get("EventName").and_then(Value::as_str)
                    == Some(self.config.target_event.as_str())
            })
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    debug!("Tracked event failed to decode: {}", e);
                    AnalysisError::InvalidInput
                })
            })
            .collect()
    }

    /// Compute the report over already decoded events
    ///
    /// # Errors
    ///
    /// * `NoMatchingEvents` - no event of the target kind is present
    /// * `InvalidTimestamp` - a tracked event's `EventOccured` does not parse
    pub fn analyze(&self, events: &[EventRecord]) -> Result<KpiReport, AnalysisError> {
        let target = &self.config.target_event;

        let mut timeline = events
            .iter()
            .filter(|event| &event.event_name == target)
            .map(|event| {
                event
                    .occurred_at()
                    .map(|at| (at, event))
                    .map_err(|_| AnalysisError::InvalidTimestamp {
                        value: event.event_occured.clone(),
                        kind: target.clone(),
                        format: EVENT_TIME_FORMAT.to_string(),
                    })
            })
            .collect::<Result<Vec<(NaiveDateTime, &EventRecord)>, _>>()?;

        // Stable sort keeps input order among equal timestamps
        timeline.sort_by_key(|(at, _)| *at);

        let (Some(&(first_at, first)), Some(&(last_at, last))) =
            (timeline.first(), timeline.last())
        else {
            return Err(AnalysisError::NoMatchingEvents(target.clone()));
        };

        let (total_increase, increase) = difference(first.value(), last.value());
        let total_minutes = (last_at - first_at).num_seconds() as f64 / 60.0;
        let average_rate = if total_minutes > 0.0 {
            float_number(round2(increase / total_minutes))
        } else {
            Number::from(0)
        };

        let mut device_performance = BTreeMap::new();
        for (_, event) in &timeline {
            device_performance.insert(event.device_name.clone(), event.value().clone());
        }

        let stalling = matches!(
            timeline.as_slice(),
            [.., (_, previous), (_, latest)] if same_reading(previous.value(), latest.value())
        );
        if stalling {
            warn!(
                "Production stalled on device '{}' at {}",
                last.device_name, last.event_occured
            );
        }

        info!(
            "Analyzed {} '{}' events over {:.2} minutes",
            timeline.len(),
            target,
            total_minutes
        );

        Ok(KpiReport {
            overall_summary: OverallSummary {
                total_logs_analyzed: timeline.len(),
                total_time_window_minutes: round2(total_minutes),
                total_part_increase: total_increase,
                average_rate_per_minute: average_rate,
            },
            device_performance,
            warnings: Warnings {
                stalling_detected: stalling,
                stalling_device: stalling.then(|| last.device_name.clone()),
            },
        })
    }
}

/// Readings as exact integers, when they are integers
fn integral(value: &Number) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

/// `last - first`, as reported and as used for the rate
///
/// Integer readings give an exact integer difference; anything else is the
/// float difference rounded to two decimals.
fn difference(first: &Number, last: &Number) -> (Number, f64) {
    if let (Some(first), Some(last)) = (integral(first), integral(last)) {
        let diff = last - first;
        let exact = i64::try_from(diff)
            .map(Number::from)
            .or_else(|_| u64::try_from(diff).map(Number::from));
        if let Ok(number) = exact {
            return (number, diff as f64);
        }
    }

    let diff = last.as_f64().unwrap_or_default() - first.as_f64().unwrap_or_default();
    (float_number(round2(diff)), diff)
}

fn same_reading(a: &Number, b: &Number) -> bool {
    match (integral(a), integral(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.as_f64() == b.as_f64(),
    }
}

// Non-finite floats have no JSON form and are reported as 0
fn float_number(value: f64) -> Number {
    Number::from_f64(value).unwrap_or_else(|| Number::from(0))
}

/// Round to two decimal places, ties to even on the exact binary value
///
/// A binary float lies exactly halfway between two hundredths only when it is
/// a multiple of 1/8; those ties go to the even neighbour. Every other value
/// is rounded from its exact decimal expansion by the formatter.
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if (value * 8.0).fract() == 0.0 && (scaled - scaled.trunc()).abs() == 0.5 {
        let floor = scaled.floor();
        let even = if floor % 2.0 == 0.0 { floor } else { floor + 1.0 };
        return even / 100.0;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}
