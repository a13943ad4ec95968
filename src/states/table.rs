//! Exclusive state CSV export loader
//!
//! The export starts with a few preamble lines, then a header row naming the
//! production line column and, for every state, a duration column immediately
//! followed by its occurrence count column. Duration cells are converted to
//! seconds on load.

use crate::config::StatesConfig;
use crate::error::StateTableError;
use crate::states::duration::duration_seconds;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Time spent in one state by one production line
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateDuration {
    pub state: String,
    pub seconds: u64,
    pub occurrences: u64,
}

/// One production line of the export
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateRow {
    pub production_line: String,
    /// States in configured order, limited to those present in the export
    pub states: Vec<StateDuration>,
    pub total_seconds: u64,
    pub total_occurrences: u64,
}

/// Cleaned exclusive state table
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateTable {
    pub rows: Vec<StateRow>,
}

/// Column positions resolved from the header row
struct Layout {
    production_line: usize,
    states: Vec<(String, usize)>,
    total: Option<usize>,
}

impl Layout {
    fn resolve(header: &StringRecord, config: &StatesConfig) -> Result<Self, StateTableError> {
        let position = |name: &str| header.iter().position(|column| column.trim() == name);

        let production_line = position(&config.production_line_column).ok_or_else(|| {
            StateTableError::MissingColumn(config.production_line_column.clone())
        })?;

        let mut states = Vec::new();
        for name in &config.state_names {
            match position(name) {
                Some(index) => states.push((name.clone(), index)),
                None => debug!("State '{}' not present in export, skipping", name),
            }
        }

        Ok(Self {
            production_line,
            states,
            total: position(&config.total_column),
        })
    }

    fn row(&self, record: &StringRecord) -> Option<StateRow> {
        let cell = |index: usize| record.get(index).map(str::trim).unwrap_or("");
        let count = |index: usize| cell(index).parse::<u64>().unwrap_or(0);

        let production_line = cell(self.production_line);
        if production_line.is_empty() {
            return None;
        }

        let states = self
            .states
            .iter()
            .map(|(state, index)| StateDuration {
                state: state.clone(),
                seconds: duration_seconds(cell(*index)),
                occurrences: count(index + 1),
            })
            .collect();

        let (total_seconds, total_occurrences) = match self.total {
            Some(index) => (duration_seconds(cell(index)), count(index + 1)),
            None => (0, 0),
        };

        Some(StateRow {
            production_line: production_line.to_string(),
            states,
            total_seconds,
            total_occurrences,
        })
    }
}

impl StateTable {
    /// Load the export from a CSV file
    pub fn from_path(path: &Path, config: &StatesConfig) -> Result<Self, StateTableError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, config)?;
        info!(
            "Loaded {} production lines from {}",
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load the export from any reader
    ///
    /// # Errors
    ///
    /// Returns `StateTableError::Csv` for unreadable CSV and `MissingColumn`
    /// when the header row is absent or lacks the production line column.
    pub fn from_reader<R: Read>(reader: R, config: &StatesConfig) -> Result<Self, StateTableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = reader.records().skip(config.header_row);

        let header = records
            .next()
            .transpose()?
            .ok_or_else(|| StateTableError::MissingColumn(config.production_line_column.clone()))?;
        let layout = Layout::resolve(&header, config)?;

        let mut rows = Vec::new();
        for record in records {
            if let Some(row) = layout.row(&record?) {
                rows.push(row);
            }
        }

        Ok(Self { rows })
    }

    /// Total seconds spent in each state across all production lines
    pub fn total_seconds_by_state(&self) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for state in self.rows.iter().flat_map(|row| &row.states) {
            match positions.get(state.state.as_str()) {
                Some(&position) => totals[position].1 += state.seconds,
                None => {
                    positions.insert(&state.state, totals.len());
                    totals.push((state.state.clone(), state.seconds));
                }
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
Exclusive State Report
Site,Solihull
Area,FA3
Period,Last 3 Months
Generated,2024-01-01
Description,Cycling,Occ.,Starved,Occ.,Blocked,Occ.,Total,Occ.
Line 1,13504:51,120,2:30,4,00:00,0,13507:21,124
Line 2,1:00:30,10,,,0,0,1:00:30,10
,5:00,1,5:00,1,5:00,1,15:00,3
Line 3,bad,x,0:01,1,0:02,2,0:03,3
";

    fn config() -> StatesConfig {
        StatesConfig {
            state_names: vec![
                "Cycling".to_string(),
                "Starved".to_string(),
                "Blocked".to_string(),
                "Setup".to_string(),
            ],
            ..StatesConfig::default()
        }
    }

    #[test]
    fn test_rows_are_cleaned() {
        let table = StateTable::from_reader(EXPORT.as_bytes(), &config()).unwrap();

        let lines: Vec<&str> = table.rows.iter().map(|r| r.production_line.as_str()).collect();
        assert_eq!(lines, vec!["Line 1", "Line 2", "Line 3"]);

        let first = &table.rows[0];
        assert_eq!(
            first.states[0],
            StateDuration {
                state: "Cycling".to_string(),
                seconds: 48_617_460,
                occurrences: 120,
            }
        );
        assert_eq!(first.states[1].seconds, 9000);
        assert_eq!(first.states[2].seconds, 0);
        assert_eq!(first.total_seconds, 48_626_460);
        assert_eq!(first.total_occurrences, 124);
    }

    #[test]
    fn test_absent_states_are_skipped() {
        let table = StateTable::from_reader(EXPORT.as_bytes(), &config()).unwrap();
        assert!(table.rows.iter().all(|row| row.states.len() == 3));
        assert!(table
            .rows
            .iter()
            .all(|row| row.states.iter().all(|s| s.state != "Setup")));
    }

    #[test]
    fn test_blank_and_malformed_cells_count_as_zero() {
        let table = StateTable::from_reader(EXPORT.as_bytes(), &config()).unwrap();

        let second = &table.rows[1];
        assert_eq!(second.states[0].seconds, 3630);
        assert_eq!(second.states[1].seconds, 0);
        assert_eq!(second.states[1].occurrences, 0);

        let third = &table.rows[2];
        assert_eq!(third.states[0].seconds, 0);
        assert_eq!(third.states[0].occurrences, 0);
    }

    #[test]
    fn test_total_seconds_by_state() {
        let table = StateTable::from_reader(EXPORT.as_bytes(), &config()).unwrap();
        let totals = table.total_seconds_by_state();

        assert_eq!(
            totals,
            vec![
                ("Cycling".to_string(), 48_617_460 + 3630),
                ("Starved".to_string(), 9000 + 60),
                ("Blocked".to_string(), 120),
            ]
        );
    }

    #[test]
    fn test_total_seconds_by_state_across_many_lines() {
        let mut export = EXPORT.lines().take(5).collect::<Vec<_>>().join("\n");
        export.push_str("\nDescription,Starved,Occ.,Cycling,Occ.\n");
        for line in 0..500 {
            export.push_str(&format!("Line {},0:00:30,2,0:01,1\n", line));
        }

        let table = StateTable::from_reader(export.as_bytes(), &config()).unwrap();
        assert_eq!(table.rows.len(), 500);
        assert_eq!(
            table.total_seconds_by_state(),
            vec![
                ("Cycling".to_string(), 500 * 60),
                ("Starved".to_string(), 500 * 30),
            ]
        );
    }

    #[test]
    fn test_missing_production_line_column() {
        let config = StatesConfig {
            header_row: 0,
            ..config()
        };
        let result = StateTable::from_reader("Line,Cycling,Occ.\nA,1:00,1\n".as_bytes(), &config);
        assert!(matches!(result, Err(StateTableError::MissingColumn(c)) if c == "Description"));
    }

    #[test]
    fn test_missing_header_row() {
        let result = StateTable::from_reader("only,one,line\n".as_bytes(), &config());
        assert!(matches!(result, Err(StateTableError::MissingColumn(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();

        let table = StateTable::from_path(file.path(), &config()).unwrap();
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_from_missing_path() {
        let result = StateTable::from_path(Path::new("/nonexistent/states.csv"), &config());
        assert!(matches!(result, Err(StateTableError::Io(_))));
    }
}
