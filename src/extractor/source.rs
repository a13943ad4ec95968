use crate::error::ExtractError;
use serde_json::Value;
use std::path::PathBuf;

/// Supplier of raw log entries for one extraction run
///
/// Entries are handed over as untyped JSON values so a single malformed entry
/// can be skipped without failing the whole batch.
#[cfg_attr(test, mockall::automock)]
pub trait LogSource {
    /// Load every entry of the source
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Io` when the source cannot be read and
    /// `ExtractError::InputDecode` when its top level is not a JSON array.
    fn load(&self) -> Result<Vec<Value>, ExtractError>;

    /// Human-readable name used in diagnostics
    fn describe(&self) -> String;
}

/// Log entries exported to a JSON file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileSource {
    fn load(&self) -> Result<Vec<Value>, ExtractError> {
        let contents = std::fs::read_to_string(&self.path)?;
        parse_entries(&contents)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Log entries already held in memory as JSON text
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl LogSource for TextSource {
    fn load(&self) -> Result<Vec<Value>, ExtractError> {
        parse_entries(&self.text)
    }

    fn describe(&self) -> String {
        "<in-memory log>".to_string()
    }
}

fn parse_entries(contents: &str) -> Result<Vec<Value>, ExtractError> {
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(other) => Err(ExtractError::InputDecode(format!(
            "expected a JSON array of log entries, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ExtractError::InputDecode(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_reads_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"jsonPayload": {{"log": "a"}}}}, {{}}]"#).unwrap();

        let entries = FileSource::new(file.path()).load().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent/downloaded-logs.json");
        assert!(matches!(source.load(), Err(ExtractError::Io(_))));
    }

    #[test]
    fn test_text_source_rejects_object() {
        let source = TextSource::new(r#"{"jsonPayload": {}}"#);
        match source.load() {
            Err(ExtractError::InputDecode(msg)) => assert!(msg.contains("an object")),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_text_source_rejects_malformed_json() {
        let source = TextSource::new("[{\"jsonPayload\":");
        assert!(matches!(source.load(), Err(ExtractError::InputDecode(_))));
    }
}
