// src/memory/mod.rs

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One failed trial, as written to a failure log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub message_type: String,
    pub incoming: String,
    pub expected: Value,
    /// Parsed reply when one could be read, otherwise the raw reply text.
    pub got: Value,
}

/// Where the trial runner puts failed trials.
pub trait FailureLog {
    fn log(&mut self, record: FailureRecord);
    fn read_all(&self) -> Vec<FailureRecord>;
}

/// In-memory failure log, written out once at the end of a run.
#[derive(Default, Debug)]
pub struct InMemoryFailureLog {
    pub entries: Vec<FailureRecord>,
}

impl InMemoryFailureLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole log as a pretty-printed JSON array, creating parent
    /// directories as needed.
    pub fn persist(&self, path: &Path) -> Result<(), HarnessError> {
        write_failure_log(path, &self.entries)
    }
}

impl FailureLog for InMemoryFailureLog {
    fn log(&mut self, record: FailureRecord) {
        self.entries.push(record);
    }

    fn read_all(&self) -> Vec<FailureRecord> {
        self.entries.clone()
    }
}

pub fn write_failure_log(path: &Path, records: &[FailureRecord]) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|e| HarnessError::io(path, e))
}

pub fn load_failure_log(path: &Path) -> Result<Vec<FailureRecord>, HarnessError> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persisted_log_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("failures.json");

        let mut log = InMemoryFailureLog::new();
        log.log(FailureRecord {
            message_type: "move".into(),
            incoming: "MOVE:(3, 4)".into(),
            expected: json!({"ACTION": "MOVE"}),
            got: json!({"ACTION": "SEND"}),
        });
        log.log(FailureRecord {
            message_type: "bad".into(),
            incoming: "MOVE".into(),
            expected: json!({"ACTION": "REPEAT"}),
            got: json!("I cannot do that"),
        });
        log.persist(&path).unwrap();

        let loaded = load_failure_log(&path).unwrap();
        assert_eq!(loaded, log.read_all());
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[1]["got"], "I cannot do that");
        assert_eq!(raw[0]["message_type"], "move");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_failure_log(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
