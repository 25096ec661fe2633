//! JSON persistence for batch plans and rename reports.
//!
//! Files are written with 4-space indentation so they stay easy to review
//! and hand-edit before being replayed with `rename from`.

use crate::rename::{BatchPlan, RenameReport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{BufReader, Write};
use std::path::Path;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Serialize a value as JSON with 4-space indentation.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a value as pretty JSON, creating parent directories if needed.
pub fn write_json_pretty<T: Serialize, P: AsRef<Path>>(
    path: P,
    value: &T,
) -> Result<(), SerializationError> {
    let path = path.as_ref();
    let json = to_json_pretty(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Read a JSON file into any deserializable type.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, SerializationError> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Load a batch plan saved by `extract`.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<BatchPlan, SerializationError> {
    read_json(path)
}

/// Load a rename report saved by `rename`.
pub fn load_report<P: AsRef<Path>>(path: P) -> Result<RenameReport, SerializationError> {
    read_json(path)
}
