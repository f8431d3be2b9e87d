use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use super::classifier::Classification;

/// Audit record of a single triage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSnapshot {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub gpa_threshold: f64,
    #[serde(flatten)]
    pub classification: Classification,
}

impl ClassificationSnapshot {
    pub fn new(source: impl Into<String>, gpa_threshold: f64, classification: Classification) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            gpa_threshold,
            classification,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("unable to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("snapshot {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Writes the snapshot with four-space indentation, replacing any earlier file.
pub fn write_snapshot(path: &Path, snapshot: &ClassificationSnapshot) -> Result<(), SnapshotError> {
    let io_error = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    snapshot
        .serialize(&mut serializer)
        .map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)
}

pub fn read_snapshot(path: &Path) -> Result<ClassificationSnapshot, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}
