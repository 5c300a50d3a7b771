//! Storage layer for agenda.
//!
//! Writes harvested [`EventRecord`]s to JSON result files and reads them back.
//!
//! # Format
//!
//! ## Timestamp Format
//!
//! Start and end instants are stored as TEXT in `YYYY-MM-DD HH:MM:SS` form
//! (e.g., `2025-06-14 20:00:00`). They are timezone-naive wall-clock values,
//! exactly as resolved from the event page.
//!
//! ## Absent Values
//!
//! In memory, an absent description or image is distinct from an empty one.
//! This file format does not keep that distinction: both are written as `""`.
//!
//! ## Layout
//!
//! One file per run, `events_<city>_<YYYYmmdd_HHMMSS>.json`, holding a
//! pretty-printed array with 4-space indentation. Non-ASCII text is written
//! verbatim as UTF-8.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ag_core::{EventRecord, ResolvedInterval};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format of `start_dt` and `end_dt`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the run stamp in file names.
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the output directory.
    #[error("failed to create output directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to write a result file.
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to read a result file.
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to encode events as JSON.
    #[error("failed to encode events: {0}")]
    Encode(#[source] serde_json::Error),
    /// A result file did not contain a valid event array.
    #[error("invalid events file {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted shape of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub date: String,
    pub start_dt: String,
    pub end_dt: String,
    pub title: String,
    pub location: String,
    pub description_short: String,
    pub description_long: String,
    pub image: String,
    pub link: String,
    pub cost: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&EventRecord> for StoredEvent {
    fn from(record: &EventRecord) -> Self {
        let stamp = |at: fn(&ResolvedInterval) -> NaiveDateTime| {
            record
                .resolved
                .as_ref()
                .map(|interval| at(interval).format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            date: record.date_display.clone(),
            start_dt: stamp(ResolvedInterval::start),
            end_dt: stamp(ResolvedInterval::end),
            title: record.title.clone(),
            location: record.location.clone(),
            description_short: record.description_short.clone().unwrap_or_default(),
            description_long: record.description_long.clone().unwrap_or_default(),
            image: record.image.clone().unwrap_or_default(),
            link: record.link.to_string(),
            cost: record.cost.clone().unwrap_or_default(),
            kind: record.kind.clone().unwrap_or_default(),
        }
    }
}

/// File name for a run's results, e.g. `events_paris_20250610_120000.json`.
pub fn file_name(city: &str, stamp: NaiveDateTime) -> String {
    let city = city.trim().to_lowercase().replace([' ', '/', '\\'], "-");
    format!("events_{city}_{}.json", stamp.format(FILE_STAMP_FORMAT))
}

/// Encodes events as a pretty-printed JSON array (4-space indent).
pub fn to_json(events: &[StoredEvent]) -> Result<String, StoreError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    events
        .serialize(&mut serializer)
        .map_err(StoreError::Encode)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes `records` to a new result file under `dir`, creating it if needed.
///
/// Returns the path of the written file.
pub fn save_events(
    records: &[EventRecord],
    city: &str,
    dir: &Path,
    stamp: NaiveDateTime,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let events: Vec<StoredEvent> = records.iter().map(StoredEvent::from).collect();
    let path = dir.join(file_name(city, stamp));
    fs::write(&path, to_json(&events)?).map_err(|source| StoreError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), count = events.len(), "events saved");
    Ok(path)
}

/// Reads a result file written by [`save_events`].
pub fn load_events(path: &Path) -> Result<Vec<StoredEvent>, StoreError> {
    let contents = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
