//! Versioned session snapshots and atomic export to disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use didactic_types::Locale;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::atomic_write::atomic_write;
use crate::{Diagnostic, SessionState, ValidationReport};

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Everything a presentation layer needs about a session, in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub schema_version: u32,
    pub session_id: Uuid,
    pub locale: Locale,
    pub catalog_version: String,
    pub catalog_fingerprint: Option<String>,
    pub exported_at: DateTime<Utc>,
    pub state: SessionState,
    pub diagnostic: Diagnostic,
    pub validation: ValidationReport,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize session snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write session snapshot to {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `session-<UTC timestamp>.json`.
#[must_use]
pub fn default_file_name(at: DateTime<Utc>) -> String {
    format!("session-{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

/// Write `snapshot` as pretty JSON to `path`, replacing any existing file.
///
/// Missing parent directories are created; readers never observe a partial
/// file.
pub fn export_snapshot(path: &Path, snapshot: &SessionSnapshot) -> Result<(), ExportError> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    atomic_write(path, &json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        session = %snapshot.session_id,
        turn = snapshot.state.turn_counter(),
        "exported session snapshot"
    );
    Ok(())
}

/// Read a snapshot previously written by [`export_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<SessionSnapshot, ExportError> {
    let bytes = std::fs::read(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
