//! Error types for snapshot.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::output::OutputError;

/// Top-level error type for snapshot operations.
///
/// Walk and symbol-extraction failures are per-file and never abort a run,
/// so they are logged where they happen rather than surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &SnapshotError) -> i32 {
    match error {
        SnapshotError::PathNotFound(_) => 3,
        SnapshotError::Io(_) => 1,
        SnapshotError::Config(_) => 1,
        SnapshotError::Output(_) => 1,
    }
}
