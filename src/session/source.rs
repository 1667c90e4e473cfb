// Session sources - Where snapshots of the live session come from

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::SessionSnapshot;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read session from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse session from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of a live session, polled once per watch cycle
pub trait SessionSource {
    /// Full snapshot of every track and clip slot
    fn snapshot(&mut self) -> Result<SessionSnapshot, SessionError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Session dumped to a JSON file by a bridge inside the host application
///
/// The file is re-read on every poll, e.g.
/// `{"tracks":[{"name":"Keys","clips":[null,{"name":"Verse"}]}]}`.
#[derive(Debug, Clone)]
pub struct JsonFileSession {
    path: PathBuf,
}

impl JsonFileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSession { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSource for JsonFileSession {
    fn snapshot(&mut self) -> Result<SessionSnapshot, SessionError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| SessionError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("session file {}", self.path.display())
    }
}
