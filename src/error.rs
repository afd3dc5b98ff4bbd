use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("malformed archive entry {entry}: {reason}")]
    ArchiveFormat { entry: String, reason: String },

    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("download failed for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("i/o error on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn archive_format(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
