//! Error types for scanning, serving and configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A walk of the watched tree failed partway.
///
/// Never fatal: the scan loop logs it and tries again on the next tick.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to traverse `{}`", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn traversal(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScanError::Traversal {
            path: path.into(),
            source,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::Traversal { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server failed")]
    Serve(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("could not resolve watch directory `{}`", path.display())]
    WatchDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEventError {
    #[error("not a change message: `{0}`")]
    Malformed(String),

    #[error("unknown change kind `{0}`")]
    UnknownKind(String),

    #[error("change message has no path")]
    MissingPath,
}
