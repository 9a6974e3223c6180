use crate::error::ParseEventError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangeKind::Created),
            "modified" => Ok(ChangeKind::Modified),
            "deleted" => Ok(ChangeKind::Deleted),
            other => Err(ParseEventError::UnknownKind(other.to_string())),
        }
    }
}

/// A single change detected by one scan of the watched tree.
///
/// The text form is `File <kind>: <path>`, which is what subscribers receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Created, path)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Modified, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Deleted, path)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File {}: {}", self.kind, self.path.display())
    }
}

impl FromStr for ChangeEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("File ")
            .ok_or_else(|| ParseEventError::Malformed(s.to_string()))?;
        let (kind, path) = rest
            .split_once(": ")
            .ok_or_else(|| ParseEventError::Malformed(s.to_string()))?;
        if path.is_empty() {
            return Err(ParseEventError::MissingPath);
        }

        Ok(ChangeEvent::new(kind.parse()?, path))
    }
}
