use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::types::Outcome;

/// Outcomes as `W`/`L` tokens separated by single spaces, no trailing newline.
pub fn serialize(outcomes: &[Outcome]) -> String {
    outcomes
        .iter()
        .map(Outcome::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses saved text, silently skipping anything that is not a W/L token.
pub fn deserialize(text: &str) -> EngineResult<Vec<Outcome>> {
    let outcomes: Vec<Outcome> = text
        .to_uppercase()
        .split_whitespace()
        .filter_map(Outcome::from_token)
        .collect();

    if outcomes.is_empty() {
        return Err(EngineError::NoValidTokens);
    }
    Ok(outcomes)
}

/// Backing storage for the serialized token string
#[cfg_attr(test, mockall::automock)]
pub trait ResultStore {
    fn read_text(&self) -> io::Result<String>;
    fn write_text(&self, text: &str) -> io::Result<()>;
    /// Human-readable location used in errors and logs
    fn location(&self) -> String;
}

/// Plain text file store
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Empties an existing file. Returns `false` without touching the
    /// filesystem when there is no file.
    pub fn truncate(&self) -> io::Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        fs::write(&self.path, "")?;
        Ok(true)
    }
}

impl ResultStore for FileStore {
    fn read_text(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn write_text(&self, text: &str) -> io::Result<()> {
        fs::write(&self.path, text)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

pub(crate) fn io_error(store: &dyn ResultStore, source: io::Error) -> EngineError {
    EngineError::Io {
        location: store.location(),
        source,
    }
}
