use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Failure to open or save a program file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot access '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Corrupt(#[from] ParseError),
}

impl FileError {
    /// True when the file was read but does not describe a valid program.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, FileError::Corrupt(_))
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            FileError::Corrupt(error) => Some(error),
            FileError::Io { .. } => None,
        }
    }
}
