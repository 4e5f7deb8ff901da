//! Error type for code map import

use std::path::PathBuf;
use std::{io, result};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be opened or read.
    #[error("cannot read code map {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file's contents match none of the known code map formats.
    #[error("{}: unrecognised code map format", .path.display())]
    Format { path: PathBuf },

    /// A line of a text log did not hold a valid address.
    #[error("{}, line {line}: invalid address '{token}'", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
}

impl Error {
    pub fn source_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Source {
            path: path.into(),
            source,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match &err {
            Error::Source { source, .. } => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, err)
    }
}

pub type Result<T> = result::Result<T, Error>;
