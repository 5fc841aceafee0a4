use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a run. `main` reports the message and exits with status 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Can't open {}: {source}", .path.display())]
    Unavailable { path: PathBuf, source: io::Error },

    #[error("Can't parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("Can't find {0}")]
    NotFound(String),

    #[error("{0}")]
    Setup(String),

    #[error("Fork failed: {0}")]
    Fork(io::Error),

    #[error("Clock unavailable: {0}")]
    Clock(io::Error),

    #[error("LED board at {}: {source}", .path.display())]
    Device { path: PathBuf, source: io::Error },
}

impl Error {
    pub fn unavailable<P: Into<PathBuf>>(path: P, source: io::Error) -> Error {
        Error::Unavailable { path: path.into(), source }
    }

    pub fn parse<D: Into<String>>(what: &'static str, detail: D) -> Error {
        Error::Parse { what, detail: detail.into() }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
