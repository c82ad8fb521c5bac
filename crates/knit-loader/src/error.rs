//! Loader pipeline errors

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which half of the pipeline a loader was running in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pitch,
    Normal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pitch => write!(f, "pitch"),
            Phase::Normal => write!(f, "normal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    /// Raised by loader code, either returned directly, passed to a
    /// completion handle or produced by a deferred result
    #[error("{0}")]
    Message(String),

    #[error("completion handle was dropped without being called")]
    CallbackDropped,

    #[error("{phase} phase of {request} failed: {source}")]
    Loader {
        request: String,
        phase: Phase,
        #[source]
        source: Box<LoaderError>,
    },

    #[error("can't read resource {}: {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown loader '{name}'")]
    NotFound { name: String },

    #[error("loader chain produced no content")]
    NoResult,

    #[error("can't start loader runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl LoaderError {
    pub fn msg(message: impl Into<String>) -> Self {
        LoaderError::Message(message.into())
    }

    /// Innermost error, past the loader/phase wrappers the runner adds
    pub fn root_cause(&self) -> &LoaderError {
        match self {
            LoaderError::Loader { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
