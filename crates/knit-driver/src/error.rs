//! Build errors
//!
//! A build stops at the first error; [`BuildError`] is the single value it
//! reports, whichever stage failed.

use std::io;
use std::path::PathBuf;

use knit_loader::LoaderError;
use knit_parser::ParseError;
use thiserror::Error;

/// No candidate path for a request exists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No Module, Error: can't resolve {request} in {}", context.display())]
pub struct ResolveError {
    pub request: String,
    /// Directory the request was resolved from
    pub context: PathBuf,
    /// Every path tried, in order
    pub attempted: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("config must be a JSON object")]
    NotAnObject,

    #[error("override '{0}' is not of the form key=value")]
    InvalidOverride(String),

    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("no entries configured")]
    NoEntries,

    #[error("chunks '{first}' and '{second}' both emit {filename}")]
    FilenameConflict {
        filename: String,
        first: String,
        second: String,
    },

    #[error("chunk '{chunk}' emits {filename}, which is outside the output directory")]
    UnsafeFilename { filename: String, chunk: String },

    #[error("can't determine the working directory: {0}")]
    CurrentDir(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error("module {module}: {source}")]
    Loader {
        module: String,
        #[source]
        source: LoaderError,
    },

    #[error("can't read {}: {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has {} syntax error(s)", path.display(), errors.len())]
    Parse {
        path: PathBuf,
        source_text: String,
        errors: Vec<ParseError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("can't write {}: {source}", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid rule test /{pattern}/: {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("can't start the loader runtime: {0}")]
    Runtime(#[source] LoaderError),
}

impl BuildError {
    /// Error from running the loader chain of `module`; read failures
    /// keep their own variant.
    pub(crate) fn from_loader(module: &str, error: LoaderError) -> Self {
        match error {
            LoaderError::ResourceRead { path, source } => BuildError::ResourceRead { path, source },
            source => BuildError::Loader {
                module: module.to_string(),
                source,
            },
        }
    }
}
