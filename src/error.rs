use std::error::Error as _;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Engine command not found: {0}")]
    EngineNotFound(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Render the error and its source chain, one cause per line.
    ///
    /// Wrapping variants already print their inner error, so the chain
    /// starts below it.
    pub fn trace(&self) -> String {
        let mut out = self.to_string();
        let mut source = match self {
            Error::Io(inner) => inner.source(),
            Error::Json(inner) => inner.source(),
            Error::TomlParse(inner) => inner.source(),
            _ => std::error::Error::source(self),
        };
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

pub type Result<T> = std::result::Result<T, Error>;
