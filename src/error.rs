//! Error type shared by configuration loading and input validation.
//!
//! Query and correlation paths are infallible: they operate on data that is
//! already resident. Misuse of the index (negative radii, NaN distances)
//! panics instead of being reported here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrelateError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "toml")]
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CorrelateError>;
