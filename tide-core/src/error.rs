use std::path::PathBuf;

use thiserror::Error;

/// Failures that can stop the bot before it starts serving interactions.
#[derive(Debug, Error)]
pub enum TideError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("location dataset unavailable at {path}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TideError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Why a forecast response was turned into "no data".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Decode(String),

    #[error("success flag is {0:?}, expected \"true\"")]
    NotSuccessful(Option<String>),

    #[error("response is missing `{0}`")]
    Missing(&'static str),

    #[error("no daily forecast for {0}")]
    NoDailyEntry(String),

    #[error("daily forecast for {0} has no tide times")]
    EmptyDay(String),
}

/// A command registration call that the gateway rejected or never answered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("failed to list commands: {0}")]
    List(String),

    #[error("failed to create command `{name}`: {reason}")]
    Create { name: String, reason: String },
}
