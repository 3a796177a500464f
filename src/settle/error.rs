// SPDX-License-Identifier: MIT

//! Typed error handling for the settle CLI and its fetchers

use thiserror::Error;

use crate::wait::WaitError;

/// Top-level error type for settle-rs
#[derive(Debug, Error)]
pub enum SettleError {
    /// Configuration errors (invalid wait file, missing env vars)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A wait ended without satisfying its conditions
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// Remote API answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Fetch command exited unsuccessfully
    #[error("Command '{program}' failed ({status}): {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Invalid URL template
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl SettleError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
