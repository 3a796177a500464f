// SPDX-License-Identifier: MIT

//! Fetcher implementations selectable from a wait file

pub mod command;
pub mod http;

use crate::settle::config::FetcherConfig;
use crate::settle::error::SettleError;
use crate::wait::{FetchError, Fetcher};
use async_trait::async_trait;
use serde_json::Value;

pub use command::CommandFetcher;
pub use http::HttpFetcher;

/// Any configured fetcher
pub enum AnyFetcher {
    Http(HttpFetcher),
    Command(CommandFetcher),
}

impl AnyFetcher {
    /// Build the fetcher described by `config`
    pub fn from_config(config: &FetcherConfig) -> Result<Self, SettleError> {
        Ok(match config {
            FetcherConfig::Http(http) => Self::Http(HttpFetcher::new(http)?),
            FetcherConfig::Command(cmd) => Self::Command(CommandFetcher::new(cmd)),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Command(_) => "command",
        }
    }
}

#[async_trait]
impl Fetcher for AnyFetcher {
    type Resource = Value;

    async fn fetch(&self, resource_id: &str) -> Result<Value, FetchError> {
        match self {
            Self::Http(f) => f.fetch(resource_id).await,
            Self::Command(f) => f.fetch(resource_id).await,
        }
    }
}
