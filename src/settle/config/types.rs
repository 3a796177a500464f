// SPDX-License-Identifier: MIT

//! YAML schema types for wait definition files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::wait::{ConditionSet, WaitError, WaitSettings};

fn default_timeout_secs() -> u64 {
    crate::wait::DEFAULT_TIMEOUT.as_secs()
}

fn default_poll_interval_secs() -> u64 {
    crate::wait::DEFAULT_POLL_INTERVAL.as_secs()
}

/// Top-level wait definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitDefinition {
    /// How to fetch a resource by id
    pub fetcher: FetcherConfig,
    /// Maximum time to wait per resource, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Time between fetches, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Resource ids to wait for
    #[serde(default)]
    pub resources: Vec<String>,
    /// Conditions every resource must satisfy
    #[serde(default)]
    pub conditions: ConditionSet,
}

impl WaitDefinition {
    pub fn settings(&self) -> Result<WaitSettings, WaitError> {
        WaitSettings::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.poll_interval_secs),
        )
    }
}

/// Fetcher selection, tagged by `kind`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetcherConfig {
    Http(HttpFetcherConfig),
    Command(CommandFetcherConfig),
}

/// GET a JSON document from a URL template
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HttpFetcherConfig {
    /// URL with an `{id}` placeholder
    pub url: String,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Environment variable holding a bearer token
    #[serde(default)]
    pub bearer_token_env: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Run a program that prints the resource as JSON on stdout
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CommandFetcherConfig {
    pub program: String,
    /// Arguments; `{id}` is replaced by the resource id
    #[serde(default)]
    pub args: Vec<String>,
}
