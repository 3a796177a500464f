//! Wait file loader - YAML file loading, parsing and validation

use super::types::{FetcherConfig, WaitDefinition};
use crate::settle::error::SettleError;
use crate::wait::condition::CompiledConditions;
use std::fs;
use std::path::Path;

/// Placeholder substituted with the resource id in fetcher templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Loads wait definitions from YAML files
pub struct WaitLoader;

impl WaitLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate a wait definition from a YAML file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<WaitDefinition, SettleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SettleError::config(format!("cannot read wait file {}: {}", path.display(), e))
        })?;
        Self::parse_yaml(&content)
    }

    /// Parse and validate a wait definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<WaitDefinition, SettleError> {
        let def: WaitDefinition = serde_yaml::from_str(content)?;
        Self::validate(&def)?;
        Ok(def)
    }

    /// Check durations, condition paths and fetcher settings
    pub fn validate(def: &WaitDefinition) -> Result<(), SettleError> {
        if def.timeout_secs == 0 {
            return Err(SettleError::config("timeout_secs must be positive"));
        }
        if def.poll_interval_secs == 0 {
            return Err(SettleError::config("poll_interval_secs must be positive"));
        }
        if def.poll_interval_secs >= def.timeout_secs {
            log::warn!(
                "poll_interval_secs ({}) is not below timeout_secs ({}); at most one poll will happen",
                def.poll_interval_secs,
                def.timeout_secs
            );
        }

        for (i, cond) in def.conditions.iter().enumerate() {
            if cond.name.trim().is_empty() {
                return Err(SettleError::config(format!(
                    "condition #{} has an empty name",
                    i + 1
                )));
            }
            if cond.acceptable.is_empty() {
                log::warn!(
                    "condition '{}' has no acceptable values and can never be satisfied",
                    cond.name
                );
            }
        }

        CompiledConditions::compile(&def.conditions).map_err(|e| {
            SettleError::config(format!(
                "condition '{}' has an invalid path: {}",
                e.name, e.error
            ))
        })?;

        if def.resources.iter().any(|r| r.is_empty()) {
            return Err(SettleError::config("resource ids must not be empty"));
        }

        match &def.fetcher {
            FetcherConfig::Http(http) => {
                if !http.url.contains(ID_PLACEHOLDER) {
                    log::warn!(
                        "fetcher url '{}' has no {} placeholder; every resource fetches the same URL",
                        http.url,
                        ID_PLACEHOLDER
                    );
                }
                url::Url::parse(&http.url.replace(ID_PLACEHOLDER, "id"))?;
                if http.request_timeout_secs == Some(0) {
                    return Err(SettleError::config("request_timeout_secs must be positive"));
                }
            }
            FetcherConfig::Command(cmd) => {
                if cmd.program.trim().is_empty() {
                    return Err(SettleError::config("fetcher program must not be empty"));
                }
            }
        }

        Ok(())
    }
}

impl Default for WaitLoader {
    fn default() -> Self {
        Self::new()
    }
}
