// SPDX-License-Identifier: MIT

//! Command fetcher - run a program that prints the resource as JSON

use crate::settle::config::{CommandFetcherConfig, ID_PLACEHOLDER};
use crate::settle::error::SettleError;
use crate::wait::{FetchError, Fetcher};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

/// Runs `program args...` per fetch and decodes stdout as JSON
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
}

impl CommandFetcher {
    pub fn new(config: &CommandFetcherConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Arguments with `{id}` replaced by the resource id
    pub fn args_for(&self, resource_id: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(ID_PLACEHOLDER, resource_id))
            .collect()
    }

    async fn run(&self, resource_id: &str) -> Result<Value, SettleError> {
        let args = self.args_for(resource_id);
        log::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(SettleError::Command {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl Fetcher for CommandFetcher {
    type Resource = Value;

    async fn fetch(&self, resource_id: &str) -> Result<Value, FetchError> {
        Ok(self.run(resource_id).await?)
    }
}
