// SPDX-License-Identifier: MIT

//! Wait definition files
//!
//! A wait file names a fetcher, the resources to wait for and the
//! conditions each must reach.

pub mod loader;
pub mod types;

pub use loader::{WaitLoader, ID_PLACEHOLDER};
pub use types::{CommandFetcherConfig, FetcherConfig, HttpFetcherConfig, WaitDefinition};
