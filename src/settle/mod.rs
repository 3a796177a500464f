// SPDX-License-Identifier: MIT

pub mod batch;
pub mod config;
pub mod error;
pub mod fetchers;
