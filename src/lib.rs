// SPDX-License-Identifier: MIT

pub mod settle;
pub mod wait;
