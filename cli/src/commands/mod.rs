// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the lytech CLI

pub mod config;
pub mod tech;

pub use self::config::ConfigCommand;
pub use self::tech::TechCommand;
