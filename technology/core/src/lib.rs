// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lytech Core
//!
//! Layout technology registry: technology records, their XML persistence and
//! the process-wide registry.
//!
//! # Architecture
//!
//! - **domain:** records, grids, components, path rules, repository contract, config
//! - **infrastructure:** XML codec, in-memory repository, file discovery
//! - **application:** the registry service

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
