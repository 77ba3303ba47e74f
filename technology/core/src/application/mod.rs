// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod technology_registry;

pub use technology_registry::{ImportReport, RejectedTechnology, TechnologyRegistry};
