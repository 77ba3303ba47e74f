// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod technology;
pub mod grid;
pub mod component;
pub mod layout_options;
pub mod path_resolver;
pub mod repository;
pub mod registry_config;
