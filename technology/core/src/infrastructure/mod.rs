// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod xml_tree;
pub mod component_codecs;
pub mod technology_xml;
pub mod technology_scanner;
pub mod repositories;
