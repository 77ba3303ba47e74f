// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Technology Aggregate
//!
//! A technology is a named bundle of layout-editing defaults: the database
//! unit, default grids, the layer properties file, layout reader/writer
//! options and a set of [`TechnologyComponent`] extension blocks.
//!
//! ## Identity
//!
//! The technology name is the key under which it is registered (see
//! `crate::application::technology_registry`). The name may be changed on a
//! record at any time; uniqueness is only enforced by the registry when a
//! record is inserted.
//!
//! ## Base Path
//!
//! Files referenced by a technology are resolved against its base path. The
//! *default* base path is the directory the technology file was loaded from;
//! an *explicit* base path overrides it when set.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Technology record, its invariants and error type

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use super::component::TechnologyComponent;
use super::grid::DefaultGrids;
use super::layout_options::LayoutOptions;
use super::path_resolver::PathResolver;

/// Default database unit in micron.
pub const DEFAULT_DBU: f64 = 0.001;

/// Technology errors
#[derive(Debug, Error)]
pub enum TechnologyError {
    #[error("A technology named '{0}' already exists")]
    DuplicateName(String),

    #[error("Technology not found: {0}")]
    NotFound(String),

    #[error("Malformed technology XML: {0}")]
    MalformedXml(String),

    #[error("Invalid default grid list: {0}")]
    InvalidGrid(String),

    #[error("Unable to access technology file {path:?}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Technology component error: {0}")]
    Component(String),
}

impl TechnologyError {
    pub fn path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Path {
            path: path.into(),
            source,
        }
    }
}

/// A technology definition.
///
/// Cloning a technology deep-copies everything, components included.
#[derive(Debug, Clone)]
pub struct Technology {
    name: String,
    description: String,
    group: String,
    dbu: f64,
    default_grids: DefaultGrids,
    layer_properties_file: String,
    default_base_path: String,
    explicit_base_path: String,
    add_other_layers: bool,
    load_layout_options: LayoutOptions,
    save_layout_options: LayoutOptions,
    components: BTreeMap<String, Box<dyn TechnologyComponent>>,

    // Runtime state, not part of the persisted form
    tech_file_path: String,
    readonly: bool,
    persisted: bool,
}

impl Default for Technology {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            group: String::new(),
            dbu: DEFAULT_DBU,
            default_grids: DefaultGrids::default(),
            layer_properties_file: String::new(),
            default_base_path: String::new(),
            explicit_base_path: String::new(),
            add_other_layers: true,
            load_layout_options: LayoutOptions::default(),
            save_layout_options: LayoutOptions::default(),
            components: BTreeMap::new(),
            tech_file_path: String::new(),
            readonly: false,
            persisted: true,
        }
    }
}

/// Equality covers the persisted fields only. The file path and the
/// `readonly`/`persisted` flags describe where a record came from, not what it is.
impl PartialEq for Technology {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.group == other.group
            && self.dbu == other.dbu
            && self.default_grids == other.default_grids
            && self.layer_properties_file == other.layer_properties_file
            && self.default_base_path == other.default_base_path
            && self.explicit_base_path == other.explicit_base_path
            && self.add_other_layers == other.add_other_layers
            && self.load_layout_options == other.load_layout_options
            && self.save_layout_options == other.save_layout_options
            && self.components == other.components
    }
}

impl Technology {
    /// Create an empty technology with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------------
    // Identity and display
    // ------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Technologies with the same group are presented together
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = group.into();
    }

    // ------------------------------------------------------------------------
    // Units and grids
    // ------------------------------------------------------------------------

    /// Default database unit used when creating a layout
    pub fn dbu(&self) -> f64 {
        self.dbu
    }

    pub fn set_dbu(&mut self, dbu: f64) {
        self.dbu = dbu;
    }

    pub fn default_grids(&self) -> &DefaultGrids {
        &self.default_grids
    }

    /// Replaces the whole grid list, including its strong default
    pub fn set_default_grids_value(&mut self, grids: DefaultGrids) {
        self.default_grids = grids;
    }

    pub fn default_grid_list(&self) -> Vec<f64> {
        self.default_grids.grids().to_vec()
    }

    /// The strong default grid, if any
    pub fn default_grid(&self) -> Option<f64> {
        self.default_grids.default_grid()
    }

    /// Sets the grid list and resets the strong default
    pub fn set_default_grid_list(&mut self, grids: Vec<f64>) {
        self.default_grids = DefaultGrids::new(grids);
    }

    /// Sets the grid list and the strong default.
    ///
    /// The default only becomes active if it is a member of `grids`.
    pub fn set_default_grids(&mut self, grids: Vec<f64>, default_grid: f64) {
        self.default_grids = DefaultGrids::with_default(grids, default_grid);
    }

    // ------------------------------------------------------------------------
    // Files and base paths
    // ------------------------------------------------------------------------

    pub fn layer_properties_file(&self) -> &str {
        &self.layer_properties_file
    }

    pub fn set_layer_properties_file(&mut self, file: impl Into<String>) {
        self.layer_properties_file = file.into();
    }

    /// The layer properties file resolved against the base path
    pub fn eff_layer_properties_file(&self) -> String {
        self.build_effective_path(&self.layer_properties_file)
    }

    pub fn add_other_layers(&self) -> bool {
        self.add_other_layers
    }

    pub fn set_add_other_layers(&mut self, add: bool) {
        self.add_other_layers = add;
    }

    /// The directory the technology was imported from
    pub fn default_base_path(&self) -> &str {
        &self.default_base_path
    }

    pub fn set_default_base_path(&mut self, path: impl Into<String>) {
        self.default_base_path = path.into();
    }

    pub fn explicit_base_path(&self) -> &str {
        &self.explicit_base_path
    }

    pub fn set_explicit_base_path(&mut self, path: impl Into<String>) {
        self.explicit_base_path = path.into();
    }

    /// The effective base path: the explicit one if set, the default one otherwise
    pub fn base_path(&self) -> &str {
        if self.explicit_base_path.is_empty() {
            &self.default_base_path
        } else {
            &self.explicit_base_path
        }
    }

    /// Makes `path` relative to the base path if it lies below it
    pub fn correct_path(&self, path: &str) -> String {
        PathResolver::new(self.base_path()).correct_path(path)
    }

    /// Resolves a relative `path` against the base path
    pub fn build_effective_path(&self, path: &str) -> String {
        PathResolver::new(self.base_path()).build_effective_path(path)
    }

    /// Absolute path of the file this technology was loaded from (empty if none)
    pub fn tech_file_path(&self) -> &str {
        &self.tech_file_path
    }

    pub fn set_tech_file_path(&mut self, path: impl Into<String>) {
        self.tech_file_path = path.into();
    }

    // ------------------------------------------------------------------------
    // Reader/writer options
    // ------------------------------------------------------------------------

    /// Layout reader options (a copy; use the setter to apply changes)
    pub fn load_layout_options(&self) -> LayoutOptions {
        self.load_layout_options.clone()
    }

    pub fn set_load_layout_options(&mut self, options: LayoutOptions) {
        self.load_layout_options = options;
    }

    /// Layout writer options (a copy; use the setter to apply changes)
    pub fn save_layout_options(&self) -> LayoutOptions {
        self.save_layout_options.clone()
    }

    pub fn set_save_layout_options(&mut self, options: LayoutOptions) {
        self.save_layout_options = options;
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    pub fn component_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    pub fn component(&self, name: &str) -> Option<&dyn TechnologyComponent> {
        self.components.get(name).map(|c| &**c)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut (dyn TechnologyComponent + 'static)> {
        self.components.get_mut(name).map(|c| &mut **c)
    }

    /// Typed access to a component
    pub fn component_as<T: TechnologyComponent>(&self, name: &str) -> Option<&T> {
        self.component(name).and_then(|c| c.downcast_ref::<T>())
    }

    /// Inserts a component under its formal name, replacing one with the same name
    pub fn set_component(&mut self, component: Box<dyn TechnologyComponent>) -> Option<Box<dyn TechnologyComponent>> {
        self.components.insert(component.name().to_string(), component)
    }

    pub fn remove_component(&mut self, name: &str) -> Option<Box<dyn TechnologyComponent>> {
        self.components.remove(name)
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn TechnologyComponent> {
        self.components.values().map(|c| &**c)
    }

    // ------------------------------------------------------------------------
    // Runtime flags
    // ------------------------------------------------------------------------

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Persisted technologies take part in the registry-wide XML export
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{D25Technology, NetTracerTechnology};

    #[test]
    fn test_defaults() {
        let tech = Technology::new("sky130");
        assert_eq!(tech.name(), "sky130");
        assert_eq!(tech.dbu(), DEFAULT_DBU);
        assert!(tech.add_other_layers());
        assert!(tech.is_persisted());
        assert!(tech.default_grid_list().is_empty());
        assert_eq!(tech.base_path(), "");
    }

    #[test]
    fn test_base_path_precedence() {
        let mut tech = Technology::new("t");
        tech.set_default_base_path("/techs/t");
        assert_eq!(tech.base_path(), "/techs/t");

        tech.set_explicit_base_path("/override");
        assert_eq!(tech.base_path(), "/override");

        tech.set_explicit_base_path("");
        assert_eq!(tech.base_path(), "/techs/t");
    }

    #[test]
    fn test_eff_layer_properties_file() {
        let mut tech = Technology::new("t");
        tech.set_default_base_path("/techs/t");
        tech.set_layer_properties_file("layers.lyp");
        assert_eq!(tech.eff_layer_properties_file(), "/techs/t/layers.lyp");

        tech.set_layer_properties_file("/elsewhere/layers.lyp");
        assert_eq!(tech.eff_layer_properties_file(), "/elsewhere/layers.lyp");
    }

    #[test]
    fn test_grid_list_setter_resets_default() {
        let mut tech = Technology::new("t");
        tech.set_default_grids(vec![0.1, 0.2, 0.5], 0.2);
        assert_eq!(tech.default_grid(), Some(0.2));

        tech.set_default_grid_list(vec![0.1, 0.2]);
        assert_eq!(tech.default_grid(), None);
        assert_eq!(tech.default_grid_list(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_options_are_copied_out() {
        let mut tech = Technology::new("t");
        let mut opts = tech.load_layout_options();
        opts.set("dxf", "dbu", "2.5");
        assert!(tech.load_layout_options().is_empty());

        tech.set_load_layout_options(opts);
        assert_eq!(tech.load_layout_options().get("dxf", "dbu"), Some("2.5"));
    }

    #[test]
    fn test_components_are_deep_copied() {
        let mut tech = Technology::new("t");
        tech.set_component(Box::new(D25Technology::new("z(1.0)")));
        tech.set_component(Box::new(NetTracerTechnology::new()));
        assert_eq!(tech.component_names(), vec!["connectivity", "d25"]);

        let copy = tech.clone();
        if let Some(d25) = tech
            .component_mut(D25Technology::NAME)
            .and_then(|c| c.downcast_mut::<D25Technology>())
        {
            d25.src = "changed".to_string();
        }

        let original_src = &copy.component_as::<D25Technology>("d25").unwrap().src;
        assert_eq!(original_src, "z(1.0)");
        assert_ne!(tech, copy);
    }

    #[test]
    fn test_remove_component() {
        let mut tech = Technology::new("t");
        tech.set_component(Box::new(D25Technology::new("z(1.0)")));
        assert!(tech.remove_component("d25").is_some());
        assert!(tech.remove_component("d25").is_none());
        assert!(tech.component_names().is_empty());
    }

    #[test]
    fn test_equality_ignores_runtime_flags() {
        let a = Technology::new("t");
        let mut b = a.clone();
        b.set_readonly(true);
        b.set_persisted(false);
        b.set_tech_file_path("/x/t.lyt");
        assert!(b.is_readonly());
        assert_eq!(a, b);
    }
}
