// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology Registry Service
//!
//! Application service owning the ordered, name-unique set of technologies.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Orchestrates the repository, XML mapping and file discovery
//! - **Consumers:** CLI, embedding applications via [`TechnologyRegistry::global`]
//!
//! # Consistency
//!
//! Bulk operations decode everything first and then apply the accepted
//! technologies through a single [`TechnologyRepository::insert_batch`] call,
//! so concurrent readers see either the state before or after the import.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::domain::registry_config::RegistryConfigManifest;
use crate::domain::repository::{CollisionPolicy, InsertOutcome, TechnologyHandle, TechnologyRepository};
use crate::domain::technology::{Technology, TechnologyError};
use crate::infrastructure::component_codecs::ComponentCodecs;
use crate::infrastructure::repositories::InMemoryTechnologyRepository;
use crate::infrastructure::technology_scanner::scan_technology_files;
use crate::infrastructure::technology_xml::TechnologyXml;
use crate::infrastructure::xml_tree::XmlStyle;

static GLOBAL_REGISTRY: OnceLock<TechnologyRegistry> = OnceLock::new();

/// A technology that was not taken over by an import
#[derive(Debug)]
pub struct RejectedTechnology {
    /// Technology name, file path or block position, whichever identifies it best
    pub source: String,
    pub error: TechnologyError,
}

/// Outcome of a bulk import
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub replaced: Vec<String>,
    pub rejected: Vec<RejectedTechnology>,
}

impl ImportReport {
    /// True if every technology was accepted
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn accepted(&self) -> usize {
        self.imported.len() + self.replaced.len()
    }

    fn reject(&mut self, source: impl Into<String>, error: TechnologyError) {
        let source = source.into();
        warn!(source = %source, error = %error, "Technology rejected");
        self.rejected.push(RejectedTechnology { source, error });
    }
}

pub struct TechnologyRegistry {
    repository: Arc<dyn TechnologyRepository>,
    xml: TechnologyXml,
    collision_policy: CollisionPolicy,
}

impl Default for TechnologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TechnologyRegistry {
    /// Empty in-memory registry with the builtin component codecs
    pub fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryTechnologyRepository::new()))
    }

    pub fn with_repository(repository: Arc<dyn TechnologyRepository>) -> Self {
        Self {
            repository,
            xml: TechnologyXml::default(),
            collision_policy: CollisionPolicy::default(),
        }
    }

    pub fn with_codecs(mut self, codecs: ComponentCodecs) -> Self {
        self.xml = TechnologyXml::new(codecs);
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Registry configured from a manifest. Technology paths are not loaded.
    pub fn from_config(config: &RegistryConfigManifest) -> Self {
        Self::new().with_collision_policy(config.spec.import.collision_policy)
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    pub fn codecs(&self) -> &ComponentCodecs {
        self.xml.codecs()
    }

    // ------------------------------------------------------------------------
    // Process-wide instance
    // ------------------------------------------------------------------------

    /// The process-wide registry. Created empty on first use unless
    /// [`TechnologyRegistry::init_global`] ran before.
    pub fn global() -> &'static TechnologyRegistry {
        GLOBAL_REGISTRY.get_or_init(TechnologyRegistry::new)
    }

    /// Build the process-wide registry from a manifest and load its technology
    /// paths. Fails if the global registry already exists.
    pub fn init_global(config: &RegistryConfigManifest) -> anyhow::Result<&'static TechnologyRegistry> {
        if GLOBAL_REGISTRY.get().is_some() {
            anyhow::bail!("The global technology registry is already initialized");
        }

        let registry = Self::from_config(config);
        let report = registry.load_paths(&config.spec.technology_paths);
        info!(
            technologies = registry.len(),
            rejected = report.rejected.len(),
            "Initialized global technology registry"
        );

        GLOBAL_REGISTRY
            .set(registry)
            .map_err(|_| anyhow::anyhow!("The global technology registry is already initialized"))?;
        Ok(Self::global())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Current technology names in registry order
    pub fn names(&self) -> Vec<String> {
        self.repository.names()
    }

    pub fn has(&self, name: &str) -> bool {
        self.repository.contains(name)
    }

    pub fn lookup(&self, name: &str) -> Option<TechnologyHandle> {
        self.repository.find_by_name(name)
    }

    pub fn len(&self) -> usize {
        self.repository.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repository.is_empty()
    }

    /// Owned copies of all technologies in registry order
    pub fn snapshot(&self) -> Vec<Technology> {
        self.repository
            .list_all()
            .iter()
            .map(|handle| handle.read().clone())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Create and register an empty technology
    pub fn create(&self, name: &str) -> Result<TechnologyHandle, TechnologyError> {
        let handle = self.repository.insert(Technology::new(name))?;
        info!(name = %name, "Created technology");
        Ok(handle)
    }

    /// Register a copy of `technology`
    pub fn register(&self, technology: &Technology) -> Result<TechnologyHandle, TechnologyError> {
        let handle = self.repository.insert(technology.clone())?;
        info!(name = %technology.name(), "Registered technology");
        Ok(handle)
    }

    /// Remove a technology. Returns false if there was none with that name.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.repository.delete(name);
        if removed {
            info!(name = %name, "Removed technology");
        } else {
            debug!(name = %name, "Nothing to remove");
        }
        removed
    }

    pub fn clear(&self) {
        let removed = self.repository.clear();
        info!(removed, "Cleared technology registry");
    }

    // ------------------------------------------------------------------------
    // XML
    // ------------------------------------------------------------------------

    /// Parse a single technology. The result is not registered.
    pub fn technology_from_xml(&self, xml: &str) -> Result<Technology, TechnologyError> {
        self.xml.parse_technology(xml)
    }

    pub fn technology_to_xml(&self, technology: &Technology) -> Result<String, TechnologyError> {
        self.xml.write_technology(technology, XmlStyle::Compact)
    }

    /// Serialize every persisted technology as a `<technologies>` document
    pub fn export_all_xml(&self) -> Result<String, TechnologyError> {
        let technologies: Vec<Technology> = self
            .snapshot()
            .into_iter()
            .filter(Technology::is_persisted)
            .collect();
        debug!(count = technologies.len(), "Exporting technologies");
        self.xml.write_technologies(&technologies, XmlStyle::Compact)
    }

    /// Import a `<technologies>` document.
    ///
    /// Bad blocks and name collisions are reported and skipped. A document
    /// that cannot be read at all fails without touching the registry.
    pub fn import_all_xml(&self, xml: &str) -> Result<ImportReport, TechnologyError> {
        let mut report = ImportReport::default();
        let mut accepted = Vec::new();

        for (index, block) in self.xml.parse_technologies(xml)?.into_iter().enumerate() {
            match block {
                Ok(technology) => accepted.push(technology),
                Err(e) => report.reject(format!("technology #{}", index + 1), e),
            }
        }

        self.apply(accepted, &mut report);
        info!(
            imported = report.imported.len(),
            replaced = report.replaced.len(),
            rejected = report.rejected.len(),
            "Imported technologies"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------------

    /// Load every `*.lyt` file below `dir` and register the results.
    ///
    /// Fails without touching the registry if `dir` cannot be scanned.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<ImportReport, TechnologyError> {
        let dir = dir.as_ref();
        let mut report = ImportReport::default();
        let mut accepted = Vec::new();
        self.read_directory(dir, &mut accepted, &mut report)?;

        self.apply(accepted, &mut report);
        info!(
            dir = ?dir,
            loaded = report.accepted(),
            rejected = report.rejected.len(),
            "Loaded technology directory"
        );
        Ok(report)
    }

    /// Load several directories as one batch.
    ///
    /// A directory that cannot be scanned is reported in the rejected list
    /// and the remaining directories are still loaded.
    pub fn load_paths(&self, dirs: &[PathBuf]) -> ImportReport {
        let mut report = ImportReport::default();
        let mut accepted = Vec::new();

        for dir in dirs {
            if let Err(e) = self.read_directory(dir, &mut accepted, &mut report) {
                report.reject(dir.display().to_string(), e);
            }
        }

        self.apply(accepted, &mut report);
        info!(
            dirs = dirs.len(),
            loaded = report.accepted(),
            rejected = report.rejected.len(),
            "Loaded technology paths"
        );
        report
    }

    fn read_directory(
        &self,
        dir: &Path,
        accepted: &mut Vec<Technology>,
        report: &mut ImportReport,
    ) -> Result<(), TechnologyError> {
        for file in scan_technology_files(dir)? {
            match self.xml.load_file(&file) {
                Ok(technology) => accepted.push(technology),
                Err(e) => report.reject(file.display().to_string(), e),
            }
        }
        Ok(())
    }

    fn apply(&self, technologies: Vec<Technology>, report: &mut ImportReport) {
        for (name, outcome) in self.repository.insert_batch(technologies, self.collision_policy) {
            match outcome {
                InsertOutcome::Inserted => report.imported.push(name),
                InsertOutcome::Replaced => report.replaced.push(name),
                InsertOutcome::Duplicate => {
                    report.reject(name.clone(), TechnologyError::DuplicateName(name))
                }
            }
        }
    }
}
