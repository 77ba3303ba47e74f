// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementation of the `TechnologyRepository` abstraction
//! defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Keep technology aggregates in memory
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryTechnologyRepository** - Thread-safe, insertion-ordered storage
//!
//! # Consistency
//!
//! One `parking_lot::RwLock` guards the ordered entry list. Every mutation,
//! including batch inserts, happens under a single write lock acquisition, so
//! readers never observe a half-applied batch.
//!
//! Replacing an entry swaps in a new handle instead of writing through the
//! old one, so a batch never waits on a handle lock held by a caller.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::repository::{
    CollisionPolicy, InsertOutcome, RepositoryError, TechnologyHandle, TechnologyRepository,
};
use crate::domain::technology::Technology;

#[derive(Clone, Default)]
pub struct InMemoryTechnologyRepository {
    entries: Arc<RwLock<Vec<TechnologyHandle>>>,
}

impl InMemoryTechnologyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(entries: &[TechnologyHandle], name: &str) -> Option<usize> {
        entries.iter().position(|h| h.read().name() == name)
    }
}

impl TechnologyRepository for InMemoryTechnologyRepository {
    fn insert(&self, technology: Technology) -> Result<TechnologyHandle, RepositoryError> {
        let mut entries = self.entries.write();
        if Self::position(&entries, technology.name()).is_some() {
            return Err(RepositoryError::DuplicateName(technology.name().to_string()));
        }

        debug!(name = %technology.name(), "Storing technology");
        let handle = Arc::new(RwLock::new(technology));
        entries.push(handle.clone());
        Ok(handle)
    }

    fn insert_batch(
        &self,
        technologies: Vec<Technology>,
        policy: CollisionPolicy,
    ) -> Vec<(String, InsertOutcome)> {
        let mut entries = self.entries.write();
        let mut batch_names = HashSet::with_capacity(technologies.len());
        let mut outcomes = Vec::with_capacity(technologies.len());

        for technology in technologies {
            let name = technology.name().to_string();
            // A name already taken by this batch is a duplicate: first one wins
            if !batch_names.insert(name.clone()) {
                outcomes.push((name, InsertOutcome::Duplicate));
                continue;
            }

            let outcome = match Self::position(&entries, &name) {
                None => {
                    entries.push(Arc::new(RwLock::new(technology)));
                    InsertOutcome::Inserted
                }
                // Swap in a fresh handle; handles held by callers are detached
                Some(index) if policy == CollisionPolicy::Replace => {
                    entries[index] = Arc::new(RwLock::new(technology));
                    InsertOutcome::Replaced
                }
                Some(_) => InsertOutcome::Duplicate,
            };
            outcomes.push((name, outcome));
        }

        outcomes
    }

    fn find_by_name(&self, name: &str) -> Option<TechnologyHandle> {
        let entries = self.entries.read();
        entries.iter().find(|h| h.read().name() == name).cloned()
    }

    fn names(&self) -> Vec<String> {
        let entries = self.entries.read();
        entries.iter().map(|h| h.read().name().to_string()).collect()
    }

    fn list_all(&self) -> Vec<TechnologyHandle> {
        self.entries.read().clone()
    }

    fn delete(&self, name: &str) -> bool {
        let mut entries = self.entries.write();
        match Self::position(&entries, name) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        count
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
