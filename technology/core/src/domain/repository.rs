// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interface
//!
//! Storage contract for the [`Technology`] aggregate, following the DDD
//! Repository pattern: the interface lives in the domain layer and is
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `TechnologyRepository` | `Technology` | `InMemoryTechnologyRepository` |
//!
//! ## Handles
//!
//! Stored technologies are handed out as [`TechnologyHandle`]s: shared,
//! lock-protected records. Callers mutate a registered technology in place
//! through its handle. Removing a technology from the repository only drops
//! the repository's reference, so a handle held elsewhere never dangles; it
//! simply becomes detached from the repository.
//!
//! Do not hold a handle's lock guard while calling into the repository. Name
//! lookups read every stored record.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::technology::{Technology, TechnologyError};

/// Shared handle to a stored technology
pub type TechnologyHandle = Arc<RwLock<Technology>>;

/// What to do when an inserted technology's name is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep the existing entry and report the collision
    #[default]
    Reject,
    /// Replace the existing entry, keeping its position. Handles to the
    /// replaced entry become detached.
    Replace,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            other => Err(format!("Unknown collision policy '{}'. Expected reject or replace", other)),
        }
    }
}

/// Result of inserting one technology of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Replaced,
    /// Rejected because of a name collision
    Duplicate,
}

/// Repository interface for Technology aggregates
///
/// Entries are kept in insertion order and are unique by their *current*
/// name at insertion time.
pub trait TechnologyRepository: Send + Sync {
    /// Insert a technology; fails if its name is taken
    fn insert(&self, technology: Technology) -> Result<TechnologyHandle, RepositoryError>;

    /// Insert several technologies under a single exclusive lock.
    ///
    /// Names are checked against the stored entries and against the earlier
    /// entries of the same batch; within a batch the first entry for a name
    /// wins. Readers see either none or all of the batch.
    fn insert_batch(
        &self,
        technologies: Vec<Technology>,
        policy: CollisionPolicy,
    ) -> Vec<(String, InsertOutcome)>;

    /// Find technology by its current name
    fn find_by_name(&self, name: &str) -> Option<TechnologyHandle>;

    fn contains(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Current names in insertion order
    fn names(&self) -> Vec<String>;

    /// All handles in insertion order
    fn list_all(&self) -> Vec<TechnologyHandle>;

    /// Delete technology by name. Returns false if there was none.
    fn delete(&self, name: &str) -> bool;

    /// Delete everything, returning the number of removed entries
    fn clear(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Duplicate technology name: {0}")]
    DuplicateName(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

impl From<RepositoryError> for TechnologyError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateName(name) => TechnologyError::DuplicateName(name),
            RepositoryError::NotFound(name) => TechnologyError::NotFound(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_policy_parse() {
        assert_eq!("reject".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Reject));
        assert_eq!("Replace".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Replace));
        assert!("overwrite".parse::<CollisionPolicy>().is_err());
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Reject);
    }

    #[test]
    fn test_error_mapping() {
        let err: TechnologyError = RepositoryError::DuplicateName("A".to_string()).into();
        assert!(matches!(err, TechnologyError::DuplicateName(name) if name == "A"));
    }
}
