// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Default Grid List
//!
//! A technology may replace the global editing grid list with its own set of
//! grids. One of them can be marked as the *strong default*, which is the grid
//! the editor falls back to when the current grid is not one of the listed
//! ones.
//!
//! # Encoding
//!
//! The list is persisted as a single comma-separated string for compatibility
//! with the older configuration format. The strong default carries a trailing
//! `!`:
//!
//! ```text
//! 0.1,0.2!,0.5
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value object for the default grid list and its string codec

use std::fmt;
use std::str::FromStr;

use super::technology::TechnologyError;

/// Two grid values closer than this are considered equal (micron units).
pub const GRID_EPSILON: f64 = 1e-5;

/// Marker appended to the strong default entry in the encoded form.
const DEFAULT_MARKER: char = '!';

/// Returns true if two grid values are equal within [`GRID_EPSILON`].
pub fn grid_equals(a: f64, b: f64) -> bool {
    (a - b).abs() < GRID_EPSILON
}

/// Ordered list of grid values with an optional strong default.
///
/// Invariant: if `default` is set, it is one of the values in `grids`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultGrids {
    grids: Vec<f64>,
    default: Option<f64>,
}

impl DefaultGrids {
    /// Grid list without a strong default.
    pub fn new(grids: Vec<f64>) -> Self {
        Self { grids, default: None }
    }

    /// Grid list with a strong default.
    ///
    /// The default only becomes active if it matches one of the list entries.
    /// The stored default is the matching list entry, not the argument.
    pub fn with_default(grids: Vec<f64>, default: f64) -> Self {
        let default = grids.iter().copied().find(|g| grid_equals(*g, default));
        Self { grids, default }
    }

    pub fn grids(&self) -> &[f64] {
        &self.grids
    }

    /// The strong default grid, if one is marked.
    pub fn default_grid(&self) -> Option<f64> {
        self.default
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl fmt::Display for DefaultGrids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut marked = false;
        for (i, g) in self.grids.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", g)?;
            if !marked && self.default.is_some_and(|d| grid_equals(*g, d)) {
                write!(f, "{}", DEFAULT_MARKER)?;
                marked = true;
            }
        }
        Ok(())
    }
}

impl FromStr for DefaultGrids {
    type Err = TechnologyError;

    /// Decodes the comma-separated form.
    ///
    /// Zero markers mean "no strong default". If several entries carry a
    /// marker, the first one wins and the others are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut grids = Vec::new();
        let mut default = None;

        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        for raw in s.split(',') {
            let entry = raw.trim();
            let (value, is_marked) = match entry.strip_suffix(DEFAULT_MARKER) {
                Some(v) => (v.trim_end(), true),
                None => (entry, false),
            };

            let g: f64 = value.parse().map_err(|_| {
                TechnologyError::InvalidGrid(format!("'{}' is not a grid value in '{}'", value, s))
            })?;
            if !g.is_finite() {
                return Err(TechnologyError::InvalidGrid(format!(
                    "'{}' is not a finite grid value",
                    value
                )));
            }

            if is_marked {
                if default.is_none() {
                    default = Some(g);
                } else {
                    tracing::warn!(
                        grids = %s,
                        ignored = g,
                        "Multiple strong default grids marked, keeping the first one"
                    );
                }
            }
            grids.push(g);
        }

        Ok(Self { grids, default })
    }
}
