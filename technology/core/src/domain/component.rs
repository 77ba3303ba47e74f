// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Technology Components
//!
//! Technology components extend a technology definition with settings for a
//! specific feature area. Each component has a formal name which is unique
//! within the owning technology and doubles as its XML tag. Components are
//! owned exclusively by one technology; copying a technology deep-copies its
//! components.
//!
//! Builtin components:
//!
//! | Component | Formal name | Contents |
//! |-----------|-------------|----------|
//! | [`NetTracerTechnology`] | `connectivity` | conductor connections and layer symbols |
//! | [`D25Technology`] | `d25` | 2.5D layer stack script |
//!
//! Components of unknown type are kept opaquely by the XML layer, see
//! `crate::infrastructure::component_codecs::OpaqueComponent`.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use super::technology::TechnologyError;

/// A named extension block of a technology.
pub trait TechnologyComponent: fmt::Debug + Send + Sync + 'static {
    /// Formal name, unique within the owning technology
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TechnologyComponent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Value equality across the trait object boundary
    fn eq_component(&self, other: &dyn TechnologyComponent) -> bool;
}

impl dyn TechnologyComponent {
    pub fn downcast_ref<T: TechnologyComponent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: TechnologyComponent>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl Clone for Box<dyn TechnologyComponent> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn TechnologyComponent {
    fn eq(&self, other: &Self) -> bool {
        self.eq_component(other)
    }
}

macro_rules! component_boilerplate {
    () => {
        fn clone_box(&self) -> Box<dyn $crate::domain::component::TechnologyComponent> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }

        fn eq_component(&self, other: &dyn $crate::domain::component::TechnologyComponent) -> bool {
            other.as_any().downcast_ref::<Self>() == Some(self)
        }
    };
}
pub(crate) use component_boilerplate;

// ============================================================================
// Net tracer
// ============================================================================

/// A conductor connection between two layers, optionally through a via layer.
///
/// Encoded as `layer_a,layer_b` or `layer_a,via,layer_b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConductorConnection {
    pub layer_a: String,
    pub via: Option<String>,
    pub layer_b: String,
}

impl ConductorConnection {
    pub fn new(layer_a: impl Into<String>, layer_b: impl Into<String>) -> Self {
        Self {
            layer_a: layer_a.into(),
            via: None,
            layer_b: layer_b.into(),
        }
    }

    pub fn with_via(
        layer_a: impl Into<String>,
        via: impl Into<String>,
        layer_b: impl Into<String>,
    ) -> Self {
        Self {
            layer_a: layer_a.into(),
            via: Some(via.into()),
            layer_b: layer_b.into(),
        }
    }
}

impl fmt::Display for ConductorConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.via {
            Some(via) => write!(f, "{},{},{}", self.layer_a, via, self.layer_b),
            None => write!(f, "{},{}", self.layer_a, self.layer_b),
        }
    }
}

impl FromStr for ConductorConnection {
    type Err = TechnologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(TechnologyError::Component(format!(
                "Empty layer in connection '{}'",
                s
            )));
        }
        match parts.as_slice() {
            [a, b] => Ok(Self::new(*a, *b)),
            [a, via, b] => Ok(Self::with_via(*a, *via, *b)),
            _ => Err(TechnologyError::Component(format!(
                "Connection '{}' must have two or three layers",
                s
            ))),
        }
    }
}

/// A named layer expression usable in connections, encoded as `name=expression`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSymbol {
    pub symbol: String,
    pub expression: String,
}

impl fmt::Display for LayerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.symbol, self.expression)
    }
}

impl FromStr for LayerSymbol {
    type Err = TechnologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, expression) = s.split_once('=').ok_or_else(|| {
            TechnologyError::Component(format!("Symbol '{}' is not of the form name=expression", s))
        })?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(TechnologyError::Component(format!("Symbol '{}' has no name", s)));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            expression: expression.trim().to_string(),
        })
    }
}

/// Net tracer settings: which layers conduct into each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetTracerTechnology {
    pub connections: Vec<ConductorConnection>,
    pub symbols: Vec<LayerSymbol>,
}

impl NetTracerTechnology {
    pub const NAME: &'static str = "connectivity";

    pub fn new() -> Self {
        Self::default()
    }
}

impl TechnologyComponent for NetTracerTechnology {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Connectivity"
    }

    component_boilerplate!();
}

// ============================================================================
// 2.5D view
// ============================================================================

/// 2.5D view settings: a script describing the z stack of the layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct D25Technology {
    pub src: String,
}

impl D25Technology {
    pub const NAME: &'static str = "d25";

    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

impl TechnologyComponent for D25Technology {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "2.5d View"
    }

    component_boilerplate!();
}
