// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology Component Codecs
//!
//! The set of component types is open. Each type registers a codec under its
//! formal name, which is also the XML tag of its block inside `<components>`:
//!
//! ```xml
//! <components>
//!   <connectivity>
//!     <connection>metal1,via1,metal2</connection>
//!     <symbols>diff=1/0+2/0</symbols>
//!   </connectivity>
//!   <d25><src>z(input(1, 0), zstart: 0.1, height: 0.2)</src></d25>
//! </components>
//! ```
//!
//! Blocks without a registered codec are not an error: they are kept as
//! [`OpaqueComponent`]s and written back unchanged.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::component::{
    component_boilerplate, ConductorConnection, D25Technology, LayerSymbol, NetTracerTechnology,
    TechnologyComponent,
};
use crate::domain::technology::TechnologyError;
use crate::infrastructure::xml_tree::XmlElement;

pub type DecodeFn = fn(&XmlElement) -> Result<Box<dyn TechnologyComponent>, TechnologyError>;
pub type EncodeFn = fn(&dyn TechnologyComponent) -> Result<XmlElement, TechnologyError>;

/// Decode/encode function pair for one component type
#[derive(Clone, Copy)]
pub struct ComponentCodec {
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

/// A component block of unknown type, preserved verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueComponent {
    element: XmlElement,
}

impl OpaqueComponent {
    pub fn new(element: XmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &XmlElement {
        &self.element
    }
}

impl TechnologyComponent for OpaqueComponent {
    fn name(&self) -> &str {
        &self.element.name
    }

    fn description(&self) -> &str {
        "Unknown component"
    }

    component_boilerplate!();
}

/// Registry of component codecs keyed by formal name
#[derive(Clone)]
pub struct ComponentCodecs {
    codecs: HashMap<String, ComponentCodec>,
}

impl Default for ComponentCodecs {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ComponentCodecs {
    /// No codecs at all; every component block is kept opaquely
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Codecs for the builtin component types
    pub fn builtin() -> Self {
        let mut codecs = Self::empty();
        codecs.register(
            NetTracerTechnology::NAME,
            ComponentCodec {
                decode: decode_net_tracer,
                encode: encode_net_tracer,
            },
        );
        codecs.register(
            D25Technology::NAME,
            ComponentCodec {
                decode: decode_d25,
                encode: encode_d25,
            },
        );
        codecs
    }

    /// Registers a codec, replacing a previous one for the same name
    pub fn register(&mut self, name: impl Into<String>, codec: ComponentCodec) {
        self.codecs.insert(name.into(), codec);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    /// Decodes one component block. Unknown tags yield an [`OpaqueComponent`].
    pub fn decode(&self, element: &XmlElement) -> Result<Box<dyn TechnologyComponent>, TechnologyError> {
        match self.codecs.get(&element.name) {
            Some(codec) => (codec.decode)(element),
            None => {
                warn!(component = %element.name, "Unknown technology component, keeping it verbatim");
                Ok(Box::new(OpaqueComponent::new(element.clone())))
            }
        }
    }

    pub fn encode(&self, component: &dyn TechnologyComponent) -> Result<XmlElement, TechnologyError> {
        if let Some(opaque) = component.downcast_ref::<OpaqueComponent>() {
            return Ok(opaque.element().clone());
        }
        match self.codecs.get(component.name()) {
            Some(codec) => (codec.encode)(component),
            None => Err(TechnologyError::Component(format!(
                "No codec registered for component '{}'",
                component.name()
            ))),
        }
    }
}

fn type_mismatch(expected: &str, component: &dyn TechnologyComponent) -> TechnologyError {
    TechnologyError::Component(format!(
        "Component '{}' is not a {}",
        component.name(),
        expected
    ))
}

fn decode_net_tracer(element: &XmlElement) -> Result<Box<dyn TechnologyComponent>, TechnologyError> {
    let mut tech = NetTracerTechnology::new();
    for child in &element.children {
        match child.name.as_str() {
            "connection" => tech.connections.push(child.text.parse::<ConductorConnection>()?),
            "symbols" => tech.symbols.push(child.text.parse::<LayerSymbol>()?),
            other => warn!(element = %other, "Ignoring unknown element in connectivity component"),
        }
    }
    Ok(Box::new(tech))
}

fn encode_net_tracer(component: &dyn TechnologyComponent) -> Result<XmlElement, TechnologyError> {
    let tech = component
        .downcast_ref::<NetTracerTechnology>()
        .ok_or_else(|| type_mismatch("NetTracerTechnology", component))?;

    let mut element = XmlElement::new(NetTracerTechnology::NAME);
    for connection in &tech.connections {
        element.push(XmlElement::with_text("connection", connection.to_string()));
    }
    for symbol in &tech.symbols {
        element.push(XmlElement::with_text("symbols", symbol.to_string()));
    }
    Ok(element)
}

fn decode_d25(element: &XmlElement) -> Result<Box<dyn TechnologyComponent>, TechnologyError> {
    let src = element.child("src").map(|s| s.text.clone()).unwrap_or_default();
    Ok(Box::new(D25Technology::new(src)))
}

fn encode_d25(component: &dyn TechnologyComponent) -> Result<XmlElement, TechnologyError> {
    let tech = component
        .downcast_ref::<D25Technology>()
        .ok_or_else(|| type_mismatch("D25Technology", component))?;

    let mut element = XmlElement::new(D25Technology::NAME);
    element.push(XmlElement::with_text("src", tech.src.clone()));
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_tracer_codec() {
        let mut nt = NetTracerTechnology::new();
        nt.connections.push(ConductorConnection::with_via("m1", "v1", "m2"));
        nt.symbols.push("diff=1/0+2/0".parse().unwrap());

        let codecs = ComponentCodecs::builtin();
        let element = codecs.encode(&nt).unwrap();
        assert_eq!(element.name, "connectivity");

        let decoded = codecs.decode(&element).unwrap();
        assert_eq!(decoded.downcast_ref::<NetTracerTechnology>(), Some(&nt));
    }

    #[test]
    fn test_unknown_component_is_opaque() {
        let xml = "<lvs><script>run()</script><flag/></lvs>";
        let element = XmlElement::parse(xml).unwrap();

        let codecs = ComponentCodecs::builtin();
        let decoded = codecs.decode(&element).unwrap();
        assert_eq!(decoded.name(), "lvs");
        assert!(decoded.downcast_ref::<OpaqueComponent>().is_some());
        assert_eq!(codecs.encode(&*decoded).unwrap(), element);
    }

    #[test]
    fn test_missing_codec_on_encode() {
        let codecs = ComponentCodecs::empty();
        let err = codecs.encode(&D25Technology::new("x")).unwrap_err();
        assert!(matches!(err, TechnologyError::Component(_)));
    }

    #[test]
    fn test_bad_connection_fails_decode() {
        let element = XmlElement::parse("<connectivity><connection>m1</connection></connectivity>").unwrap();
        assert!(ComponentCodecs::builtin().decode(&element).is_err());
    }
}
