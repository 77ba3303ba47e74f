// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology XML Mapper
//!
//! Translates between technology documents and [`Technology`] records.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external XML → Domain objects and back
//! - **Anti-Corruption:** Legacy element names are mapped onto the domain model
//!
//! # Document Format
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <technology>
//!   <name>sky130</name>
//!   <dbu>0.001</dbu>
//!   <description>SkyWater 130nm</description>
//!   <group>open-pdks</group>
//!   <default-grids>0.005,0.01!,0.1</default-grids>
//!   <layer-properties-file>sky130.lyp</layer-properties-file>
//!   <default-base-path>/pdks/sky130</default-base-path>
//!   <explicit-base-path/>
//!   <add-other-layers>true</add-other-layers>
//!   <reader-options><gds2><box-mode>1</box-mode></gds2></reader-options>
//!   <writer-options/>
//!   <components>
//!     <connectivity><connection>met1,via,met2</connection></connectivity>
//!   </components>
//! </technology>
//! ```
//!
//! A registry-wide document wraps any number of `<technology>` elements in a
//! `<technologies>` root.
//!
//! Legacy names accepted on input: `base-path` (explicit base path),
//! `original-base-path` (default base path) and `layer-properties_file`.
//! Component blocks placed directly below `<technology>` are accepted when a
//! codec is registered for their tag.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::grid::DefaultGrids;
use crate::domain::layout_options::LayoutOptions;
use crate::domain::technology::{Technology, TechnologyError};
use crate::infrastructure::component_codecs::ComponentCodecs;
use crate::infrastructure::xml_tree::{XmlElement, XmlStyle};

pub const TECHNOLOGY_TAG: &str = "technology";
pub const TECHNOLOGIES_TAG: &str = "technologies";

// ============================================================================
// Mapper API
// ============================================================================

/// Maps technologies to and from XML using a set of component codecs
#[derive(Clone, Default)]
pub struct TechnologyXml {
    codecs: ComponentCodecs,
}

impl TechnologyXml {
    pub fn new(codecs: ComponentCodecs) -> Self {
        Self { codecs }
    }

    pub fn codecs(&self) -> &ComponentCodecs {
        &self.codecs
    }

    /// Parse a single `<technology>` document
    pub fn parse_technology(&self, xml: &str) -> Result<Technology, TechnologyError> {
        let root = XmlElement::parse(xml)?;
        if root.name != TECHNOLOGY_TAG {
            return Err(TechnologyError::MalformedXml(format!(
                "Expected <{}> root element, found <{}>",
                TECHNOLOGY_TAG, root.name
            )));
        }
        self.from_element(&root)
    }

    /// Serialize a single technology as a `<technology>` document
    pub fn write_technology(&self, tech: &Technology, style: XmlStyle) -> Result<String, TechnologyError> {
        self.to_element(tech)?.to_document(style)
    }

    /// Parse a `<technologies>` document.
    ///
    /// The outer `Result` fails if the document itself is unusable. Each
    /// `<technology>` block is decoded independently, so one bad block does
    /// not affect the others.
    pub fn parse_technologies(
        &self,
        xml: &str,
    ) -> Result<Vec<Result<Technology, TechnologyError>>, TechnologyError> {
        let root = XmlElement::parse(xml)?;
        if root.name != TECHNOLOGIES_TAG {
            return Err(TechnologyError::MalformedXml(format!(
                "Expected <{}> root element, found <{}>",
                TECHNOLOGIES_TAG, root.name
            )));
        }

        let mut blocks = Vec::new();
        for child in &root.children {
            if child.name == TECHNOLOGY_TAG {
                blocks.push(self.from_element(child));
            } else {
                warn!(element = %child.name, "Ignoring unknown element in technologies document");
            }
        }
        Ok(blocks)
    }

    /// Serialize technologies as a `<technologies>` document
    pub fn write_technologies<'a>(
        &self,
        technologies: impl IntoIterator<Item = &'a Technology>,
        style: XmlStyle,
    ) -> Result<String, TechnologyError> {
        let mut root = XmlElement::new(TECHNOLOGIES_TAG);
        for tech in technologies {
            root.push(self.to_element(tech)?);
        }
        root.to_document(style)
    }

    // ------------------------------------------------------------------------
    // Element mapping
    // ------------------------------------------------------------------------

    pub fn to_element(&self, tech: &Technology) -> Result<XmlElement, TechnologyError> {
        let mut element = XmlElement::new(TECHNOLOGY_TAG);
        element.push(XmlElement::with_text("name", tech.name()));
        let dbu = tech.dbu();
        if !dbu.is_finite() || dbu <= 0.0 {
            return Err(TechnologyError::MalformedXml(format!(
                "<dbu>: {} is not a positive database unit in technology '{}'",
                dbu,
                tech.name()
            )));
        }
        element.push(XmlElement::with_text("dbu", dbu.to_string()));
        element.push(XmlElement::with_text("description", tech.description()));
        element.push(XmlElement::with_text("group", tech.group()));
        element.push(XmlElement::with_text("default-grids", tech.default_grids().to_string()));
        element.push(XmlElement::with_text("layer-properties-file", tech.layer_properties_file()));
        element.push(XmlElement::with_text("default-base-path", tech.default_base_path()));
        element.push(XmlElement::with_text("explicit-base-path", tech.explicit_base_path()));
        element.push(XmlElement::with_text("add-other-layers", tech.add_other_layers().to_string()));
        element.push(options_to_element("reader-options", &tech.load_layout_options())?);
        element.push(options_to_element("writer-options", &tech.save_layout_options())?);

        let mut components = XmlElement::new("components");
        for component in tech.components() {
            components.push(self.codecs.encode(component)?);
        }
        element.push(components);

        Ok(element)
    }

    pub fn from_element(&self, element: &XmlElement) -> Result<Technology, TechnologyError> {
        let mut tech = Technology::default();
        let mut has_name = false;

        for child in &element.children {
            match child.name.as_str() {
                "name" => {
                    tech.set_name(child.text.as_str());
                    has_name = true;
                }
                "description" => tech.set_description(child.text.as_str()),
                "group" => tech.set_group(child.text.as_str()),
                "dbu" => tech.set_dbu(parse_dbu(&child.text)?),
                "default-grids" => {
                    let grids: DefaultGrids = child.text.parse().map_err(|e| {
                        TechnologyError::MalformedXml(format!("<default-grids>: {}", e))
                    })?;
                    tech.set_default_grids_value(grids);
                }
                "layer-properties-file" | "layer-properties_file" => {
                    tech.set_layer_properties_file(child.text.as_str())
                }
                "default-base-path" | "original-base-path" => {
                    tech.set_default_base_path(child.text.as_str())
                }
                "explicit-base-path" | "base-path" => tech.set_explicit_base_path(child.text.as_str()),
                "add-other-layers" => tech.set_add_other_layers(parse_bool("add-other-layers", &child.text)?),
                "reader-options" => tech.set_load_layout_options(options_from_element(child)?),
                "writer-options" => tech.set_save_layout_options(options_from_element(child)?),
                "components" => {
                    for block in &child.children {
                        self.add_component(&mut tech, block)?;
                    }
                }
                other if self.codecs.is_registered(other) => self.add_component(&mut tech, child)?,
                other => {
                    warn!(element = %other, "Ignoring unknown element in technology");
                }
            }
        }

        if !has_name {
            return Err(TechnologyError::MalformedXml(
                "Required element <name> is missing".to_string(),
            ));
        }

        debug!(name = %tech.name(), "Parsed technology");
        Ok(tech)
    }

    fn add_component(&self, tech: &mut Technology, block: &XmlElement) -> Result<(), TechnologyError> {
        if tech.component(&block.name).is_some() {
            return Err(TechnologyError::MalformedXml(format!(
                "Component '{}' is defined twice in technology '{}'",
                block.name,
                tech.name()
            )));
        }
        let component = self.codecs.decode(block).map_err(|e| match e {
            TechnologyError::Component(msg) => {
                TechnologyError::MalformedXml(format!("Component <{}>: {}", block.name, msg))
            }
            other => other,
        })?;
        tech.set_component(component);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // File access
    // ------------------------------------------------------------------------

    /// Load a technology file.
    ///
    /// The default base path becomes the absolute directory of the file and
    /// the technology remembers the absolute file path.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Technology, TechnologyError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| TechnologyError::path(path, e))?;
        let mut tech = self.parse_technology(&xml)?;

        let absolute = absolute_path(path).map_err(|e| TechnologyError::path(path, e))?;
        if let Some(dir) = absolute.parent() {
            tech.set_default_base_path(dir.to_string_lossy());
        }
        tech.set_tech_file_path(absolute.to_string_lossy());

        debug!(name = %tech.name(), path = ?absolute, "Loaded technology file");
        Ok(tech)
    }

    /// Write a technology file (indented)
    pub fn save_file(&self, tech: &Technology, path: impl AsRef<Path>) -> Result<(), TechnologyError> {
        let path = path.as_ref();
        let xml = self.write_technology(tech, XmlStyle::Pretty)?;
        std::fs::write(path, xml).map_err(|e| TechnologyError::path(path, e))?;
        debug!(name = %tech.name(), path = ?path, "Saved technology file");
        Ok(())
    }
}

// ============================================================================
// Technology convenience API (builtin component codecs)
// ============================================================================

impl Technology {
    /// Parse a technology from a `<technology>` document. The result is not registered.
    pub fn from_xml(xml: &str) -> Result<Technology, TechnologyError> {
        TechnologyXml::default().parse_technology(xml)
    }

    /// Serialize this technology as a `<technology>` document
    pub fn to_xml(&self) -> Result<String, TechnologyError> {
        TechnologyXml::default().write_technology(self, XmlStyle::Compact)
    }

    /// Replace this technology with the contents of a technology file
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), TechnologyError> {
        *self = TechnologyXml::default().load_file(path)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TechnologyError> {
        TechnologyXml::default().save_file(self, path)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(crate::domain::path_resolver::normalize(&absolute))
}

fn parse_dbu(text: &str) -> Result<f64, TechnologyError> {
    let dbu: f64 = text
        .trim()
        .parse()
        .map_err(|_| TechnologyError::MalformedXml(format!("<dbu>: '{}' is not a number", text)))?;
    if !dbu.is_finite() || dbu <= 0.0 {
        return Err(TechnologyError::MalformedXml(format!(
            "<dbu>: '{}' is not a positive database unit",
            text
        )));
    }
    Ok(dbu)
}

fn parse_bool(element: &str, text: &str) -> Result<bool, TechnologyError> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(TechnologyError::MalformedXml(format!(
            "<{}>: '{}' is not a boolean",
            element, other
        ))),
    }
}

/// Element names usable as option format and key tags
fn is_xml_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn options_to_element(tag: &str, options: &LayoutOptions) -> Result<XmlElement, TechnologyError> {
    let mut element = XmlElement::new(tag);
    for format in options.formats() {
        if !is_xml_name(format) {
            return Err(TechnologyError::MalformedXml(format!(
                "<{}>: '{}' is not a valid format name",
                tag, format
            )));
        }
        let mut block = XmlElement::new(format);
        for (key, value) in options.options(format) {
            if !is_xml_name(key) {
                return Err(TechnologyError::MalformedXml(format!(
                    "<{}>: '{}' is not a valid option name",
                    tag, key
                )));
            }
            block.push(XmlElement::with_text(key, value));
        }
        element.push(block);
    }
    Ok(element)
}

fn options_from_element(element: &XmlElement) -> Result<LayoutOptions, TechnologyError> {
    let mut options = LayoutOptions::new();
    for block in &element.children {
        for option in &block.children {
            if !option.children.is_empty() {
                return Err(TechnologyError::MalformedXml(format!(
                    "<{}>: option <{}> of format <{}> must be a text value",
                    element.name, option.name, block.name
                )));
            }
            options.set(block.name.as_str(), option.name.as_str(), option.text.as_str());
        }
    }
    Ok(options)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ConductorConnection, D25Technology, NetTracerTechnology};

    fn sample() -> Technology {
        let mut tech = Technology::new("sky130");
        tech.set_description("SkyWater <130nm> & friends");
        tech.set_group("open-pdks");
        tech.set_dbu(0.005);
        tech.set_default_grids(vec![0.005, 0.01, 0.1], 0.01);
        tech.set_layer_properties_file("sky130.lyp");
        tech.set_default_base_path("/pdks/sky130");
        tech.set_explicit_base_path("/override");
        tech.set_add_other_layers(false);

        let mut reader = LayoutOptions::new();
        reader.set("gds2", "box-mode", "1");
        reader.set("dxf", "dbu", "0.001");
        tech.set_load_layout_options(reader);

        let mut writer = LayoutOptions::new();
        writer.set("oasis", "compression-level", "2");
        tech.set_save_layout_options(writer);

        let mut nt = NetTracerTechnology::new();
        nt.connections.push(ConductorConnection::with_via("met1", "via", "met2"));
        nt.symbols.push("diff=1/0+2/0".parse().unwrap());
        tech.set_component(Box::new(nt));
        tech.set_component(Box::new(D25Technology::new("z(input(1, 0), height: 0.1)")));
        tech
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let mapper = TechnologyXml::default();
        let tech = sample();

        for style in [XmlStyle::Compact, XmlStyle::Pretty] {
            let xml = mapper.write_technology(&tech, style).unwrap();
            let parsed = mapper.parse_technology(&xml).unwrap();
            assert_eq!(parsed, tech);
        }
    }

    #[test]
    fn test_roundtrip_default_record() {
        let tech = Technology::new("plain");
        let parsed = Technology::from_xml(&tech.to_xml().unwrap()).unwrap();
        assert_eq!(parsed, tech);
        assert!(parsed.add_other_layers());
    }

    #[test]
    fn test_element_order() {
        let mut tech = Technology::new("A");
        tech.set_dbu(0.001);
        tech.set_description("Test");
        let xml = tech.to_xml().unwrap();
        assert!(xml.contains("<technology><name>A</name><dbu>0.001</dbu><description>Test</description>"));
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let result = Technology::from_xml("<technology><dbu>0.001</dbu></technology>");
        assert!(matches!(result, Err(TechnologyError::MalformedXml(_))));
    }

    #[test]
    fn test_type_mismatch_is_malformed() {
        for xml in [
            "<technology><name>x</name><dbu>fine</dbu></technology>",
            "<technology><name>x</name><dbu>-1</dbu></technology>",
            "<technology><name>x</name><add-other-layers>maybe</add-other-layers></technology>",
            "<technology><name>x</name><default-grids>0.1,zz</default-grids></technology>",
        ] {
            assert!(
                matches!(Technology::from_xml(xml), Err(TechnologyError::MalformedXml(_))),
                "expected failure for {}",
                xml
            );
        }
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let result = Technology::from_xml("<technologies/>");
        assert!(matches!(result, Err(TechnologyError::MalformedXml(_))));
    }

    #[test]
    fn test_legacy_element_names() {
        let xml = r#"<technology>
  <name>legacy</name>
  <base-path>/explicit</base-path>
  <original-base-path>/original</original-base-path>
  <layer-properties_file>old.lyp</layer-properties_file>
  <connectivity><connection>a,b</connection></connectivity>
  <some-future-setting>42</some-future-setting>
</technology>"#;
        let tech = Technology::from_xml(xml).unwrap();
        assert_eq!(tech.explicit_base_path(), "/explicit");
        assert_eq!(tech.default_base_path(), "/original");
        assert_eq!(tech.layer_properties_file(), "old.lyp");
        assert_eq!(
            tech.component_as::<NetTracerTechnology>("connectivity").unwrap().connections,
            vec![ConductorConnection::new("a", "b")]
        );
    }

    #[test]
    fn test_unknown_component_survives_roundtrip() {
        let xml = "<technology><name>t</name><components>\
                   <lvs mode=\"deep\"><deck>rules.lylvs</deck></lvs>\
                   </components></technology>";
        let tech = Technology::from_xml(xml).unwrap();
        assert_eq!(tech.component_names(), vec!["lvs"]);

        let again = Technology::from_xml(&tech.to_xml().unwrap()).unwrap();
        assert_eq!(again, tech);
        assert!(again.to_xml().unwrap().contains("<lvs mode=\"deep\"><deck>rules.lylvs</deck></lvs>"));
    }

    #[test]
    fn test_duplicate_component_is_malformed() {
        let xml = "<technology><name>t</name><components>\
                   <d25><src>a</src></d25><d25><src>b</src></d25>\
                   </components></technology>";
        assert!(matches!(Technology::from_xml(xml), Err(TechnologyError::MalformedXml(_))));
    }

    #[test]
    fn test_parse_technologies_isolates_bad_blocks() {
        let xml = "<technologies>\
                   <technology><name>good</name></technology>\
                   <technology><dbu>0.001</dbu></technology>\
                   <other/>\
                   <technology><name>also-good</name></technology>\
                   </technologies>";
        let blocks = TechnologyXml::default().parse_technologies(xml).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].is_ok());
        assert!(blocks[1].is_err());
        assert_eq!(blocks[2].as_ref().unwrap().name(), "also-good");
    }

    #[test]
    fn test_invalid_option_name_fails_write() {
        let mut tech = Technology::new("t");
        let mut opts = LayoutOptions::new();
        opts.set("gds2", "not a tag", "1");
        tech.set_load_layout_options(opts);
        assert!(tech.to_xml().is_err());
    }

    #[test]
    fn test_non_positive_dbu_fails_write() {
        for dbu in [0.0, -0.001, f64::NAN, f64::INFINITY] {
            let mut tech = Technology::new("t");
            tech.set_dbu(dbu);
            let result = tech.to_xml();
            assert!(
                matches!(result, Err(TechnologyError::MalformedXml(_))),
                "dbu {} was written",
                dbu
            );
        }
    }
}
