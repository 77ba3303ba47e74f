// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Minimal XML element tree on top of `quick-xml`.
//!
//! Technology documents are small, element-only documents: leaf elements carry
//! text, inner elements carry children. Attributes are kept so opaque blocks
//! survive a round-trip, but the technology schema itself does not use them.
//!
//! Text is kept verbatim for leaf elements. Whitespace-only text between child
//! elements (indentation) is dropped.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::domain::technology::TechnologyError;

/// Output layout of the XML writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlStyle {
    /// No whitespace between elements
    Compact,
    /// Two-space indentation, one element per line
    Pretty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element with text content
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<XmlElement, TechnologyError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                TechnologyError::MalformedXml(format!(
                    "XML syntax error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(TechnologyError::MalformedXml(
                            "Content after the document root element".to_string(),
                        ));
                    }
                    stack.push(Self::open(&start)?);
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err(TechnologyError::MalformedXml(
                            "Content after the document root element".to_string(),
                        ));
                    }
                    let element = Self::open(&start)?;
                    Self::close(element, &mut stack, &mut root);
                }
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        TechnologyError::MalformedXml("Unbalanced closing tag".to_string())
                    })?;
                    let end_name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    if end_name != element.name {
                        return Err(TechnologyError::MalformedXml(format!(
                            "Closing tag </{}> does not match <{}>",
                            end_name, element.name
                        )));
                    }
                    Self::close(element, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| {
                        TechnologyError::MalformedXml(format!("Invalid text content: {}", e))
                    })?;
                    match stack.last_mut() {
                        Some(current) => current.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(TechnologyError::MalformedXml(
                                "Text outside of the document root element".to_string(),
                            ))
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(TechnologyError::MalformedXml(format!(
                "Unexpected end of document inside <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| TechnologyError::MalformedXml("Document has no root element".to_string()))
    }

    fn open(start: &BytesStart<'_>) -> Result<XmlElement, TechnologyError> {
        let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr
                .map_err(|e| TechnologyError::MalformedXml(format!("Invalid attribute: {}", e)))?;
            let value = attr
                .unescape_value()
                .map_err(|e| TechnologyError::MalformedXml(format!("Invalid attribute value: {}", e)))?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(element)
    }

    fn close(mut element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
        if !element.children.is_empty() && element.text.trim().is_empty() {
            element.text.clear();
        }
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => *root = Some(element),
        }
    }

    /// Serialize as a standalone document with an XML declaration
    pub fn to_document(&self, style: XmlStyle) -> Result<String, TechnologyError> {
        let mut writer = match style {
            XmlStyle::Compact => Writer::new(Vec::new()),
            XmlStyle::Pretty => Writer::new_with_indent(Vec::new(), b' ', 2),
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_error)?;
        self.write_to(&mut writer)?;

        let mut bytes = writer.into_inner();
        if style == XmlStyle::Pretty {
            bytes.push(b'\n');
        }
        String::from_utf8(bytes)
            .map_err(|e| TechnologyError::MalformedXml(format!("Serialized XML is not UTF-8: {}", e)))
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), TechnologyError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }
}

fn write_error(err: quick_xml::Error) -> TechnologyError {
    TechnologyError::MalformedXml(format!("Failed to write XML: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let xml = r#"<?xml version="1.0"?>
<root>
  <a>1</a>
  <b kind="x"><c>two &amp; three</c></b>
  <empty/>
</root>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.text, "");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.child("a").unwrap().text, "1");

        let b = root.child("b").unwrap();
        assert_eq!(b.attributes, vec![("kind".to_string(), "x".to_string())]);
        assert_eq!(b.child("c").unwrap().text, "two & three");
        assert!(root.child("empty").unwrap().children.is_empty());
    }

    #[test]
    fn test_leaf_text_is_verbatim() {
        let root = XmlElement::parse("<r><d>  spaced  </d></r>").unwrap();
        assert_eq!(root.child("d").unwrap().text, "  spaced  ");
    }

    #[test]
    fn test_parse_rejects_broken_documents() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a/><b/>").is_err());
        assert!(XmlElement::parse("text only").is_err());
    }

    #[test]
    fn test_write_and_reparse() {
        let mut root = XmlElement::new("root");
        root.push(XmlElement::with_text("name", "<A & B>"));
        let mut inner = XmlElement::new("inner");
        inner.push(XmlElement::new("flag"));
        root.push(inner);

        for style in [XmlStyle::Compact, XmlStyle::Pretty] {
            let doc = root.to_document(style).unwrap();
            assert!(doc.contains("&lt;A &amp; B&gt;"));
            assert_eq!(XmlElement::parse(&doc).unwrap(), root);
        }
    }

    #[test]
    fn test_compact_has_no_whitespace_between_elements() {
        let mut root = XmlElement::new("t");
        root.push(XmlElement::with_text("name", "A"));
        root.push(XmlElement::with_text("dbu", "0.001"));
        let doc = root.to_document(XmlStyle::Compact).unwrap();
        assert!(doc.ends_with("<t><name>A</name><dbu>0.001</dbu></t>"));
    }
}
