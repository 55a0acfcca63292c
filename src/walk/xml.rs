//! Minimal XML element tree
//!
//! Metaschema needs random access to children and mixed-content text, so the
//! event stream is folded into a small owned tree. Namespace prefixes are
//! dropped; elements are matched by local name.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

use crate::error::{Result, TranslateError};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(e: &quick_xml::events::BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                let value = String::from_utf8_lossy(&attr.value).to_string();
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// All descendant text, whitespace-normalized
    pub fn text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => {
                    out.push_str(t);
                    out.push(' ');
                }
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Text of a named child, if present and non-empty
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text).filter(|t| !t.is_empty())
    }
}

/// Parse a document into its root element
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(Element::from_start(e)),
            Ok(Event::Empty(ref e)) => {
                let element = Element::from_start(e);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TranslateError::InvalidDocument("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(ref t)) => {
                let raw = String::from_utf8_lossy(t).to_string();
                let text = quick_xml::escape::unescape(&raw).map_err(quick_xml::Error::from)?;
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    top.children
                        .push(Node::Text(String::from_utf8_lossy(t).to_string()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("XML error at position {}", reader.error_position());
                return Err(e.into());
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TranslateError::InvalidDocument("unclosed element".to_string()));
    }
    root.ok_or_else(|| TranslateError::InvalidDocument("no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = parse(
            r#"<?xml version="1.0"?>
            <METASCHEMA xmlns="http://csrc.nist.gov/ns/oscal/metaschema/1.0">
              <short-name>demo</short-name>
              <define-flag name="id" as-type="token"/>
              <description>Uses <code>x</code> &amp; more</description>
            </METASCHEMA>"#,
        )
        .unwrap();
        assert_eq!(root.name, "METASCHEMA");
        assert_eq!(root.child_text("short-name").as_deref(), Some("demo"));
        assert_eq!(root.child("define-flag").unwrap().attr("as-type"), Some("token"));
        assert_eq!(root.child_text("description").as_deref(), Some("Uses x & more"));
        assert_eq!(root.elements().count(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("<a><b></a>").is_err());
    }
}
