//! Read-only XML element tree with namespace-resolved names.
//!
//! Element tags and attribute names are stored in Clark notation (`{uri}local`), the same
//! form [`crate::namespace::qualify`] produces, so lookups are plain string comparisons.
//! Unprefixed attributes keep their bare local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::path::Path;

use crate::error::{GmlError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value by (qualified) name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Character data directly inside this element, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        self.children.iter().filter(|c| c.tag == tag).collect()
    }

    pub fn parse_file(path: &Path) -> Result<Element> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parses a document and returns its root element.
    pub fn parse_str(xml: &str) -> Result<Element> {
        let mut reader = NsReader::from_str(xml);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => {
                    let element = open_element(&reader, &start)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open_element(&reader, &start)?;
                    close_element(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| GmlError::Xml("unexpected closing tag".to_string()))?;
                    close_element(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(xml_error)?;
                    append_text(&mut stack, &text);
                }
                Event::CData(cdata) => {
                    let raw = cdata.into_inner();
                    append_text(&mut stack, &String::from_utf8_lossy(&raw));
                }
                // Markup inside character data still separates tokens.
                Event::Comment(_) | Event::PI(_) => append_text(&mut stack, " "),
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(GmlError::Xml(format!(
                "unexpected end of document inside <{}>",
                stack[stack.len() - 1].tag
            )));
        }
        root.ok_or_else(|| GmlError::Xml("document has no root element".to_string()))
    }
}

fn xml_error(err: impl std::fmt::Display) -> GmlError {
    GmlError::Xml(err.to_string())
}

fn open_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<Element> {
    let (ns, local) = reader.resolve_element(start.name());
    let tag = clark_name(ns, local.as_ref(), start.name().as_ref())?;
    let mut element = Element::new(tag);

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let name = clark_name(ns, local.as_ref(), key)?;
        let value = attr.unescape_value().map_err(xml_error)?;
        element.attributes.push((name, value.into_owned()));
    }
    Ok(element)
}

fn clark_name(ns: ResolveResult, local: &[u8], raw: &[u8]) -> Result<String> {
    let local = String::from_utf8_lossy(local);
    match ns {
        ResolveResult::Bound(uri) => Ok(format!(
            "{{{}}}{}",
            String::from_utf8_lossy(uri.as_ref()),
            local
        )),
        ResolveResult::Unbound => Ok(local.into_owned()),
        ResolveResult::Unknown(prefix) => Err(GmlError::Xml(format!(
            "unbound namespace prefix '{}' in <{}>",
            String::from_utf8_lossy(&prefix),
            String::from_utf8_lossy(raw)
        ))),
    }
}

fn append_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

fn close_element(
    stack: &mut [Element],
    root: &mut Option<Element>,
    mut element: Element,
) -> Result<()> {
    if let Some(text) = element.text.take() {
        let text = text.trim();
        if !text.is_empty() {
            element.text = Some(text.to_string());
        }
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(GmlError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}
