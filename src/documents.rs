//! XML document handling
//!
//! This module is the small XML layer the mapping engine works against: an
//! owned element tree that can be parsed from text or a file, queried for
//! direct children by tag, extended with new children, and written back out
//! (optionally pretty-printed).
//!
//! Namespaces are not interpreted; prefixed names are kept verbatim.
//!
//! Text is kept exactly as written, whitespace included. An element's text is
//! the content before its first child; text following a child is dropped.
//! Whitespace-only text containing a line break directly before the first
//! child is treated as indentation. `<x/>` has no text while `<x></x>` has
//! empty text, and the writer keeps that distinction.

use crate::error::{Error, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Write;
use std::path::Path;

fn xml_error(err: quick_xml::Error) -> Error {
    Error::Xml(err.to_string())
}

/// Options for writing elements out as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indent nested elements on their own lines
    pub pretty: bool,
    /// Number of spaces per indentation level
    pub indent: usize,
    /// Emit an `<?xml ...?>` declaration first
    pub xml_declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: 2,
            xml_declaration: false,
        }
    }
}

impl WriteOptions {
    /// Create the default options (pretty printed, no declaration)
    pub fn new() -> Self {
        Self::default()
    }

    /// Options producing a single line of XML
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::default()
        }
    }

    /// Set pretty printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether an XML declaration is written
    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element tag name
    pub tag: String,
    /// Element attributes, in document order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new detached element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Get the tag of the element
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Get the text content
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Add a child element
    pub fn append(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Create a new child element with the given tag and return it
    pub fn sub_element(&mut self, tag: impl Into<String>) -> &mut Element {
        let index = self.children.len();
        self.children.push(Element::new(tag));
        &mut self.children[index]
    }

    /// Find the first direct child with the given tag
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.tag == tag)
    }

    /// Iterate over direct children with the given tag, in document order
    pub fn iter_find<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |e| e.tag == tag)
    }

    /// Render the element as XML text
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, options)?;
        String::from_utf8(buf).map_err(|e| Error::Xml(format!("Invalid UTF-8 output: {}", e)))
    }

    /// Write the element as a standalone document to a writer
    pub fn write_to<W: Write>(&self, inner: W, options: &WriteOptions) -> Result<()> {
        let mut writer = if options.pretty {
            Writer::new_with_indent(inner, b' ', options.indent)
        } else {
            Writer::new(inner)
        };

        if options.xml_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_error)?;
        }

        write_element(&mut writer, self)?;

        if options.pretty {
            writer.get_mut().write_all(b"\n")?;
        }

        Ok(())
    }

    /// Write the element as a standalone document to a file
    pub fn write_file(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|e| {
            Error::Resource(format!("Failed to create file '{}': {}", path.display(), e))
        })?;
        let mut out = std::io::BufWriter::new(file);
        self.write_to(&mut out, options)?;
        out.flush()?;
        Ok(())
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    match element.text.as_deref() {
        // An empty section keeps "" distinct from no text once children follow.
        Some("") if !element.children.is_empty() => {
            writer
                .write_event(Event::CData(BytesCData::new("")))
                .map_err(xml_error)?;
        }
        // Written even when empty, so the end tag stays on the same line.
        Some(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_error)?;
        }
        None => {}
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(xml_error)?;

    Ok(())
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_limits(path, &Limits::default())
    }

    /// Parse an XML document from a file with explicit limits
    pub fn from_file_with_limits(path: impl AsRef<Path>, limits: &Limits) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Self::parse_with_limits(&content, limits)
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes, enforcing `limits`
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(mut current) = element_stack.pop() {
                        if current.text.is_none() && current.children.is_empty() {
                            current.text = Some(String::new());
                        }
                        if let Some(parent) = element_stack.last_mut() {
                            push_child(parent, current);
                        } else {
                            doc.set_root(current)?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        push_child(parent, element);
                    } else {
                        doc.set_root(element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        push_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = std::str::from_utf8(&e)
                            .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                        push_text(current, text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!("Unclosed element '{}'", open.tag)));
        }

        Ok(doc)
    }

    fn set_root(&mut self, element: Element) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::Xml(format!(
                "Multiple root elements: unexpected '{}'",
                element.tag
            )));
        }
        self.root = Some(element);
        Ok(())
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            element.attributes.insert(attr_name, attr_value);
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take the root element, failing if the document is empty
    pub fn into_root(self) -> Result<Element> {
        self.root
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))
    }
}

/// Whitespace the pretty printer puts between a start tag and a child
fn is_indentation(text: &str) -> bool {
    text.contains('\n') && text.chars().all(char::is_whitespace)
}

fn push_child(parent: &mut Element, child: Element) {
    if parent.children.is_empty() && parent.text.as_deref().is_some_and(is_indentation) {
        parent.text = None;
    }
    parent.append(child);
}

/// Text only counts before the first child; text after a child is dropped.
fn push_text(element: &mut Element, text: &str) {
    if !element.children.is_empty() {
        return;
    }
    match element.text {
        Some(ref mut existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}
