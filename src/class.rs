//! Mappable classes and their objects
//!
//! A [`Class`] is a descriptor: the XML tag of its elements, its compiled
//! [`Schema`] and its own [`Hooks`]. Objects of the class are [`Object`]s,
//! which keep one [`Value`] per schema attribute (plus anything set on them
//! directly).
//!
//! Classes are created first and given content afterwards, so a class can
//! appear in its own content (or two classes in each other's) to describe
//! recursive documents.

use crate::documents::{Document, Element, WriteOptions};
use crate::error::{Result, SchemaError, SchemaErrorKind};
use crate::hooks::{Hook, HookEvent, HookTarget, Hooks};
use crate::names::validate_name;
use crate::registry::SourceRegistry;
use crate::schema::{Content, Schema};
use crate::values::Value;
use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

static EMPTY_SCHEMA: Lazy<Schema> = Lazy::new(Schema::new);

/// What [`Class::construct`] does with overrides the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Skip them silently
    #[default]
    Ignore,
    /// Fail with [`SchemaErrorKind::UnknownAttribute`]
    Reject,
}

/// Where [`Class::from_xml`] reads from
#[derive(Debug, Clone)]
pub enum XmlSource<'a> {
    /// An already parsed element
    Element(&'a Element),
    /// A file whose root element is loaded
    Path(PathBuf),
}

impl<'a> From<&'a Element> for XmlSource<'a> {
    fn from(element: &'a Element) -> Self {
        XmlSource::Element(element)
    }
}

impl<'a> From<&'a Path> for XmlSource<'a> {
    fn from(path: &'a Path) -> Self {
        XmlSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for XmlSource<'_> {
    fn from(path: PathBuf) -> Self {
        XmlSource::Path(path)
    }
}

/// Where [`Object::to_xml`] puts the produced element
#[derive(Debug, Default)]
pub enum XmlDestination<'a> {
    /// Nowhere; only return it
    #[default]
    Detached,
    /// Append it as the last child of this element
    Element(&'a mut Element),
    /// Write it as a standalone document to this file
    Path(PathBuf),
}

impl<'a> From<&'a mut Element> for XmlDestination<'a> {
    fn from(element: &'a mut Element) -> Self {
        XmlDestination::Element(element)
    }
}

impl<'a> From<&'a Path> for XmlDestination<'a> {
    fn from(path: &'a Path) -> Self {
        XmlDestination::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for XmlDestination<'_> {
    fn from(path: PathBuf) -> Self {
        XmlDestination::Path(path)
    }
}

/// Descriptor of a mappable class
pub struct Class {
    tag: String,
    content: OnceCell<Schema>,
    hooks: Hooks,
    override_policy: OverridePolicy,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries are not printed: content may refer back to this class.
        f.debug_struct("Class")
            .field("tag", &self.tag)
            .field("attributes", &self.schema().names().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .field("override_policy", &self.override_policy)
            .finish()
    }
}

impl Class {
    /// Create a class whose elements are tagged `tag`
    pub fn new(tag: impl Into<String>) -> Result<Arc<Self>> {
        Self::with_policy(tag, OverridePolicy::default())
    }

    /// Create a class with an explicit override policy
    pub fn with_policy(tag: impl Into<String>, override_policy: OverridePolicy) -> Result<Arc<Self>> {
        let tag = tag.into();
        validate_name(&tag)?;
        Ok(Arc::new(Self {
            tag,
            content: OnceCell::new(),
            hooks: Hooks::new(),
            override_policy,
        }))
    }

    /// XML tag of the class's elements
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The override policy
    pub fn override_policy(&self) -> OverridePolicy {
        self.override_policy
    }

    /// Give the class its compiled schema; a class gets content only once
    pub fn set_content(&self, schema: Schema) -> Result<()> {
        self.content.set(schema).map_err(|_| {
            SchemaError::new(
                SchemaErrorKind::AlreadyDefined,
                format!("Class \"{}\" already has content", self.tag),
            )
            .with_element(self.tag.as_str())
        })?;
        debug!(class = %self.tag, "class defined");
        Ok(())
    }

    /// Compile `content` against the global registry and set it
    pub fn define(&self, content: &Content) -> Result<()> {
        self.define_with(SourceRegistry::global(), content)
    }

    /// Compile `content` against `registry` and set it
    pub fn define_with(&self, registry: &SourceRegistry, content: &Content) -> Result<()> {
        let schema = Schema::compile_with(registry, content).map_err(|err| match err {
            crate::Error::Schema(e) if e.element.is_none() => {
                crate::Error::Schema(e.with_element(self.tag.as_str()))
            }
            other => other,
        })?;
        self.set_content(schema)
    }

    /// Whether content has been set
    pub fn is_defined(&self) -> bool {
        self.content.get().is_some()
    }

    /// The compiled schema (empty until content is set)
    pub fn schema(&self) -> &Schema {
        self.content.get().unwrap_or(&EMPTY_SCHEMA)
    }

    /// Attach `hook` to `event` of this class only.
    ///
    /// Adding a hook that is already attached does nothing.
    pub fn add_hook(&self, event: HookEvent, hook: Hook) -> bool {
        self.hooks.add(event, hook)
    }

    /// Detach `hook` from `event`; detaching an unknown hook does nothing
    pub fn remove_hook(&self, event: HookEvent, hook: &Hook) -> bool {
        self.hooks.remove(event, hook)
    }

    /// This class's hooks
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Create an object: defaults first, in schema order, then `overrides`.
    ///
    /// Override values are stored as given; options are not checked.
    pub fn construct<I, K, V>(self: &Arc<Self>, overrides: I) -> Result<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut obj = self.construct_default()?;
        let schema = self.schema();

        for (name, value) in overrides {
            let name = name.into();
            if schema.contains(&name) {
                obj.set(name, value);
                continue;
            }
            match self.override_policy {
                OverridePolicy::Ignore => {
                    trace!(class = %self.tag, attribute = %name, "ignoring unknown override");
                }
                OverridePolicy::Reject => {
                    return Err(SchemaError::new(
                        SchemaErrorKind::UnknownAttribute,
                        format!("Class \"{}\" has no attribute \"{}\"", self.tag, name),
                    )
                    .with_attribute(name)
                    .with_element(self.tag.as_str())
                    .into());
                }
            }
        }

        Ok(obj)
    }

    /// Create an object holding only the schema defaults
    pub fn construct_default(self: &Arc<Self>) -> Result<Object> {
        let mut obj = Object::bare(Arc::clone(self));
        for entry in self.schema().entries() {
            entry.source().create_default(entry.name(), &mut obj)?;
        }
        Ok(obj)
    }

    /// Load a new object from an element or from the root of an XML file
    pub fn from_xml<'a>(self: &Arc<Self>, source: impl Into<XmlSource<'a>>) -> Result<Object> {
        match source.into() {
            XmlSource::Element(element) => self.load_element(element),
            XmlSource::Path(path) => {
                debug!(class = %self.tag, path = %path.display(), "loading from file");
                let root = Document::from_file(&path)?.into_root()?;
                self.load_element(&root)
            }
        }
    }

    /// Load a new object from the root element of an XML string
    pub fn from_xml_str(self: &Arc<Self>, xml: &str) -> Result<Object> {
        let root = Document::from_string(xml)?.into_root()?;
        self.load_element(&root)
    }

    pub(crate) fn load_element(self: &Arc<Self>, element: &Element) -> Result<Object> {
        trace!(class = %self.tag, element = %element.tag, "loading object");
        let mut obj = self.construct_default()?;

        for entry in self.schema().entries() {
            entry.source().read(entry.name(), &mut obj, element)?;
        }

        self.hooks
            .fire(HookEvent::FromXml, self, HookTarget::Object(&obj));
        Ok(obj)
    }
}

/// An object of a mappable class
#[derive(Clone)]
pub struct Object {
    class: Arc<Class>,
    values: IndexMap<String, Value>,
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.class, &other.class) && self.values == other.values
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("tag", &self.class.tag)
            .field("values", &self.values)
            .finish()
    }
}

impl Object {
    fn bare(class: Arc<Class>) -> Self {
        Self {
            class,
            values: IndexMap::new(),
        }
    }

    /// The object's class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Tag of the object's class
    pub fn tag(&self) -> &str {
        self.class.tag()
    }

    /// Get the value of `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get the value of `name` mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    /// Set `name`, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove `name`, returning its value
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// Whether `name` has a value
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All values, in the order they were first set
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get `name` as text
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Get `name` as an integer
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Get `name` as a float
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    /// Get `name` as a boolean
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Get `name` as a nested object
    pub fn get_object(&self, name: &str) -> Option<&Object> {
        self.get(name).and_then(Value::as_object)
    }

    /// Get `name` as an object list
    pub fn get_list(&self, name: &str) -> Option<&[Object]> {
        self.get(name).and_then(Value::as_list)
    }

    /// Convert to an element and deliver it to `destination`.
    ///
    /// The element is tagged with the class tag and filled by every schema
    /// entry in order. Depending on `destination` it is returned as-is,
    /// appended under a parent element, or written to a file using
    /// `options`. The produced element is returned in every case.
    ///
    /// When appended under a parent, the returned element is a copy: changing
    /// it does not change the child held by the parent. Only that case clones.
    pub fn to_xml<'a>(
        &self,
        destination: impl Into<XmlDestination<'a>>,
        options: &WriteOptions,
    ) -> Result<Element> {
        let element = self.build_element()?;

        match destination.into() {
            XmlDestination::Detached => {}
            XmlDestination::Element(parent) => parent.append(element.clone()),
            XmlDestination::Path(path) => {
                debug!(class = %self.class.tag, path = %path.display(), "writing to file");
                element.write_file(&path, options)?;
            }
        }

        self.class
            .hooks
            .fire(HookEvent::ToXml, &self.class, HookTarget::Element(&element));
        Ok(element)
    }

    /// Convert to a detached element
    pub fn to_element(&self) -> Result<Element> {
        self.to_xml(XmlDestination::Detached, &WriteOptions::default())
    }

    /// Render as XML text
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        self.to_element()?.to_xml_string(options)
    }

    fn build_element(&self) -> Result<Element> {
        trace!(class = %self.class.tag, "saving object");
        let mut element = Element::new(self.class.tag.as_str());
        for entry in self.class.schema().entries() {
            entry.source().write(entry.name(), self, &mut element)?;
        }
        Ok(element)
    }

    /// Convert to JSON for inspection
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        for (name, value) in &self.values {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}
