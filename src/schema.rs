//! Schema declaration and compilation
//!
//! A class's mapping is declared as [`Content`]: an ordered list of attribute
//! names, each with an [`EntryConfig`] naming its source (`src`) and the
//! settings that source understands. [`Schema::compile`] resolves every
//! `src` through a [`SourceRegistry`] and lets the source validate its
//! settings, so a bad declaration fails here rather than on first load.
//!
//! ```rust,ignore
//! let tag = Class::new("tag")?;
//! tag.define(&Content::new().with("name", EntryConfig::attr()))?;
//!
//! let item = Class::new("item")?;
//! item.define(
//!     &Content::new()
//!         .with("name", EntryConfig::attr())
//!         .with("description", EntryConfig::child_text())
//!         .with("tags", EntryConfig::children(tag)),
//! )?;
//! ```

use crate::class::Class;
use crate::error::{Result, SchemaError, SchemaErrorKind};
use crate::registry::SourceRegistry;
use crate::sources::{self, Source};
use crate::values::{Converter, Serializer, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A ready value, used as-is (never converted or checked against options)
    Value(Value),
    /// Construct a fresh default object of the child class
    Construct,
}

/// Declaration of one attribute: its source and the source's settings
#[derive(Clone)]
pub struct EntryConfig {
    /// Name of the source in the registry
    pub src: String,
    /// Raw string to value conversion (scalar sources, default `str`)
    pub converter: Option<Converter>,
    /// Value to string rendering (scalar sources, default `Display`)
    pub serializer: Option<Serializer>,
    /// Value used when the XML has none
    pub default: Option<DefaultValue>,
    /// Permissible values of a converted scalar
    pub options: Option<Vec<Value>>,
    /// Class of nested objects (child sources)
    pub class: Option<Arc<Class>>,
    /// Whether a single child may be absent
    pub optional: bool,
    /// Tag override for child-text and child sources
    pub tag: Option<String>,
    /// Free-form settings for custom sources
    pub extra: IndexMap<String, String>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self::new(sources::ATTR)
    }
}

impl fmt::Debug for EntryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryConfig")
            .field("src", &self.src)
            .field("converter", &self.converter.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("default", &self.default)
            .field("options", &self.options)
            .field("class", &self.class.as_ref().map(|c| c.tag().to_string()))
            .field("optional", &self.optional)
            .field("tag", &self.tag)
            .field("extra", &self.extra)
            .finish()
    }
}

impl EntryConfig {
    /// Create a configuration for the source named `src`
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            converter: None,
            serializer: None,
            default: None,
            options: None,
            class: None,
            optional: false,
            tag: None,
            extra: IndexMap::new(),
        }
    }

    /// XML attribute source
    pub fn attr() -> Self {
        Self::new(sources::ATTR)
    }

    /// Element text source
    pub fn text() -> Self {
        Self::new(sources::TEXT)
    }

    /// Child element text source
    pub fn child_text() -> Self {
        Self::new(sources::CHILD_TEXT)
    }

    /// Single nested object source
    pub fn child(class: Arc<Class>) -> Self {
        Self::new(sources::CHILD).with_class(class)
    }

    /// Repeated nested objects source
    pub fn children(class: Arc<Class>) -> Self {
        Self::new(sources::CHILDREN).with_class(class)
    }

    /// Set the converter
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the serializer
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Set a literal default
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Default to a freshly constructed child object
    pub fn with_default_child(mut self) -> Self {
        self.default = Some(DefaultValue::Construct);
        self
    }

    /// Restrict converted values to `options`
    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Set the child class
    pub fn with_class(mut self, class: Arc<Class>) -> Self {
        self.class = Some(class);
        self
    }

    /// Mark a single child as optional
    pub fn optional(self) -> Self {
        self.with_optional(true)
    }

    /// Set whether a single child is optional
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the tag override
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a free-form setting for a custom source
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Ordered attribute declarations of a class
#[derive(Debug, Clone, Default)]
pub struct Content {
    entries: IndexMap<String, EntryConfig>,
}

impl Content {
    /// Create empty content
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an attribute declaration
    pub fn with(mut self, name: impl Into<String>, config: EntryConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Add (or replace) an attribute declaration in place
    pub fn insert(&mut self, name: impl Into<String>, config: EntryConfig) -> Option<EntryConfig> {
        self.entries.insert(name.into(), config)
    }

    /// Get the declaration of `name`
    pub fn get(&self, name: &str) -> Option<&EntryConfig> {
        self.entries.get(name)
    }

    /// Iterate over declarations in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntryConfig)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no declarations
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, EntryConfig)> for Content {
    fn from_iter<T: IntoIterator<Item = (K, EntryConfig)>>(iter: T) -> Self {
        let mut content = Content::new();
        for (name, config) in iter {
            content.insert(name, config);
        }
        content
    }
}

/// One compiled attribute: its name and the source that maps it
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    name: String,
    src: String,
    source: Arc<dyn Source>,
}

impl SchemaEntry {
    /// Create an entry from an already built source
    pub fn new(name: impl Into<String>, src: impl Into<String>, source: Arc<dyn Source>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            source,
        }
    }

    /// Attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry name the source was resolved from
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The source strategy
    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }
}

/// Compiled, immutable mapping of a class
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `content` against the global registry
    pub fn compile(content: &Content) -> Result<Self> {
        Self::compile_with(SourceRegistry::global(), content)
    }

    /// Compile `content` against `registry`.
    ///
    /// `content` is only read, so the same declarations can be compiled any
    /// number of times.
    pub fn compile_with(registry: &SourceRegistry, content: &Content) -> Result<Self> {
        let mut entries = Vec::with_capacity(content.len());

        for (name, config) in content.iter() {
            let source = registry
                .resolve(&config.src)
                .and_then(|constructor| constructor(config))
                .and_then(|source| source.check_name(name).map(|()| source))
                .map_err(|err| match err {
                    crate::Error::Schema(e) if e.attribute.is_none() => {
                        crate::Error::Schema(e.with_attribute(name))
                    }
                    other => other,
                })?;
            entries.push(SchemaEntry::new(name, config.src.as_str(), source));
        }

        debug!(entries = entries.len(), "compiled schema");
        Ok(Self { entries })
    }

    /// Build a derived schema: `derived` entries replace same-named entries
    /// of `self` in place, new ones are appended
    pub fn extend(&self, derived: &Schema) -> Schema {
        let mut entries = self.entries.clone();
        for entry in &derived.entries {
            match entries.iter_mut().find(|e| e.name == entry.name) {
                Some(existing) => *existing = entry.clone(),
                None => entries.push(entry.clone()),
            }
        }
        Schema { entries }
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Get the entry for `name`
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Check if `name` is declared
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Attribute names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the schema has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn unknown_source(src: &str) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::UnknownSource,
        format!("No source named \"{}\" is registered", src),
    )
    .with_value(src)
}
