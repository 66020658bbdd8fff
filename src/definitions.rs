//! Class definitions loaded from JSON
//!
//! A definitions document declares a set of classes and their content
//! without writing Rust:
//!
//! ```json
//! {
//!   "root": "item",
//!   "classes": {
//!     "tag":  { "content": { "name": { "src": "attr" } } },
//!     "item": {
//!       "tag": "item",
//!       "content": {
//!         "name":        { "src": "attr", "type": "str" },
//!         "count":       { "src": "attr", "type": "int", "default": 0 },
//!         "description": { "src": "child.text", "tag": "description" },
//!         "tags":        { "src": "children", "cls": "tag" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! `type` names a built-in converter (or, for child sources, a class), `str`
//! a built-in serializer and `cls` a class of the same document. `default`
//! and `options` are taken as JSON scalars, without conversion. Keys not
//! listed above are handed to custom sources as [`EntryConfig::extra`].

use crate::class::{Class, OverridePolicy};
use crate::error::{Error, Result, SchemaError, SchemaErrorKind};
use crate::registry::SourceRegistry;
use crate::schema::{Content, DefaultValue, EntryConfig};
use crate::values::{converter, serializer, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn default_src() -> String {
    crate::sources::ATTR.to_string()
}

/// One attribute declaration as written in JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryDefinition {
    /// Source name
    #[serde(default = "default_src")]
    pub src: String,
    /// Converter name, or class name for child sources
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Serializer name
    #[serde(rename = "str", default, skip_serializing_if = "Option::is_none")]
    pub serializer: Option<String>,
    /// Default value (any JSON scalar; for `child`, requests a constructed default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Permissible values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<JsonValue>>,
    /// Child class name
    #[serde(alias = "class", default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<String>,
    /// Whether a single child may be absent
    #[serde(default)]
    pub optional: bool,
    /// Tag override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Settings for custom sources
    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

/// One class as written in JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// XML tag; defaults to the class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Reject unknown overrides when constructing objects
    #[serde(default)]
    pub strict: bool,
    /// Attribute declarations, in order
    #[serde(default)]
    pub content: IndexMap<String, EntryDefinition>,
}

/// A definitions document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionsFile {
    /// Name of the class documents are loaded as by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Classes by name
    pub classes: IndexMap<String, ClassDefinition>,
}

/// Classes built from a definitions document
#[derive(Debug, Clone)]
pub struct Definitions {
    classes: IndexMap<String, Arc<Class>>,
    root: Option<String>,
}

impl Definitions {
    /// Build classes from JSON text using the global registry
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_json_with(SourceRegistry::global(), text)
    }

    /// Build classes from JSON text using `registry`
    pub fn from_json_with(registry: &SourceRegistry, text: &str) -> Result<Self> {
        let file: DefinitionsFile = serde_json::from_str(text)?;
        Self::build(registry, &file)
    }

    /// Build classes from a JSON file using the global registry
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(SourceRegistry::global(), path)
    }

    /// Build classes from a JSON file using `registry`
    pub fn from_file_with(registry: &SourceRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Self::from_json_with(registry, &text)
    }

    /// Build classes from a parsed document.
    ///
    /// All classes are created before any content is compiled, so `cls`
    /// may name any class of the document, including the one being defined.
    pub fn build(registry: &SourceRegistry, file: &DefinitionsFile) -> Result<Self> {
        let mut classes = IndexMap::with_capacity(file.classes.len());
        for (name, def) in &file.classes {
            let tag = def.tag.clone().unwrap_or_else(|| name.clone());
            let policy = if def.strict {
                OverridePolicy::Reject
            } else {
                OverridePolicy::Ignore
            };
            classes.insert(name.clone(), Class::with_policy(tag, policy)?);
        }

        for (name, def) in &file.classes {
            let mut content = Content::new();
            for (attr, entry) in &def.content {
                let config = entry_config(&classes, entry).map_err(|err| match err {
                    Error::Schema(e) => Error::Schema(e.with_attribute(attr).with_element(name)),
                    other => other,
                })?;
                content.insert(attr, config);
            }
            classes[name].define_with(registry, &content)?;
        }

        if let Some(ref root) = file.root {
            if !classes.contains_key(root) {
                return Err(unknown_class(root).into());
            }
        }

        debug!(classes = classes.len(), "built definitions");
        Ok(Self {
            classes,
            root: file.root.clone(),
        })
    }

    /// Get a class by name
    pub fn class(&self, name: &str) -> Option<&Arc<Class>> {
        self.classes.get(name)
    }

    /// Get a class by name, failing with `UnknownClass`
    pub fn require(&self, name: &str) -> Result<&Arc<Class>> {
        self.class(name).ok_or_else(|| unknown_class(name).into())
    }

    /// The declared root class
    pub fn root(&self) -> Option<&Arc<Class>> {
        self.root.as_deref().and_then(|name| self.class(name))
    }

    /// Class names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|k| k.as_str())
    }
}

fn unknown_class(name: &str) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::UnknownClass,
        format!("No class named \"{}\" is defined", name),
    )
    .with_value(name)
}

fn unknown_type(what: &str, name: &str) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::UnknownType,
        format!("No {} named \"{}\" is available", what, name),
    )
    .with_value(name)
}

fn scalar(json: &JsonValue, what: &str) -> Result<Value> {
    Value::from_json(json).ok_or_else(|| {
        SchemaError::new(
            SchemaErrorKind::InvalidConfig,
            format!("{} must be a string, number or boolean, got {}", what, json),
        )
        .into()
    })
}

fn entry_config(classes: &IndexMap<String, Arc<Class>>, entry: &EntryDefinition) -> Result<EntryConfig> {
    let mut config = EntryConfig::new(entry.src.as_str()).with_optional(entry.optional);

    if let Some(ref name) = entry.cls {
        let class = classes.get(name).ok_or_else(|| unknown_class(name))?;
        config = config.with_class(Arc::clone(class));
    }

    if let Some(ref name) = entry.value_type {
        match (converter(name), classes.get(name)) {
            (Some(conv), _) => config = config.with_converter(conv),
            (None, Some(class)) if config.class.is_none() => {
                config = config.with_class(Arc::clone(class));
            }
            _ => return Err(unknown_type("converter", name).into()),
        }
    }

    if let Some(ref name) = entry.serializer {
        let ser = serializer(name).ok_or_else(|| unknown_type("serializer", name))?;
        config = config.with_serializer(ser);
    }

    if let Some(ref json) = entry.default {
        config.default = Some(if config.class.is_some() {
            DefaultValue::Construct
        } else {
            DefaultValue::Value(scalar(json, "default")?)
        });
    }

    if let Some(ref options) = entry.options {
        let options = options
            .iter()
            .map(|o| scalar(o, "option"))
            .collect::<Result<Vec<_>>>()?;
        config.options = Some(options);
    }

    if let Some(ref tag) = entry.tag {
        config = config.with_tag(tag.as_str());
    }

    for (key, value) in &entry.extra {
        let text = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        config = config.with_extra(key.as_str(), text);
    }

    Ok(config)
}
