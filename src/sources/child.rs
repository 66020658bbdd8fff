//! Nested object sources: a single child and repeated children
//!
//! Both match direct children by the nested class's tag (or an explicit tag
//! override) and recurse into that class to load or save them. A class may
//! name itself as its child class to describe recursive structures.

use super::{Source, CHILD, CHILDREN};
use crate::class::{Class, Object};
use crate::documents::Element;
use crate::error::{Error, Result, SchemaError, SchemaErrorKind};
use crate::names::validate_name;
use crate::schema::EntryConfig;
use crate::values::Value;
use std::sync::Arc;

fn invalid_config(src: &str, message: &str) -> Error {
    SchemaError::new(
        SchemaErrorKind::InvalidConfig,
        format!("source \"{}\": {}", src, message),
    )
    .into()
}

/// Validate the settings shared by both child sources and return the class
fn child_class(src: &str, config: &EntryConfig) -> Result<Arc<Class>> {
    if config.converter.is_some() || config.serializer.is_some() {
        return Err(invalid_config(
            src,
            "child objects are converted by their class, not by a converter",
        ));
    }
    if config.options.is_some() {
        return Err(invalid_config(src, "options only apply to scalar sources"));
    }
    if let Some(ref tag) = config.tag {
        validate_name(tag)?;
    }
    config
        .class
        .clone()
        .ok_or_else(|| invalid_config(src, "a child class is required"))
}

/// Build a child element, renaming it when a tag override is configured
fn child_element(child: &Object, tag: Option<&str>) -> Result<Element> {
    let mut element = child.to_element()?;
    if let Some(tag) = tag {
        element.tag = tag.to_string();
    }
    Ok(element)
}

fn wrong_value(name: &str, obj: &Object, expected: &str, found: &Value) -> Error {
    SchemaError::new(
        SchemaErrorKind::InvalidValue,
        format!(
            "Attribute \"{}\" of class \"{}\" should hold {}, found {}",
            name,
            obj.tag(),
            expected,
            found.type_name()
        ),
    )
    .with_attribute(name)
    .with_element(obj.tag())
    .into()
}

/// Maps an attribute onto one nested object.
///
/// When the child element is missing and the source is optional, the
/// attribute keeps whatever value construction gave it (nothing, unless a
/// constructed default was requested).
#[derive(Debug, Clone)]
pub struct ChildSource {
    class: Arc<Class>,
    tag: Option<String>,
    optional: bool,
    construct_default: bool,
}

impl ChildSource {
    /// Build from an entry configuration
    pub fn from_config(config: &EntryConfig) -> Result<Self> {
        Ok(Self {
            class: child_class(CHILD, config)?,
            tag: config.tag.clone(),
            optional: config.optional,
            // any configured default asks for a default-constructed child
            construct_default: config.default.is_some(),
        })
    }

    /// The nested class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Whether the child may be absent
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Tag matched in XML
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or_else(|| self.class.tag())
    }
}

impl Source for ChildSource {
    fn kind(&self) -> &str {
        CHILD
    }

    fn create_default(&self, name: &str, obj: &mut Object) -> Result<()> {
        if self.construct_default {
            let child = self.class.construct_default()?;
            obj.set(name, child);
        }
        Ok(())
    }

    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()> {
        match element.find(self.tag()) {
            Some(child_el) => {
                let child = self.class.load_element(child_el)?;
                obj.set(name, child);
                Ok(())
            }
            None if self.optional => Ok(()),
            None => Err(SchemaError::new(
                SchemaErrorKind::MissingRequiredChild,
                format!(
                    "Object of tag \"{}\" should specify child of tag \"{}\"",
                    element.tag,
                    self.tag()
                ),
            )
            .with_attribute(name)
            .with_element(element.tag.as_str())
            .with_value(self.tag())
            .into()),
        }
    }

    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()> {
        match obj.get(name) {
            Some(Value::Object(child)) => {
                element.append(child_element(child, self.tag.as_deref())?);
                Ok(())
            }
            Some(other) => Err(wrong_value(name, obj, "an object", other)),
            None if self.optional => Ok(()),
            None => Err(SchemaError::new(
                SchemaErrorKind::MissingRequiredChild,
                format!(
                    "Object of class \"{}\" has no child \"{}\"",
                    obj.tag(),
                    name
                ),
            )
            .with_attribute(name)
            .with_element(obj.tag())
            .into()),
        }
    }
}

/// Maps an attribute onto every matching child, as an ordered object list.
///
/// No matching children is never an error: the attribute is an empty list.
#[derive(Debug, Clone)]
pub struct ChildrenSource {
    class: Arc<Class>,
    tag: Option<String>,
}

impl ChildrenSource {
    /// Build from an entry configuration
    pub fn from_config(config: &EntryConfig) -> Result<Self> {
        if config.optional {
            return Err(invalid_config(
                CHILDREN,
                "repeated children are always optional",
            ));
        }
        Ok(Self {
            class: child_class(CHILDREN, config)?,
            tag: config.tag.clone(),
        })
    }

    /// The nested class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Tag matched in XML
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or_else(|| self.class.tag())
    }
}

impl Source for ChildrenSource {
    fn kind(&self) -> &str {
        CHILDREN
    }

    fn create_default(&self, name: &str, obj: &mut Object) -> Result<()> {
        obj.set(name, Vec::<Object>::new());
        Ok(())
    }

    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()> {
        let children = element
            .iter_find(self.tag())
            .map(|child_el| self.class.load_element(child_el))
            .collect::<Result<Vec<_>>>()?;
        obj.set(name, children);
        Ok(())
    }

    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()> {
        match obj.get(name) {
            Some(Value::List(children)) => {
                for child in children {
                    element.append(child_element(child, self.tag.as_deref())?);
                }
                Ok(())
            }
            Some(other) => Err(wrong_value(name, obj, "a list of objects", other)),
            None => Ok(()),
        }
    }
}
