//! Scalar sources: attribute, text and child text
//!
//! The three scalar sources share [`ScalarConfig`] and only differ in where
//! the raw string is found and where the rendered string goes.

use super::{Source, ATTR, CHILD_TEXT, TEXT};
use crate::class::Object;
use crate::documents::Element;
use crate::error::{Error, Result, SchemaError, SchemaErrorKind};
use crate::names::validate_name;
use crate::schema::{DefaultValue, EntryConfig};
use crate::values::{default_serializer, string_converter, Converter, Serializer, Value};
use std::fmt;

fn invalid_config(src: &str, message: impl fmt::Display) -> Error {
    SchemaError::new(
        SchemaErrorKind::InvalidConfig,
        format!("source \"{}\": {}", src, message),
    )
    .into()
}

/// Conversion, validation and serialization settings of a scalar attribute
#[derive(Clone)]
pub struct ScalarConfig {
    converter: Converter,
    serializer: Serializer,
    default: Option<Value>,
    options: Option<Vec<Value>>,
}

impl fmt::Debug for ScalarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarConfig")
            .field("default", &self.default)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ScalarConfig {
    /// Build from an entry configuration, rejecting child-only settings
    pub fn from_entry(src: &str, config: &EntryConfig) -> Result<Self> {
        if let Some(ref class) = config.class {
            return Err(invalid_config(
                src,
                format_args!("a scalar source does not take a class (got \"{}\")", class.tag()),
            ));
        }
        if config.optional {
            return Err(invalid_config(src, "'optional' only applies to child sources"));
        }

        let default = match config.default {
            None => None,
            Some(DefaultValue::Value(ref value)) => Some(value.clone()),
            Some(DefaultValue::Construct) => {
                return Err(invalid_config(
                    src,
                    "a constructed default only applies to child sources",
                ))
            }
        };

        Ok(Self {
            converter: config.converter.clone().unwrap_or_else(string_converter),
            serializer: config.serializer.clone().unwrap_or_else(default_serializer),
            default,
            options: config.options.clone(),
        })
    }

    /// The configured default value
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The permissible values, if restricted
    pub fn options(&self) -> Option<&[Value]> {
        self.options.as_deref()
    }

    /// Convert a raw string and enforce the options.
    ///
    /// Converter failures come back as [`Error::Conversion`] holding the
    /// converter's own error.
    pub fn convert(&self, name: &str, raw: &str, owner: &str) -> Result<Value> {
        let value = (self.converter)(raw).map_err(Error::Conversion)?;

        if let Some(ref options) = self.options {
            if !options.iter().any(|option| option.matches(&value)) {
                let allowed: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                return Err(SchemaError::new(
                    SchemaErrorKind::InvalidOption,
                    format!(
                        "Value \"{}\" is illegal for attribute \"{}\" of class \"{}\". \
                         Permissible options are: {}",
                        value,
                        name,
                        owner,
                        allowed.join(", ")
                    ),
                )
                .with_attribute(name)
                .with_element(owner)
                .with_value(value.to_string())
                .with_allowed(allowed)
                .into());
            }
        }

        Ok(value)
    }

    /// Store the converted raw value, or the default when `raw` is absent
    fn load(
        &self,
        name: &str,
        raw: Option<&str>,
        what: &str,
        obj: &mut Object,
        element: &Element,
    ) -> Result<()> {
        let value = match raw {
            Some(raw) => self.convert(name, raw, obj.tag())?,
            None => match self.default {
                Some(ref default) => default.clone(),
                None => {
                    return Err(SchemaError::new(
                        SchemaErrorKind::MissingRequiredValue,
                        format!(
                            "No {} \"{}\" in XML element \"{}\" and no default given",
                            what, name, element.tag
                        ),
                    )
                    .with_attribute(name)
                    .with_element(element.tag.as_str())
                    .into())
                }
            },
        };

        obj.set(name, value);
        Ok(())
    }

    /// Serialize the object's current value of `name`
    fn render(&self, name: &str, obj: &Object) -> Result<String> {
        let value = obj.get(name).ok_or_else(|| {
            SchemaError::new(
                SchemaErrorKind::MissingRequiredValue,
                format!(
                    "Object of class \"{}\" has no value for attribute \"{}\"",
                    obj.tag(),
                    name
                ),
            )
            .with_attribute(name)
            .with_element(obj.tag())
        })?;
        Ok((self.serializer)(value))
    }

    fn create_default(&self, name: &str, obj: &mut Object) {
        if let Some(ref default) = self.default {
            obj.set(name, default.clone());
        }
    }
}

/// Maps an attribute onto the element's text content
#[derive(Debug, Clone)]
pub struct TextSource {
    config: ScalarConfig,
}

impl TextSource {
    /// Build from an entry configuration
    pub fn from_config(config: &EntryConfig) -> Result<Self> {
        if config.tag.is_some() {
            return Err(invalid_config(TEXT, "'tag' only applies to child sources"));
        }
        Ok(Self {
            config: ScalarConfig::from_entry(TEXT, config)?,
        })
    }

    /// The scalar settings
    pub fn config(&self) -> &ScalarConfig {
        &self.config
    }
}

impl Source for TextSource {
    fn kind(&self) -> &str {
        TEXT
    }

    fn create_default(&self, name: &str, obj: &mut Object) -> Result<()> {
        self.config.create_default(name, obj);
        Ok(())
    }

    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()> {
        self.config.load(name, element.text(), "text", obj, element)
    }

    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()> {
        let text = self.config.render(name, obj)?;
        element.set_text(text);
        Ok(())
    }
}

/// Maps an attribute onto an XML attribute of the same name
#[derive(Debug, Clone)]
pub struct AttributeSource {
    config: ScalarConfig,
}

impl AttributeSource {
    /// Build from an entry configuration
    pub fn from_config(config: &EntryConfig) -> Result<Self> {
        if config.tag.is_some() {
            return Err(invalid_config(ATTR, "'tag' only applies to child sources"));
        }
        Ok(Self {
            config: ScalarConfig::from_entry(ATTR, config)?,
        })
    }

    /// The scalar settings
    pub fn config(&self) -> &ScalarConfig {
        &self.config
    }
}

impl Source for AttributeSource {
    fn kind(&self) -> &str {
        ATTR
    }

    fn check_name(&self, name: &str) -> Result<()> {
        validate_name(name)
    }

    fn create_default(&self, name: &str, obj: &mut Object) -> Result<()> {
        self.config.create_default(name, obj);
        Ok(())
    }

    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()> {
        self.config
            .load(name, element.get_attribute(name), "attribute", obj, element)
    }

    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()> {
        let text = self.config.render(name, obj)?;
        element.set_attribute(name, text);
        Ok(())
    }
}

/// Maps an attribute onto the text of a child element.
///
/// The child's tag defaults to the attribute name. A child that is present
/// but empty reads as the empty string. Every write appends a new child, so
/// writing the same object twice into one element duplicates it.
#[derive(Debug, Clone)]
pub struct ChildTextSource {
    config: ScalarConfig,
    tag: Option<String>,
}

impl ChildTextSource {
    /// Build from an entry configuration
    pub fn from_config(config: &EntryConfig) -> Result<Self> {
        if let Some(ref tag) = config.tag {
            validate_name(tag)?;
        }
        Ok(Self {
            config: ScalarConfig::from_entry(CHILD_TEXT, config)?,
            tag: config.tag.clone(),
        })
    }

    /// The scalar settings
    pub fn config(&self) -> &ScalarConfig {
        &self.config
    }

    /// Tag of the child element for attribute `name`
    pub fn tag<'a>(&'a self, name: &'a str) -> &'a str {
        self.tag.as_deref().unwrap_or(name)
    }
}

impl Source for ChildTextSource {
    fn kind(&self) -> &str {
        CHILD_TEXT
    }

    fn check_name(&self, name: &str) -> Result<()> {
        validate_name(self.tag(name))
    }

    fn create_default(&self, name: &str, obj: &mut Object) -> Result<()> {
        self.config.create_default(name, obj);
        Ok(())
    }

    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()> {
        let raw = element
            .find(self.tag(name))
            .map(|child| child.text().unwrap_or(""));
        self.config.load(name, raw, "child", obj, element)
    }

    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()> {
        let text = self.config.render(name, obj)?;
        element.sub_element(self.tag(name)).set_text(text);
        Ok(())
    }
}
