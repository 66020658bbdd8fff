//! Error types for xmlacorn
//!
//! Every mapping violation (unknown source, missing values or children,
//! illegal option values, bad configuration) is a [`SchemaError`], so callers
//! can match a single variant of [`Error`] to mean "the object/XML pair does
//! not fit the schema". Failures of the XML layer and of user converters are
//! reported as their own variants and are never folded into `SchemaError`.

use std::fmt;
use thiserror::Error;

/// Result type alias using the xmlacorn [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by user supplied converters and custom sources
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for xmlacorn operations
#[derive(Error, Debug)]
pub enum Error {
    /// Schema or mapping violation
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A type converter rejected a raw value; the converter's error is kept as-is
    #[error("{0}")]
    Conversion(BoxError),

    /// XML parsing/serialization error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while reading class definitions
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),
}

impl Error {
    /// Return the schema error kind, if this is a schema error
    pub fn schema_kind(&self) -> Option<SchemaErrorKind> {
        match self {
            Error::Schema(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Check whether this error is a schema error of the given kind
    pub fn is_schema(&self, kind: SchemaErrorKind) -> bool {
        self.schema_kind() == Some(kind)
    }
}

/// Category of a [`SchemaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    /// A content entry names a source that is not registered
    UnknownSource,
    /// A scalar value is absent from the XML and has no default
    MissingRequiredValue,
    /// A required child element (or in-memory child object) is absent
    MissingRequiredChild,
    /// A converted value is not one of the permissible options
    InvalidOption,
    /// An entry configuration is unusable for its source
    InvalidConfig,
    /// An in-memory value has the wrong shape for its source
    InvalidValue,
    /// An override names an attribute the schema does not declare
    UnknownAttribute,
    /// A class was given content more than once
    AlreadyDefined,
    /// A definition refers to a class that does not exist
    UnknownClass,
    /// A definition refers to a converter or serializer that does not exist
    UnknownType,
}

impl SchemaErrorKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaErrorKind::UnknownSource => "unknown source",
            SchemaErrorKind::MissingRequiredValue => "missing required value",
            SchemaErrorKind::MissingRequiredChild => "missing required child",
            SchemaErrorKind::InvalidOption => "invalid option",
            SchemaErrorKind::InvalidConfig => "invalid configuration",
            SchemaErrorKind::InvalidValue => "invalid value",
            SchemaErrorKind::UnknownAttribute => "unknown attribute",
            SchemaErrorKind::AlreadyDefined => "already defined",
            SchemaErrorKind::UnknownClass => "unknown class",
            SchemaErrorKind::UnknownType => "unknown type",
        }
    }
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema/mapping error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// What went wrong
    pub kind: SchemaErrorKind,
    /// Error message
    pub message: String,
    /// Attribute the error is about
    pub attribute: Option<String>,
    /// Tag of the element (or class) involved
    pub element: Option<String>,
    /// Offending value
    pub value: Option<String>,
    /// Permissible values, for option violations
    pub allowed: Option<Vec<String>>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attribute: None,
            element: None,
            value: None,
            allowed: None,
        }
    }

    /// Set the attribute name
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Set the element tag
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the permissible values
    pub fn with_allowed<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(allowed.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(ref attribute) = self.attribute {
            write!(f, "\n\nAttribute: {}", attribute)?;
        }

        if let Some(ref element) = self.element {
            write!(f, "\n\nElement: {}", element)?;
        }

        if let Some(ref value) = self.value {
            write!(f, "\n\nValue: {}", value)?;
        }

        if let Some(ref allowed) = self.allowed {
            write!(f, "\n\nAllowed: {}", allowed.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}
