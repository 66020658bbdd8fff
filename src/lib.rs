//! # xmlacorn
//!
//! Declarative, schema-driven two-way mapping between objects and XML.
//!
//! A [`Class`] is given a [`Content`] declaration: an ordered list of named
//! attributes, each naming a *source* that says where in an element the
//! attribute's value lives and how it is converted. The declaration is
//! compiled once into a [`Schema`]; objects of the class can then be loaded
//! from XML, created with defaults, and saved back to XML.
//!
//! ## Sources
//!
//! | `src`        | Value lives in                           |
//! |--------------|------------------------------------------|
//! | `attr`       | an XML attribute named like the entry    |
//! | `text`       | the element's own text                   |
//! | `child.text` | the text of a named child element        |
//! | `child`      | a single child element, as an object     |
//! | `children`   | all matching child elements, as a list   |
//!
//! New sources are added by registering a constructor in a
//! [`SourceRegistry`].
//!
//! ## Example
//!
//! ```rust
//! use xmlacorn::{Class, Content, EntryConfig, WriteOptions};
//! use xmlacorn::values::converter;
//!
//! # fn main() -> xmlacorn::Result<()> {
//! let tag = Class::new("tag")?;
//! tag.define(&Content::new().with("name", EntryConfig::attr()))?;
//!
//! let item = Class::new("item")?;
//! item.define(
//!     &Content::new()
//!         .with("name", EntryConfig::attr())
//!         .with(
//!             "count",
//!             EntryConfig::attr()
//!                 .with_converter(converter("int").unwrap())
//!                 .with_default(0),
//!         )
//!         .with("description", EntryConfig::child_text())
//!         .with("tags", EntryConfig::children(tag)),
//! )?;
//!
//! let obj = item.from_xml_str(
//!     r#"<item name="x"><description>d</description><tag name="a"/></item>"#,
//! )?;
//! assert_eq!(obj.get_str("name"), Some("x"));
//! assert_eq!(obj.get_int("count"), Some(0));
//! assert_eq!(obj.get_list("tags").map(|t| t.len()), Some(1));
//!
//! let xml = obj.to_xml_string(&WriteOptions::compact())?;
//! assert!(xml.starts_with(r#"<item name="x" count="0">"#));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// XML trees
pub mod documents;

// Values and conversion
pub mod values;

// Mapping engine
pub mod sources;
pub mod registry;
pub mod schema;
pub mod hooks;
pub mod class;

// JSON class definitions
pub mod definitions;

// Re-exports for convenience
pub use class::{Class, Object, OverridePolicy, XmlDestination, XmlSource};
pub use definitions::Definitions;
pub use documents::{Document, Element, WriteOptions};
pub use error::{Error, Result, SchemaError, SchemaErrorKind};
pub use hooks::{Hook, HookEvent, HookTarget, Hooks};
pub use limits::Limits;
pub use registry::SourceRegistry;
pub use schema::{Content, DefaultValue, EntryConfig, Schema, SchemaEntry};
pub use sources::Source;
pub use values::Value;

/// Version of the xmlacorn library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
