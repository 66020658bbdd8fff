//! Source strategies
//!
//! A source decides where one schema attribute lives in XML and moves its
//! value between an [`Object`] and an [`Element`]. Five sources are built in:
//!
//! | name         | XML construct                              |
//! |--------------|--------------------------------------------|
//! | `attr`       | an attribute of the element                |
//! | `text`       | the element's own text                     |
//! | `child.text` | the text of the first child with a tag     |
//! | `child`      | one nested object (first matching child)   |
//! | `children`   | every matching child, as an ordered list   |
//!
//! New kinds are added by implementing [`Source`] and registering a
//! constructor with a [`SourceRegistry`](crate::registry::SourceRegistry).

mod child;
mod scalar;

pub use child::{ChildSource, ChildrenSource};
pub use scalar::{AttributeSource, ChildTextSource, ScalarConfig, TextSource};

use crate::class::Object;
use crate::documents::Element;
use crate::error::Result;
use std::fmt;

/// Registry name of [`AttributeSource`]
pub const ATTR: &str = "attr";
/// Registry name of [`TextSource`]
pub const TEXT: &str = "text";
/// Registry name of [`ChildTextSource`]
pub const CHILD_TEXT: &str = "child.text";
/// Registry name of [`ChildSource`]
pub const CHILD: &str = "child";
/// Registry name of [`ChildrenSource`]
pub const CHILDREN: &str = "children";

/// Moves one schema attribute between an object and an XML element
pub trait Source: fmt::Debug + Send + Sync {
    /// Short description used in messages
    fn kind(&self) -> &str;

    /// Check that attribute `name` can be used with this source.
    ///
    /// Called once per entry when a schema is compiled. Sources that use the
    /// attribute name as an XML name reject names XML cannot carry.
    fn check_name(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Give `obj` the attribute's initial value, if the source has one
    fn create_default(&self, _name: &str, _obj: &mut Object) -> Result<()> {
        Ok(())
    }

    /// Load attribute `name` of `obj` from `element`
    fn read(&self, name: &str, obj: &mut Object, element: &Element) -> Result<()>;

    /// Store attribute `name` of `obj` into `element`
    fn write(&self, name: &str, obj: &Object, element: &mut Element) -> Result<()>;
}
