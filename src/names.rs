//! XML name validation
//!
//! Class tags and child-text tags end up as element names in the produced
//! XML, so they are checked when a class is created or a schema compiled
//! rather than when a document is written.

use crate::error::{Result, SchemaError, SchemaErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;

// Namespaces are not handled, so names are colon free (NCName shaped).
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\-\.0-9\u{B7}]*$",
    )
    .unwrap()
});

/// Check if a string is a valid element/attribute name
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// Validate a name and return an `InvalidConfig` schema error if invalid
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(SchemaError::new(
            SchemaErrorKind::InvalidConfig,
            format!("invalid XML name: '{}'", name),
        )
        .into())
    }
}
