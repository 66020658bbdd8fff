//! Source registry
//!
//! Maps source names (the `src` of an entry) to constructors. Registering a
//! constructor under a new name makes a new kind of source available to all
//! later schema compilations against that registry; registering under an
//! existing name replaces it.
//!
//! [`SourceRegistry::global`] is the process-wide registry used by
//! [`Schema::compile`](crate::schema::Schema::compile). Mutate it during
//! start-up, before schemas are compiled concurrently.

use crate::error::Result;
use crate::schema::{unknown_source, EntryConfig};
use crate::sources::{
    self, AttributeSource, ChildSource, ChildTextSource, ChildrenSource, Source, TextSource,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Builds a source from an entry configuration
pub type SourceConstructor = Arc<dyn Fn(&EntryConfig) -> Result<Arc<dyn Source>> + Send + Sync>;

static GLOBAL: Lazy<SourceRegistry> = Lazy::new(SourceRegistry::new);

/// Name to source-constructor table
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, SourceConstructor>>,
}

impl SourceRegistry {
    /// Create a registry holding the five built-in sources
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(sources::TEXT, |config| {
            Ok(Arc::new(TextSource::from_config(config)?) as Arc<dyn Source>)
        });
        registry.register(sources::ATTR, |config| {
            Ok(Arc::new(AttributeSource::from_config(config)?) as Arc<dyn Source>)
        });
        registry.register(sources::CHILD_TEXT, |config| {
            Ok(Arc::new(ChildTextSource::from_config(config)?) as Arc<dyn Source>)
        });
        registry.register(sources::CHILD, |config| {
            Ok(Arc::new(ChildSource::from_config(config)?) as Arc<dyn Source>)
        });
        registry.register(sources::CHILDREN, |config| {
            Ok(Arc::new(ChildrenSource::from_config(config)?) as Arc<dyn Source>)
        });
        registry
    }

    /// Create a registry with no sources at all
    pub fn empty() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static SourceRegistry {
        &GLOBAL
    }

    /// Register `constructor` under `name`, replacing any previous one
    pub fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&EntryConfig) -> Result<Arc<dyn Source>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(source = %name, "registering source");
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(constructor));
    }

    /// Remove the source registered under `name`.
    ///
    /// Returns whether a source was removed; removing an unknown name is
    /// not an error.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            debug!(source = %name, "unregistered source");
        }
        removed
    }

    /// Look up the constructor for `name`
    pub fn resolve(&self, name: &str) -> Result<SourceConstructor> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_source(name).into())
    }

    /// Check if `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;

    #[test]
    fn test_builtins_registered() {
        let registry = SourceRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["attr", "child", "child.text", "children", "text"]
        );
        assert!(SourceRegistry::empty().names().is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = SourceRegistry::new();
        let err = registry.resolve("cdata").err().unwrap();
        assert!(err.is_schema(SchemaErrorKind::UnknownSource));
    }

    #[test]
    fn test_register_replaces() {
        let registry = SourceRegistry::new();
        registry.register("attr", |config| {
            Ok(Arc::new(TextSource::from_config(config)?) as Arc<dyn Source>)
        });
        let source = registry.resolve("attr").unwrap()(&EntryConfig::attr()).unwrap();
        assert_eq!(source.kind(), "text");
    }

    #[test]
    fn test_unregister_is_silent() {
        let registry = SourceRegistry::new();
        assert!(registry.unregister("text"));
        assert!(!registry.contains("text"));
        assert!(!registry.unregister("text"));
        assert!(!registry.unregister("never-registered"));
    }
}
