//! Load/save hooks
//!
//! Every [`Class`] owns its own [`Hooks`]; adding a hook to one class never
//! affects another. Hooks run after an object has been loaded (`FromXml`,
//! with the new object) or after an element has been produced (`ToXml`, with
//! the element).

use crate::class::{Class, Object};
use crate::documents::Element;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle events hooks can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// An object was loaded from XML
    FromXml,
    /// An object was converted to an XML element
    ToXml,
}

impl HookEvent {
    /// Get the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::FromXml => "fromxml",
            HookEvent::ToXml => "toxml",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook is called with
#[derive(Debug, Clone, Copy)]
pub enum HookTarget<'a> {
    /// The object just loaded
    Object(&'a Object),
    /// The element just produced
    Element(&'a Element),
}

/// Hook callback: `(event, class raising the event, target)`
pub type Hook = Arc<dyn Fn(HookEvent, &Class, HookTarget<'_>) + Send + Sync>;

/// Wrap a closure as a [`Hook`]
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(HookEvent, &Class, HookTarget<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_hook(a: &Hook, b: &Hook) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Per-class hook lists
#[derive(Default)]
pub struct Hooks {
    from_xml: RwLock<Vec<Hook>>,
    to_xml: RwLock<Vec<Hook>>,
}

impl Hooks {
    /// Create empty hook lists
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, event: HookEvent) -> &RwLock<Vec<Hook>> {
        match event {
            HookEvent::FromXml => &self.from_xml,
            HookEvent::ToXml => &self.to_xml,
        }
    }

    /// Add `hook` to `event` unless that same hook is already there.
    ///
    /// Returns whether the hook was added.
    pub fn add(&self, event: HookEvent, hook: Hook) -> bool {
        let mut list = self
            .list(event)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if list.iter().any(|h| same_hook(h, &hook)) {
            return false;
        }
        list.push(hook);
        true
    }

    /// Remove `hook` from `event`; a hook that is not there is ignored.
    ///
    /// Returns whether the hook was removed.
    pub fn remove(&self, event: HookEvent, hook: &Hook) -> bool {
        let mut list = self
            .list(event)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|h| !same_hook(h, hook));
        list.len() != before
    }

    /// Number of hooks on `event`
    pub fn len(&self, event: HookEvent) -> usize {
        self.list(event)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the hooks of `event` in the order they were added
    pub fn fire(&self, event: HookEvent, class: &Class, target: HookTarget<'_>) {
        // Snapshot so a hook may add or remove hooks without deadlocking.
        let hooks: Vec<Hook> = self
            .list(event)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for h in hooks {
            h(event, class, target);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("fromxml", &self.len(HookEvent::FromXml))
            .field("toxml", &self.len(HookEvent::ToXml))
            .finish()
    }
}
