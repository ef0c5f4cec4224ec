//! Typed environment map for embedder services
//!
//! The scheduler threads an [`Environment`] through every node invocation
//! without inspecting it. Embedders load it with the live objects their node
//! kinds need at run time: model service gateways, blob stores, credential
//! handles. None of these survive a serialization boundary, so the map holds
//! them type-erased and hands back concrete references on lookup.

use std::any::Any;
use std::collections::HashMap;

/// Opaque bundle of embedder services, keyed by string.
///
/// Node kinds that wrap external collaborators pull their handles out of
/// this map inside `execute`; the core itself never reads it.
pub struct Environment {
    inner: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Environment {
    /// An environment with nothing registered.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Store a service under `key`, displacing any earlier entry.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.inner.insert(key.to_string(), Box::new(value));
    }

    /// Look up the service stored under `key`.
    ///
    /// Misses both when the key was never registered and when it was
    /// registered with a different concrete type than the one requested.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.inner.get(key).and_then(|v| v.downcast_ref())
    }

    /// Whether anything is registered under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
