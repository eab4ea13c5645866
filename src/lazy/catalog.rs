//! Table-driven loader.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::lazy::loader::Loader;
use crate::lazy::types::{Namespace, Resource};

/// Constructor for one catalog entry. Receives the name being loaded.
pub type Factory = Box<dyn Fn(&str) -> Result<Arc<dyn Resource>, LoadError> + Send + Sync>;

/// A [`Loader`] backed by a table of per-name factories.
///
/// Factories run only when the registry activates the matching name, so a
/// catalog can describe many expensive resources while constructing none of
/// them up front.
pub struct Catalog {
    factories: HashMap<String, Factory>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Catalog {
            factories: HashMap::new(),
        }
    }

    /// Register a factory for `name`, replacing any earlier one.
    pub fn provide<S, F>(&mut self, name: S, factory: F) -> &mut Self
    where
        S: Into<String>,
        F: Fn(&str) -> Result<Arc<dyn Resource>, LoadError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Register a prebuilt namespace; each load hands out a fresh copy.
    pub fn provide_namespace(&mut self, namespace: Namespace) -> &mut Self {
        let name = namespace.name().to_string();
        self.provide(name, move |_| Ok(namespace.clone().into_resource()))
    }

    /// Check if a factory exists for the given name.
    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Get list of all provided names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for Catalog {
    fn load(&self, name: &str) -> Result<Arc<dyn Resource>, LoadError> {
        match self.factories.get(name) {
            Some(factory) => factory(name),
            None => Err(LoadError::NotFound(name.to_string())),
        }
    }

    fn name(&self) -> &str {
        "catalog"
    }
}
