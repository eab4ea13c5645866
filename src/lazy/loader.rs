//! The loader boundary.
//!
//! A [`Loader`] is the only thing the registry knows about how resources come
//! into existence. It is consulted once per dotted name, lazily, when a
//! placeholder for that name is first truly needed.

use std::sync::Arc;

use crate::error::LoadError;
use crate::lazy::types::Resource;

/// Turns a dotted name into a constructed resource.
///
/// Implementations may block; the resolver never holds a registry lock while
/// a loader runs, so a loader is free to register further names.
pub trait Loader: Send + Sync {
    /// Construct the resource for `name`, or report [`LoadError::NotFound`].
    fn load(&self, name: &str) -> Result<Arc<dyn Resource>, LoadError>;

    /// Human-readable name for this loader (for debugging/logging).
    fn name(&self) -> &str {
        "loader"
    }
}

impl<F> Loader for F
where
    F: Fn(&str) -> Result<Arc<dyn Resource>, LoadError> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<Arc<dyn Resource>, LoadError> {
        self(name)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// The loader a registry starts with before one is installed: it knows no
/// names at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl Loader for Unconfigured {
    fn load(&self, name: &str) -> Result<Arc<dyn Resource>, LoadError> {
        Err(LoadError::NotFound(name.to_string()))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}
