//! # dormant - lazy activation handles for named resources
//!
//! Registers hierarchically named, expensive-to-construct resources as
//! placeholders and constructs them only when they are truly needed:
//! - Dotted names (`pkg.sub.leaf`) with relative forms resolved against an anchor
//! - Placeholders that intercept member access and calls
//! - Ancestor-first (family chain) activation through a pluggable loader
//! - Ignored children that never force their parent to load
//! - Verbosity-gated `tracing` instrumentation
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dormant::error::LoadError;
//! use dormant::lazy::{Namespace, Registry, Resource, Value};
//!
//! let registry = Registry::new(|name: &str| -> Result<Arc<dyn Resource>, LoadError> {
//!     Ok(Namespace::new(name).with_member("greeting", "hello").into_resource())
//! });
//!
//! let handle = registry.register("tools.text").unwrap();
//! assert!(handle.is_lazy());
//! assert_eq!(registry.list_all().len(), 2); // tools.text and tools
//!
//! // Touching a member loads `tools`, then `tools.text`.
//! assert_eq!(handle.get("greeting").unwrap(), Value::from("hello"));
//! assert!(!handle.is_lazy());
//! assert!(registry.list_all().is_empty());
//! ```
//!
//! ### Ignored Children
//!
//! ```
//! use std::sync::Arc;
//! use dormant::error::LoadError;
//! use dormant::lazy::{Namespace, Registry, Registration, Resource};
//!
//! let registry = Registry::new(|name: &str| -> Result<Arc<dyn Resource>, LoadError> {
//!     Ok(Namespace::new(name).into_resource())
//! });
//!
//! let pkg = registry
//!     .register_with("pkg", Registration::new().ignore(["sub"]))
//!     .unwrap();
//!
//! // `sub` is handed out as its own placeholder; `pkg` stays lazy.
//! let sub = pkg.get("sub").unwrap();
//! assert_eq!(sub.as_handle().unwrap().name(), "pkg.sub");
//! assert!(registry.is_lazy("pkg").unwrap());
//! ```
//!
//! ### The Global Registry
//!
//! The free functions at the crate root operate on one process-wide
//! [`Registry`](lazy::Registry), which starts empty and cannot load anything
//! until a loader is installed with [`install_loader`].
//!
//! ## Architecture
//!
//! - **[`name`]** - Dotted-name grammar and the [`DottedName`](name::DottedName) type
//! - **[`lazy`]** - Registry, placeholders, resolver, loader boundary
//!   - **[`lazy::config`]** - TOML configuration and probe rules
//!   - **[`lazy::tracer`]** - Verbosity levels and call-site capture
//! - **[`error`]** - Error taxonomy

#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod lazy;
pub mod name;

pub use error::{LazyError, LazyResult, LoadError};
pub use lazy::global::{
    global, install_loader, is_awake, is_lazy, list_all, register, register_many, register_with,
    set_verbose, wakeup,
};
pub use lazy::tracer::init_tracing;
