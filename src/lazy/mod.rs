//! Lazy activation of hierarchically named resources.
//!
//! This module implements the placeholder/registry/resolver triad: callers
//! register dotted names, get back handles, and the expensive resource behind
//! a handle is only constructed when the handle is truly used.
//!
//! ## Key Components
//!
//! - **[`Registry`]**: one entry per dotted name, either an unresolved
//!   [`Placeholder`] or a resolved [`Resource`]
//! - **[`Placeholder`]** / **[`Handle`]**: the lazy stand-in; intercepts member
//!   access and calls
//! - **[`resolver`]**: the family-chain walk that loads `a`, `a.b`, `a.b.c` in
//!   that order
//! - **[`Loader`]**: the boundary that actually constructs resources
//! - **[`Tracer`]**: verbosity-gated `tracing` events
//!
//! ## Activation Flow
//!
//! ```text
//! register("pkg.sub")      → placeholders for pkg.sub and pkg (pkg ignores "sub")
//!      ↓
//! handle.get("X")          → not a probe, not ignored
//!      ↓
//! resolve family           → Loader("pkg"), then Loader("pkg.sub")
//!      ↓
//! registry updated         → both entries now Resolved
//!      ↓
//! Resource("pkg.sub").X
//! ```
//!
//! ## Example
//!
//! ```
//! use dormant::lazy::{Catalog, Namespace, Registry, Registration, Value};
//!
//! let mut catalog = Catalog::new();
//! catalog.provide_namespace(Namespace::new("pkg"));
//! catalog.provide_namespace(Namespace::new("pkg.sub").with_member("X", Value::Integer(42)));
//!
//! let registry = Registry::new(catalog);
//! let sub = registry.register("pkg.sub").unwrap();
//! assert!(registry.is_lazy("pkg").unwrap());
//!
//! assert_eq!(sub.get("X").unwrap(), Value::Integer(42));
//! assert!(registry.is_awake("pkg").unwrap());
//!
//! let pkg = registry
//!     .register_with("pkg", Registration::new().ignore(["sub"]))
//!     .unwrap();
//! assert!(!pkg.is_lazy());
//! ```

pub mod catalog;
pub mod config;
pub mod global;
pub mod loader;
pub mod placeholder;
pub mod registry;
pub mod resolver;
pub mod tracer;
pub mod types;

pub use catalog::Catalog;
pub use config::{EntryConfig, ProbeRules, RegistryConfig};
pub use loader::{Loader, Unconfigured};
pub use placeholder::{Handle, Placeholder};
pub use registry::{Lookup, Registration, Registry, VerbosityGuard};
pub use tracer::{init_tracing, CallSite, CallerLocation, StackCallSite, Tracer, Verbosity};
pub use types::{NativeFn, Namespace, Resource, Value};
