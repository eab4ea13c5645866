//! The process-wide registry and its free-function surface.
//!
//! The global registry starts empty with an [`Unconfigured`] loader, so every
//! activation fails until [`install_loader`] is called. Its default verbosity
//! comes from `DORMANT_VERBOSE` when that is set to a valid level.

use crate::error::LazyResult;
use crate::lazy::config::RegistryConfig;
use crate::lazy::loader::{Loader, Unconfigured};
use crate::lazy::placeholder::Handle;
use crate::lazy::registry::{Lookup, Registration, Registry, VerbosityGuard};
use crate::lazy::tracer::Verbosity;

lazy_static! {
    static ref GLOBAL: Registry = {
        let registry = Registry::new(Unconfigured);
        match RegistryConfig::default().with_env() {
            Ok(config) => registry.set_default_verbosity(config.verbosity),
            Err(e) => tracing::warn!(target: crate::lazy::tracer::TRACE_TARGET, "ignoring environment: {}", e),
        }
        registry
    };
}

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

pub fn install_loader<L: Loader + 'static>(loader: L) {
    GLOBAL.install_loader(loader);
}

#[track_caller]
pub fn register(name: &str) -> LazyResult<Handle> {
    GLOBAL.register(name)
}

#[track_caller]
pub fn register_with(name: &str, options: Registration) -> LazyResult<Handle> {
    GLOBAL.register_with(name, options)
}

#[track_caller]
pub fn register_many<I, S>(names: I) -> LazyResult<Vec<Handle>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    GLOBAL.register_many(names)
}

#[track_caller]
pub fn wakeup(handle: &Handle) -> LazyResult<()> {
    GLOBAL.wakeup(handle)
}

pub fn is_lazy<'a, T: Into<Lookup<'a>>>(target: T) -> LazyResult<bool> {
    GLOBAL.is_lazy(target)
}

pub fn is_awake<'a, T: Into<Lookup<'a>>>(target: T) -> LazyResult<bool> {
    GLOBAL.is_awake(target)
}

pub fn list_all() -> Vec<Handle> {
    GLOBAL.list_all()
}

/// Scoped default verbosity for the global registry.
pub fn set_verbose(verbosity: Verbosity) -> VerbosityGuard<'static> {
    global().verbose(verbosity)
}
