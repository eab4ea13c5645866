//! Family-chain activation.
//!
//! Resolving `a.b.c` resolves `a`, then `a.b`, then `a.b.c`. Each unresolved
//! prefix is loaded under its own placeholder's activation lock, with a second
//! check after the lock is taken, so concurrent callers never run the loader
//! twice for one name. A failure stops the walk; prefixes resolved before it
//! stay resolved.

use std::cell::RefCell;
use std::panic::Location;
use std::sync::Arc;

use crate::error::{LazyError, LazyResult};
use crate::lazy::placeholder::Placeholder;
use crate::lazy::registry::RegistryInner;
use crate::lazy::tracer::Verbosity;
use crate::lazy::types::{Resource, Value};
use crate::name::DottedName;

thread_local! {
    /// Names whose loader is currently running on this thread, outermost first.
    static LOADING: RefCell<Vec<DottedName>> = RefCell::new(Vec::new());
}

/// Whether the current thread is inside a [`Loader::load`](super::loader::Loader::load) call.
pub fn inside_loader() -> bool {
    LOADING.with(|loading| !loading.borrow().is_empty())
}

fn is_loading(name: &DottedName) -> bool {
    LOADING.with(|loading| loading.borrow().iter().any(|n| n == name))
}

struct LoadingGuard;

impl LoadingGuard {
    fn enter(name: &DottedName) -> Self {
        LOADING.with(|loading| loading.borrow_mut().push(name.clone()));
        LoadingGuard
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        LOADING.with(|loading| {
            loading.borrow_mut().pop();
        });
    }
}

/// Resolve `target` and all of its ancestors, root first.
///
/// Returns the target's resource and whether this call was the one that
/// loaded it (as opposed to finding it already resolved).
///
/// An ancestor whose loader is already running on this thread is skipped:
/// a loader for `pkg` may activate `pkg.sub`, which then loads without a
/// parent to fall back on. Touching the target itself from its own loader is
/// a [`LazyError::CircularActivation`].
pub(crate) fn resolve_family(
    registry: &Arc<RegistryInner>,
    target: &DottedName,
    caller: &'static Location<'static>,
) -> LazyResult<(Arc<dyn Resource>, bool)> {
    let family = target.family();
    let mut parent: Option<Arc<dyn Resource>> = None;
    let mut fresh = false;

    for (depth, name) in family.iter().enumerate() {
        let placeholder = placeholder_for(registry, name, caller)?;
        let is_target = depth + 1 == family.len();
        if !is_target && placeholder.is_lazy() && is_loading(name) {
            parent = None;
            continue;
        }

        let (resource, loaded) = activate_one(registry, &placeholder, parent.as_ref())?;
        // The target's own load event is reported by the caller with the
        // member that triggered it.
        if loaded && !is_target {
            let verbosity = placeholder.verbosity();
            if verbosity >= Verbosity::Info {
                let child = family[depth + 1].leaf();
                registry.tracer().loaded(name, child, verbosity, caller);
            }
        }

        fresh = loaded;
        parent = Some(resource);
    }

    match parent {
        Some(resource) => Ok((resource, fresh)),
        None => Err(LazyError::invalid(format!("cannot resolve empty name {:?}", target.as_str()))),
    }
}

/// Ancestors are registered together with their descendants, but a
/// registration racing with this resolution may not have inserted them yet.
fn placeholder_for(
    registry: &Arc<RegistryInner>,
    name: &DottedName,
    caller: &'static Location<'static>,
) -> LazyResult<Arc<Placeholder>> {
    if let Some(entry) = registry.entry(name) {
        return Ok(entry.placeholder().clone());
    }
    let verbosity = registry.default_verbosity();
    let handle = registry.register_name(name.clone(), &[], verbosity, caller)?;
    Ok(handle.placeholder().clone())
}

fn activate_one(
    registry: &RegistryInner,
    placeholder: &Arc<Placeholder>,
    parent: Option<&Arc<dyn Resource>>,
) -> LazyResult<(Arc<dyn Resource>, bool)> {
    if let Some(resource) = placeholder.resource() {
        return Ok((resource, false));
    }
    let name = placeholder.name();
    if is_loading(name) {
        return Err(LazyError::CircularActivation(name.to_string()));
    }

    let _activation = placeholder.lock_activation();
    if let Some(resource) = placeholder.resource() {
        return Ok((resource, false));
    }

    let loader = registry.loader();
    let loaded = {
        let _loading = LoadingGuard::enter(name);
        loader.load(name.as_str())
    };

    let resource = match loaded {
        Ok(resource) => resource,
        Err(source) => match attribute_of_parent(parent, name) {
            Some(resource) if source.is_not_found() => resource,
            _ => {
                return Err(LazyError::ResourceNotFound {
                    name: name.to_string(),
                    source,
                })
            }
        },
    };

    placeholder.settle(resource.clone());
    registry.settle(placeholder);
    Ok((resource, true))
}

/// A child the loader does not know may still be a resource-valued member of
/// its already resolved parent.
fn attribute_of_parent(parent: Option<&Arc<dyn Resource>>, name: &DottedName) -> Option<Arc<dyn Resource>> {
    match parent?.member(name.leaf())? {
        Value::Resource(resource) => Some(resource),
        _ => None,
    }
}
