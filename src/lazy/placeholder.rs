//! Placeholders and the handles callers hold.
//!
//! A [`Placeholder`] stands in for a resource that has not been loaded yet.
//! Every member access goes through [`Placeholder::get`], which decides
//! whether the access is allowed to trigger activation:
//!
//! ```text
//! handle.get("X")
//!      ↓
//! 1. Trace the access (verbosity >= 2)
//! 2. Already resolved?           → delegate to the resource
//! 3. Reserved probe name?        → Absent (unless the loader passthrough applies)
//! 4. Probe prefix?               → Absent
//! 5. Ignored child?              → handle for `N.X`, N stays lazy
//! 6. Otherwise                   → resolve the family chain, then delegate
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{LazyError, LazyResult};
use crate::lazy::registry::RegistryInner;
use crate::lazy::resolver;
use crate::lazy::tracer::Verbosity;
use crate::lazy::types::{Resource, Value};
use crate::name::DottedName;

const CALL_TRIGGER: &str = "<call>";
const WAKEUP_TRIGGER: &str = "<wakeup>";

struct Meta {
    ignored: BTreeSet<String>,
    verbosity: Verbosity,
}

/// The lazy stand-in for one dotted name.
///
/// Once `resolved` is set it never changes; the registry entry for the name is
/// switched to the resolved resource right after.
pub struct Placeholder {
    id: Uuid,
    name: DottedName,
    meta: Mutex<Meta>,
    resolved: OnceLock<Arc<dyn Resource>>,
    /// Serializes loader calls for this name.
    activation: Mutex<()>,
    registry: Weak<RegistryInner>,
}

impl Placeholder {
    pub(crate) fn new(name: DottedName, verbosity: Verbosity, registry: Weak<RegistryInner>) -> Self {
        Placeholder {
            id: Uuid::new_v4(),
            name,
            meta: Mutex::new(Meta {
                ignored: BTreeSet::new(),
                verbosity,
            }),
            resolved: OnceLock::new(),
            activation: Mutex::new(()),
            registry,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &DottedName {
        &self.name
    }

    pub fn verbosity(&self) -> Verbosity {
        self.meta.lock().verbosity
    }

    /// The ignored child segments, sorted.
    pub fn ignored(&self) -> Vec<String> {
        self.meta.lock().ignored.iter().cloned().collect()
    }

    pub fn is_ignored(&self, member: &str) -> bool {
        self.meta.lock().ignored.contains(member)
    }

    pub fn is_lazy(&self) -> bool {
        self.resolved.get().is_none()
    }

    pub fn resource(&self) -> Option<Arc<dyn Resource>> {
        self.resolved.get().cloned()
    }

    pub(crate) fn raise_verbosity(&self, verbosity: Verbosity) {
        let mut meta = self.meta.lock();
        if verbosity > meta.verbosity {
            meta.verbosity = verbosity;
        }
    }

    pub(crate) fn ignore_child(&self, segment: &str) {
        self.meta.lock().ignored.insert(segment.to_string());
    }

    pub(crate) fn lock_activation(&self) -> MutexGuard<'_, ()> {
        self.activation.lock()
    }

    /// Record the resolved resource. Returns `false` if one was already set.
    pub(crate) fn settle(&self, resource: Arc<dyn Resource>) -> bool {
        self.resolved.set(resource).is_ok()
    }

    pub(crate) fn get(&self, member: &str, caller: &'static Location<'static>) -> LazyResult<Value> {
        let registry = self.registry.upgrade();
        if let Some(registry) = &registry {
            self.trace_access(registry, member, caller);
        }
        if let Some(resource) = self.resolved.get() {
            return delegate(registry.as_ref(), &self.name, resource, member);
        }
        let registry = registry.ok_or_else(|| LazyError::Detached(self.name.to_string()))?;

        {
            let probes = registry.probes();
            if probes.is_reserved(member) {
                if !(probes.is_passthrough(member) && resolver::inside_loader()) {
                    return Ok(Value::Absent);
                }
            } else if probes.matches_prefix(member) {
                return Ok(Value::Absent);
            }
        }

        if self.is_ignored(member) {
            let verbosity = self.verbosity();
            return registry
                .register_name(self.name.child(member), &[], verbosity, caller)
                .map(Value::Handle);
        }

        let resource = self.activate(&registry, member, caller)?;
        delegate(Some(&registry), &self.name, &resource, member)
    }

    pub(crate) fn call(&self, args: Vec<Value>, caller: &'static Location<'static>) -> LazyResult<Value> {
        let registry = self.registry.upgrade();
        if let Some(registry) = &registry {
            self.trace_access(registry, CALL_TRIGGER, caller);
        }
        let resource = match self.resolved.get() {
            Some(resource) => resource.clone(),
            None => {
                let registry = registry.ok_or_else(|| LazyError::Detached(self.name.to_string()))?;
                self.activate(&registry, CALL_TRIGGER, caller)?
            }
        };
        resource.call(args)
    }

    pub(crate) fn wakeup(&self, caller: &'static Location<'static>) -> LazyResult<Arc<dyn Resource>> {
        if let Some(resource) = self.resolved.get() {
            return Ok(resource.clone());
        }
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| LazyError::Detached(self.name.to_string()))?;
        self.activate(&registry, WAKEUP_TRIGGER, caller)
    }

    fn activate(
        &self,
        registry: &Arc<RegistryInner>,
        trigger: &str,
        caller: &'static Location<'static>,
    ) -> LazyResult<Arc<dyn Resource>> {
        let (resource, fresh) = resolver::resolve_family(registry, &self.name, caller)?;
        if fresh {
            let verbosity = self.verbosity();
            if verbosity >= Verbosity::Info {
                registry.tracer().loaded(&self.name, trigger, verbosity, caller);
            }
        }
        Ok(resource)
    }

    fn trace_access(&self, registry: &RegistryInner, member: &str, caller: &'static Location<'static>) {
        let verbosity = self.verbosity();
        if verbosity >= Verbosity::Debug {
            registry.tracer().accessed(&self.name, member, verbosity, caller);
        }
    }
}

/// Member lookup on a resolved resource. A member the resource lacks can
/// still be a registered child entry.
fn delegate(
    registry: Option<&Arc<RegistryInner>>,
    name: &DottedName,
    resource: &Arc<dyn Resource>,
    member: &str,
) -> LazyResult<Value> {
    if let Some(value) = resource.member(member) {
        return Ok(value);
    }
    if let Some(handle) = registry.and_then(|r| r.handle_for(&name.child(member))) {
        return Ok(Value::Handle(handle));
    }
    Err(LazyError::MissingMember {
        resource: name.to_string(),
        member: member.to_string(),
    })
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resolved.get().is_some() {
            return write!(f, "Resource({})", self.name);
        }
        let meta = self.meta.lock();
        if meta.ignored.is_empty() {
            write!(f, "Placeholder({})", self.name)
        } else {
            let ignored: Vec<&str> = meta.ignored.iter().map(String::as_str).collect();
            write!(f, "Placeholder({}, ignore=[{}])", self.name, ignored.join(", "))
        }
    }
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ignored", &self.ignored())
            .field("verbosity", &self.verbosity())
            .field("lazy", &self.is_lazy())
            .finish()
    }
}

/// What [`register`](crate::lazy::registry::Registry::register) hands back.
///
/// A handle wraps the placeholder for its name and keeps working after
/// activation by delegating to the resource. Every handle for one name wraps
/// the same placeholder, whether it was issued before or after activation.
#[derive(Clone)]
pub struct Handle(Arc<Placeholder>);

impl Handle {
    pub(crate) fn new(placeholder: Arc<Placeholder>) -> Self {
        Handle(placeholder)
    }

    pub fn name(&self) -> &str {
        self.0.name().as_str()
    }

    /// Access member `member`, activating the resource if the access
    /// qualifies.
    #[track_caller]
    pub fn get(&self, member: &str) -> LazyResult<Value> {
        self.0.get(member, Location::caller())
    }

    /// Activate, then invoke the resource with `args`.
    #[track_caller]
    pub fn call(&self, args: Vec<Value>) -> LazyResult<Value> {
        self.0.call(args, Location::caller())
    }

    /// Force activation. A no-op for handles that are already resolved.
    #[track_caller]
    pub fn wakeup(&self) -> LazyResult<()> {
        self.0.wakeup(Location::caller()).map(|_| ())
    }

    pub fn is_lazy(&self) -> bool {
        self.0.is_lazy()
    }

    pub fn placeholder(&self) -> &Arc<Placeholder> {
        &self.0
    }

    /// The resolved resource, if activation has happened.
    pub fn resource(&self) -> Option<Arc<dyn Resource>> {
        self.0.resource()
    }

    pub fn id(&self) -> Uuid {
        self.0.id()
    }

    /// Whether both handles refer to the same registry entry.
    pub fn same_entry(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.same_entry(other)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0.as_ref(), f)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self)
    }
}
