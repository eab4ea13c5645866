//! The registry: one entry per dotted name, either still deferred or resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{LazyError, LazyResult};
use crate::lazy::config::{EntryConfig, ProbeRules, RegistryConfig};
use crate::lazy::loader::Loader;
use crate::lazy::placeholder::{Handle, Placeholder};
use crate::lazy::tracer::{CallSite, Tracer, Verbosity};
use crate::name::DottedName;

/// The placeholder outlives its activation: a resolved entry keeps it so
/// every handle for the name answers member lookups the same way.
#[derive(Clone)]
pub(crate) enum Entry {
    Unresolved(Arc<Placeholder>),
    Resolved(Arc<Placeholder>),
}

impl Entry {
    pub(crate) fn placeholder(&self) -> &Arc<Placeholder> {
        match self {
            Entry::Unresolved(p) | Entry::Resolved(p) => p,
        }
    }

    fn into_handle(self) -> Handle {
        match self {
            Entry::Unresolved(p) | Entry::Resolved(p) => Handle::new(p),
        }
    }
}

pub(crate) struct RegistryInner {
    entries: RwLock<BTreeMap<DottedName, Entry>>,
    loader: RwLock<Arc<dyn Loader>>,
    probes: RwLock<ProbeRules>,
    default_verbosity: AtomicU8,
    /// Created on the first event that is actually emitted.
    tracer: OnceLock<Tracer>,
}

impl RegistryInner {
    pub(crate) fn entry(&self, name: &DottedName) -> Option<Entry> {
        self.entries.read().get(name).cloned()
    }

    pub(crate) fn handle_for(&self, name: &DottedName) -> Option<Handle> {
        self.entry(name).map(Entry::into_handle)
    }

    fn contains(&self, name: &DottedName) -> bool {
        self.entries.read().contains_key(name)
    }

    /// The current loader. Cloned out so no lock is held while it runs.
    pub(crate) fn loader(&self) -> Arc<dyn Loader> {
        self.loader.read().clone()
    }

    pub(crate) fn probes(&self) -> RwLockReadGuard<'_, ProbeRules> {
        self.probes.read()
    }

    pub(crate) fn tracer(&self) -> &Tracer {
        self.tracer.get_or_init(Tracer::new)
    }

    pub(crate) fn default_verbosity(&self) -> Verbosity {
        Verbosity::try_from(self.default_verbosity.load(Ordering::Acquire)).unwrap_or_default()
    }

    fn set_default_verbosity(&self, verbosity: Verbosity) -> Verbosity {
        let previous = self.default_verbosity.swap(verbosity as u8, Ordering::AcqRel);
        Verbosity::try_from(previous).unwrap_or_default()
    }

    /// Mark the entry for an activated placeholder as resolved.
    pub(crate) fn settle(&self, placeholder: &Arc<Placeholder>) {
        self.entries
            .write()
            .insert(placeholder.name().clone(), Entry::Resolved(placeholder.clone()));
    }

    /// Register `name`, creating a placeholder if it has no entry.
    ///
    /// A new placeholder also registers its parent with the new leaf ignored,
    /// so registering a descendant never forces an ancestor to load. An
    /// existing placeholder gets `ignore` merged and its verbosity raised. A
    /// resolved entry is returned as is.
    ///
    /// `ignore` holds relative child paths that were already validated, so a
    /// malformed entry can never leave a half-applied registration behind.
    pub(crate) fn register_name(
        self: &Arc<Self>,
        name: DottedName,
        ignore: &[DottedName],
        verbosity: Verbosity,
        caller: &'static Location<'static>,
    ) -> LazyResult<Handle> {
        let found = {
            let mut entries = self.entries.write();
            match entries.get(&name) {
                Some(entry) => Ok(entry.clone()),
                None => {
                    let placeholder = Arc::new(Placeholder::new(
                        name.clone(),
                        verbosity,
                        Arc::downgrade(self),
                    ));
                    entries.insert(name.clone(), Entry::Unresolved(placeholder.clone()));
                    Err(placeholder)
                }
            }
        };

        let (placeholder, created) = match found {
            Ok(Entry::Resolved(placeholder)) => {
                self.check_resolved_ignore(&name, ignore)?;
                return Ok(Handle::new(placeholder));
            }
            Ok(Entry::Unresolved(placeholder)) => {
                placeholder.raise_verbosity(verbosity);
                (placeholder, false)
            }
            Err(placeholder) => {
                if verbosity >= Verbosity::Info {
                    self.tracer()
                        .registered(&name, &placeholder.id(), verbosity, caller);
                }
                (placeholder, true)
            }
        };

        self.apply_ignore(&placeholder, ignore, caller)?;

        if created {
            if let Some(parent) = name.parent() {
                self.register_name(parent, &[name.leaf_name()], verbosity, caller)?;
            }
        }
        Ok(Handle::new(placeholder))
    }

    /// A child that already has an entry keeps its own metadata; only new
    /// children inherit the parent's verbosity.
    fn apply_ignore(
        self: &Arc<Self>,
        placeholder: &Arc<Placeholder>,
        ignore: &[DottedName],
        caller: &'static Location<'static>,
    ) -> LazyResult<()> {
        for path in ignore {
            let child_name = placeholder.name().child(path.as_str());
            if !self.contains(&child_name) {
                let verbosity = placeholder.verbosity();
                self.register_name(child_name, &[], verbosity, caller)?;
            }
            placeholder.ignore_child(path.head());
        }
        Ok(())
    }

    /// Ignoring a child of a resolved entry only makes sense if that child
    /// already has an entry of its own.
    fn check_resolved_ignore(&self, name: &DottedName, ignore: &[DottedName]) -> LazyResult<()> {
        for path in ignore {
            if !self.contains(&name.child(path.as_str())) {
                return Err(LazyError::Conflict {
                    name: name.to_string(),
                    reason: format!(
                        "already resolved, so unregistered child {:?} cannot be ignored",
                        path.as_str()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Options for [`Registry::register_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    context: Option<String>,
    ignore: Vec<String>,
    verbosity: Option<Verbosity>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor for relative names (`.sub`, `..sibling`).
    pub fn context<S: Into<String>>(mut self, anchor: S) -> Self {
        self.context = Some(anchor.into());
        self
    }

    /// Child names whose access must not activate this entry.
    pub fn ignore<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }
}

impl From<&EntryConfig> for Registration {
    fn from(entry: &EntryConfig) -> Self {
        Registration {
            context: entry.context.clone(),
            ignore: entry.ignore.clone(),
            verbosity: entry.verbosity,
        }
    }
}

/// Argument to [`Registry::is_lazy`]: a handle or a dotted name.
pub enum Lookup<'a> {
    Handle(&'a Handle),
    Name(&'a str),
}

impl<'a> From<&'a Handle> for Lookup<'a> {
    fn from(handle: &'a Handle) -> Self {
        Lookup::Handle(handle)
    }
}

impl<'a> From<&'a str> for Lookup<'a> {
    fn from(name: &'a str) -> Self {
        Lookup::Name(name)
    }
}

impl<'a> From<&'a String> for Lookup<'a> {
    fn from(name: &'a String) -> Self {
        Lookup::Name(name)
    }
}

/// Restores the previous default verbosity when dropped.
pub struct VerbosityGuard<'a> {
    registry: &'a Registry,
    previous: Verbosity,
}

impl Drop for VerbosityGuard<'_> {
    fn drop(&mut self) {
        self.registry.inner.set_default_verbosity(self.previous);
    }
}

/// Mapping from dotted names to deferred or resolved resources.
///
/// Cloning is cheap and yields another handle onto the same registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create an empty registry backed by `loader`.
    pub fn new<L: Loader + 'static>(loader: L) -> Self {
        Self::with_loader(Arc::new(loader))
    }

    pub fn with_loader(loader: Arc<dyn Loader>) -> Self {
        Registry {
            inner: Arc::new(RegistryInner {
                entries: RwLock::new(BTreeMap::new()),
                loader: RwLock::new(loader),
                probes: RwLock::new(ProbeRules::default()),
                default_verbosity: AtomicU8::new(Verbosity::Silent as u8),
                tracer: OnceLock::new(),
            }),
        }
    }

    /// Create a registry from a configuration: default verbosity, probe
    /// rules, then every `[[lazy]]` entry is registered in order.
    #[track_caller]
    pub fn with_config(loader: Arc<dyn Loader>, config: &RegistryConfig) -> LazyResult<Self> {
        let caller = Location::caller();
        let registry = Self::with_loader(loader);
        registry.set_default_verbosity(config.verbosity);
        registry.set_probe_rules(config.probes.clone());
        for entry in &config.entries {
            registry.register_at(&entry.name, Registration::from(entry), caller)?;
        }
        Ok(registry)
    }

    /// Replace the loader. Placeholders already resolved are unaffected;
    /// unresolved ones use the new loader on their next activation.
    pub fn install_loader<L: Loader + 'static>(&self, loader: L) {
        self.install_shared_loader(Arc::new(loader));
    }

    pub fn install_shared_loader(&self, loader: Arc<dyn Loader>) {
        tracing::debug!(target: crate::lazy::tracer::TRACE_TARGET, "installing loader {:?}", loader.name());
        *self.inner.loader.write() = loader;
    }

    pub fn set_probe_rules(&self, rules: ProbeRules) {
        *self.inner.probes.write() = rules;
    }

    pub fn probe_rules(&self) -> ProbeRules {
        self.inner.probes().clone()
    }

    /// Replace the call-site capture used at [`Verbosity::CallSite`];
    /// `None` disables it.
    pub fn set_call_site(&self, call_site: Option<Arc<dyn CallSite>>) {
        self.inner.tracer().set_call_site(call_site);
    }

    pub fn default_verbosity(&self) -> Verbosity {
        self.inner.default_verbosity()
    }

    pub fn set_default_verbosity(&self, verbosity: Verbosity) {
        self.inner.set_default_verbosity(verbosity);
    }

    /// Use `verbosity` as the default until the guard is dropped.
    pub fn verbose(&self, verbosity: Verbosity) -> VerbosityGuard<'_> {
        let previous = self.inner.set_default_verbosity(verbosity);
        VerbosityGuard {
            registry: self,
            previous,
        }
    }

    #[track_caller]
    pub fn register(&self, name: &str) -> LazyResult<Handle> {
        self.register_at(name, Registration::default(), Location::caller())
    }

    #[track_caller]
    pub fn register_with(&self, name: &str, options: Registration) -> LazyResult<Handle> {
        self.register_at(name, options, Location::caller())
    }

    /// Register several absolute names at once.
    #[track_caller]
    pub fn register_many<I, S>(&self, names: I) -> LazyResult<Vec<Handle>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let caller = Location::caller();
        names
            .into_iter()
            .map(|name| self.register_at(name.as_ref(), Registration::default(), caller))
            .collect()
    }

    fn register_at(
        &self,
        name: &str,
        options: Registration,
        caller: &'static Location<'static>,
    ) -> LazyResult<Handle> {
        let name = DottedName::resolve(name, options.context.as_deref())?;
        let ignore = options
            .ignore
            .iter()
            .map(|child| DottedName::parse(child))
            .collect::<LazyResult<Vec<_>>>()?;
        let verbosity = options
            .verbosity
            .unwrap_or_else(|| self.inner.default_verbosity());
        self.inner.register_name(name, &ignore, verbosity, caller)
    }

    /// Force activation of `handle`. Repeated or concurrent calls load the
    /// resource at most once.
    #[track_caller]
    pub fn wakeup(&self, handle: &Handle) -> LazyResult<()> {
        handle.wakeup()
    }

    /// Whether the entry is still a placeholder.
    pub fn is_lazy<'a, T: Into<Lookup<'a>>>(&self, target: T) -> LazyResult<bool> {
        match target.into() {
            Lookup::Handle(handle) => Ok(handle.is_lazy()),
            Lookup::Name(name) => {
                let name = DottedName::parse(name)?;
                match self.inner.entry(&name) {
                    Some(entry) => Ok(entry.placeholder().is_lazy()),
                    None => Err(LazyError::NotFound(name.to_string())),
                }
            }
        }
    }

    pub fn is_awake<'a, T: Into<Lookup<'a>>>(&self, target: T) -> LazyResult<bool> {
        self.is_lazy(target).map(|lazy| !lazy)
    }

    /// Snapshot of every entry that is still unresolved, in name order.
    ///
    /// The returned vector is detached from the registry: later activations
    /// do not add to or remove from it.
    pub fn list_all(&self) -> Vec<Handle> {
        self.inner
            .entries
            .read()
            .values()
            .filter_map(|entry| match entry {
                Entry::Unresolved(p) if p.is_lazy() => Some(Handle::new(p.clone())),
                _ => None,
            })
            .collect()
    }

    /// Look up an entry without registering anything.
    pub fn get(&self, name: &str) -> LazyResult<Option<Handle>> {
        let name = DottedName::parse(name)?;
        Ok(self.inner.handle_for(&name))
    }

    pub fn contains(&self, name: &str) -> bool {
        DottedName::parse(name)
            .map(|name| self.inner.contains(&name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.inner.entries.read();
        let lazy = entries
            .values()
            .filter(|e| matches!(e, Entry::Unresolved(p) if p.is_lazy()))
            .count();
        f.debug_struct("Registry")
            .field("entries", &entries.len())
            .field("lazy", &lazy)
            .field("loader", &self.inner.loader().name())
            .finish()
    }
}
