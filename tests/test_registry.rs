extern crate dormant;


use dormant::error::LazyError;
use dormant::lazy::{Registration, Registry, Unconfigured, Value, Verbosity};
use loader_util::RecordingLoader;
use pretty_assertions::assert_eq;

fn lazy_names(registry: &Registry) -> Vec<String> {
    registry
        .list_all()
        .iter()
        .map(|h| h.name().to_string())
        .collect()
}

// ── Registration ─────────────────────────────────────────────────────

#[test]
fn test_register_returns_lazy_handle() {
    let loader = RecordingLoader::new();
    let registry = Registry::with_loader(loader.clone());

    let handle = registry.register("pkg").unwrap();
    assert_eq!(handle.name(), "pkg");
    assert!(handle.is_lazy());
    assert!(!handle.id().is_nil());
    assert!(registry.is_lazy("pkg").unwrap());
    assert!(loader.calls().is_empty());
}

#[test]
fn test_register_is_idempotent() {
    let registry = Registry::with_loader(RecordingLoader::new());

    let first = registry.register("pkg.sub").unwrap();
    let entries = registry.len();
    let second = registry.register("pkg.sub").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.id(), second.id());
    assert_eq!(registry.len(), entries);
}

#[test]
fn test_register_creates_ancestors() {
    let registry = Registry::with_loader(RecordingLoader::new());
    registry.register("a.b.c").unwrap();

    assert_eq!(lazy_names(&registry), vec!["a", "a.b", "a.b.c"]);
    let a = registry.get("a").unwrap().unwrap();
    assert_eq!(a.placeholder().ignored(), vec!["b"]);
    let ab = registry.get("a.b").unwrap().unwrap();
    assert_eq!(ab.placeholder().ignored(), vec!["c"]);
}

#[test]
fn test_register_many() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let handles = registry.register_many(["np", "pd.io", "scipy"]).unwrap();

    let names: Vec<&str> = handles.iter().map(|h| h.name()).collect();
    assert_eq!(names, vec!["np", "pd.io", "scipy"]);
    assert_eq!(lazy_names(&registry), vec!["np", "pd", "pd.io", "scipy"]);
}

#[test]
fn test_register_malformed_names() {
    let registry = Registry::with_loader(RecordingLoader::new());
    for bad in ["", "a..b", "a.", "1abc", "a b"] {
        assert!(
            matches!(registry.register(bad), Err(LazyError::InvalidArgument(_))),
            "{:?} should be rejected",
            bad
        );
    }
    assert!(registry.is_empty());
}

#[test]
fn test_register_relative_names() {
    let registry = Registry::with_loader(RecordingLoader::new());

    let tools = registry
        .register_with(".tools", Registration::new().context("pkg"))
        .unwrap();
    assert_eq!(tools.name(), "pkg.tools");

    let sibling = registry
        .register_with("..sibling", Registration::new().context("pkg.sub"))
        .unwrap();
    assert_eq!(sibling.name(), "pkg.sibling");
}

#[test]
fn test_register_relative_without_anchor() {
    let registry = Registry::with_loader(RecordingLoader::new());
    assert!(matches!(
        registry.register(".tools"),
        Err(LazyError::InvalidArgument(_))
    ));
}

#[test]
fn test_register_absolute_with_anchor() {
    let registry = Registry::with_loader(RecordingLoader::new());
    assert!(matches!(
        registry.register_with("tools", Registration::new().context("pkg")),
        Err(LazyError::InvalidArgument(_))
    ));
}

#[test]
fn test_ignore_registers_children() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let pkg = registry
        .register_with("pkg", Registration::new().ignore(["sub", "deep.leaf"]))
        .unwrap();

    assert_eq!(pkg.placeholder().ignored(), vec!["deep", "sub"]);
    assert!(registry.contains("pkg.sub"));
    assert!(registry.contains("pkg.deep.leaf"));
    assert_eq!(pkg.to_string(), "Placeholder(pkg, ignore=[deep, sub])");
}

#[test]
fn test_ignore_is_merged_on_reregistration() {
    let registry = Registry::with_loader(RecordingLoader::new());
    registry
        .register_with("pkg", Registration::new().ignore(["a"]))
        .unwrap();
    let pkg = registry
        .register_with("pkg", Registration::new().ignore(["b"]))
        .unwrap();
    assert_eq!(pkg.placeholder().ignored(), vec!["a", "b"]);
}

#[test]
fn test_ignore_does_not_touch_existing_child() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let tools = registry
        .register_with("pkg.tools", Registration::new().verbosity(Verbosity::Info))
        .unwrap();
    let pkg = registry
        .register_with(
            "pkg",
            Registration::new()
                .ignore(["tools", "fresh"])
                .verbosity(Verbosity::Debug),
        )
        .unwrap();

    assert_eq!(pkg.placeholder().verbosity(), Verbosity::Debug);
    assert_eq!(pkg.placeholder().ignored(), vec!["fresh", "tools"]);
    assert_eq!(tools.placeholder().verbosity(), Verbosity::Info);

    // A child created by the ignore list inherits the parent's verbosity.
    let fresh = registry.get("pkg.fresh").unwrap().unwrap();
    assert_eq!(fresh.placeholder().verbosity(), Verbosity::Debug);
}

#[test]
fn test_malformed_ignore_entry_registers_nothing() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let err = registry
        .register_with("pkg", Registration::new().ignore(["ok", "bad name"]))
        .unwrap_err();

    assert!(matches!(err, LazyError::InvalidArgument(_)));
    assert!(!registry.contains("pkg"));
    assert!(!registry.contains("pkg.ok"));
    assert!(registry.is_empty());
}

#[test]
fn test_malformed_ignore_on_existing_entry_leaves_it_unchanged() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let pkg = registry.register("pkg").unwrap();
    assert!(registry
        .register_with("pkg", Registration::new().ignore(["ok", ".rel"]))
        .is_err());

    assert!(pkg.placeholder().ignored().is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_verbosity_only_increases() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let handle = registry
        .register_with("v", Registration::new().verbosity(Verbosity::Debug))
        .unwrap();
    registry
        .register_with("v", Registration::new().verbosity(Verbosity::Info))
        .unwrap();
    assert_eq!(handle.placeholder().verbosity(), Verbosity::Debug);

    registry
        .register_with("v", Registration::new().verbosity(Verbosity::CallSite))
        .unwrap();
    assert_eq!(handle.placeholder().verbosity(), Verbosity::CallSite);
}

#[test]
fn test_default_verbosity_guard() {
    let registry = Registry::with_loader(RecordingLoader::new());
    {
        let _verbose = registry.verbose(Verbosity::Debug);
        let handle = registry.register("loud").unwrap();
        assert_eq!(handle.placeholder().verbosity(), Verbosity::Debug);
    }
    assert_eq!(registry.default_verbosity(), Verbosity::Silent);
    let quiet = registry.register("quiet").unwrap();
    assert_eq!(quiet.placeholder().verbosity(), Verbosity::Silent);
}

// ── Resolved entries ─────────────────────────────────────────────────

#[test]
fn test_register_resolved_name_returns_existing_entry() {
    let loader = RecordingLoader::new();
    let registry = Registry::with_loader(loader.clone());
    let handle = registry.register("pkg").unwrap();
    registry.wakeup(&handle).unwrap();

    let again = registry.register("pkg").unwrap();
    assert!(!again.is_lazy());
    assert_eq!(again, handle);
    assert_eq!(again.id(), handle.id());
    assert_eq!(again.to_string(), "Resource(pkg)");
    assert_eq!(loader.count("pkg"), 1);
}

#[test]
fn test_ignore_on_resolved_entry() {
    let registry = Registry::with_loader(RecordingLoader::new());
    registry.register("pkg.sub").unwrap();
    let pkg = registry.register("pkg").unwrap();
    pkg.wakeup().unwrap();

    // Already has its own entry: nothing to change.
    assert!(registry
        .register_with("pkg", Registration::new().ignore(["sub"]))
        .is_ok());

    let err = registry
        .register_with("pkg", Registration::new().ignore(["other"]))
        .unwrap_err();
    assert!(matches!(err, LazyError::Conflict { ref name, .. } if name == "pkg"));
}

// ── Queries ──────────────────────────────────────────────────────────

#[test]
fn test_is_lazy_by_name_and_handle() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let handle = registry.register("pkg").unwrap();

    assert!(registry.is_lazy(&handle).unwrap());
    assert!(registry.is_lazy("pkg").unwrap());
    handle.wakeup().unwrap();
    assert!(registry.is_awake(&handle).unwrap());
    assert!(registry.is_awake("pkg").unwrap());
}

#[test]
fn test_is_lazy_unknown_name() {
    let registry = Registry::with_loader(RecordingLoader::new());
    assert!(matches!(
        registry.is_lazy("ghost"),
        Err(LazyError::NotFound(ref name)) if name == "ghost"
    ));
    assert!(registry.get("ghost").unwrap().is_none());
    assert!(!registry.contains("ghost"));
}

#[test]
fn test_list_all_is_a_snapshot() {
    let registry = Registry::with_loader(RecordingLoader::new());
    let handle = registry.register("a.b").unwrap();

    let snapshot = registry.list_all();
    assert_eq!(snapshot.len(), 2);

    handle.get("X").unwrap();
    registry.register("c").unwrap();

    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|h| !h.is_lazy()));
    assert_eq!(lazy_names(&registry), vec!["c"]);
}

#[test]
fn test_wakeup_twice_loads_once() {
    let loader = RecordingLoader::new();
    let registry = Registry::with_loader(loader.clone());
    let handle = registry.register("pkg.sub").unwrap();

    registry.wakeup(&handle).unwrap();
    registry.wakeup(&handle).unwrap();
    assert_eq!(loader.calls(), vec!["pkg", "pkg.sub"]);
}

#[test]
fn test_unconfigured_loader_knows_nothing() {
    let registry = Registry::new(Unconfigured);
    let handle = registry.register("anything").unwrap();

    let err = handle.get("X").unwrap_err();
    assert!(matches!(
        err,
        LazyError::ResourceNotFound { ref name, ref source } if name == "anything" && source.is_not_found()
    ));

    registry.install_shared_loader(RecordingLoader::new());
    assert_eq!(handle.get("X").unwrap(), Value::from("anything.X"));
}

#[test]
fn test_debug_summary() {
    let registry = Registry::with_loader(RecordingLoader::new());
    registry.register("a.b").unwrap();
    let debug = format!("{:?}", registry);
    assert!(debug.contains("entries: 2"));
    assert!(debug.contains("\"recording\""));
}
