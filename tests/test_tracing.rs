extern crate dormant;


use std::io;
use std::sync::Arc;

use dormant::lazy::{CallSite, Registration, Registry, Verbosity};
use loader_util::RecordingLoader;
use parking_lot::Mutex;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records every `dormant` event.
fn capture<F: FnOnce()>(f: F) -> Captured {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured
}

#[test]
fn test_silent_placeholders_emit_nothing() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        let handle = registry.register("pkg.sub").unwrap();
        handle.get("X").unwrap();
    });
    assert_eq!(out.count("-->"), 0);
}

#[test]
fn test_info_logs_register_and_load() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        let handle = registry
            .register_with("pkg.sub", Registration::new().verbosity(Verbosity::Info))
            .unwrap();
        handle.get("X").unwrap();
        handle.get("X").unwrap();
    });

    assert_eq!(out.count("register -->"), 2);
    assert_eq!(out.count("register --> pkg.sub"), 1);
    assert_eq!(out.count("load --> pkg(.sub)"), 1);
    assert_eq!(out.count("load --> pkg.sub(.X)"), 1);
    assert_eq!(out.count("access -->"), 0);
    assert!(out.lines().iter().all(|l| l.contains("dormant")));
}

#[test]
fn test_debug_logs_every_access() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        let handle = registry
            .register_with("pkg", Registration::new().verbosity(Verbosity::Debug))
            .unwrap();
        handle.get("__meta__").unwrap();
        handle.get("X").unwrap();
        handle.get("X").unwrap();
    });

    assert_eq!(out.count("access --> pkg.__meta__"), 1);
    assert_eq!(out.count("access --> pkg.X"), 2);
    assert_eq!(out.count("load --> pkg(.X)"), 1);
}

#[test]
fn test_call_site_level_names_the_caller() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        registry
            .register_with("traced", Registration::new().verbosity(Verbosity::CallSite))
            .unwrap();
    });

    let lines = out.lines();
    let register = lines
        .iter()
        .find(|l| l.contains("register --> traced"))
        .unwrap();
    assert!(register.contains(" at "));
    assert!(register.contains("test_tracing.rs"));
}

struct Fixed;

impl CallSite for Fixed {
    fn capture(&self, _caller: &'static std::panic::Location<'static>) -> Option<String> {
        Some("<fixed>".to_string())
    }
}

#[test]
fn test_custom_call_site() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        registry.set_call_site(Some(Arc::new(Fixed)));
        registry
            .register_with("custom", Registration::new().verbosity(Verbosity::CallSite))
            .unwrap();
        registry.set_call_site(None);
        registry
            .register_with("plain", Registration::new().verbosity(Verbosity::CallSite))
            .unwrap();
    });

    assert_eq!(out.count("register --> custom at <fixed>"), 1);
    assert_eq!(out.count("register --> plain"), 1);
    assert_eq!(out.count("plain at"), 0);
}

#[test]
fn test_ignored_child_access_does_not_log_load() {
    let out = capture(|| {
        let registry = Registry::with_loader(RecordingLoader::new());
        let pkg = registry
            .register_with(
                "pkg",
                Registration::new().ignore(["sub"]).verbosity(Verbosity::Debug),
            )
            .unwrap();
        pkg.get("sub").unwrap();
    });

    assert_eq!(out.count("access --> pkg.sub"), 1);
    assert_eq!(out.count("load -->"), 0);
}
