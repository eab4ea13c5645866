//! Verbosity-gated instrumentation of registration, access and load events.
//!
//! Events go through `tracing` under the `dormant` target. Each placeholder
//! carries its own [`Verbosity`]; the [`Tracer`] only formats and emits, and is
//! created the first time any placeholder actually has something to say.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::{Arc, Once};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::name::DottedName;

pub const TRACE_TARGET: &str = "dormant";

/// How much a placeholder reports about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Verbosity {
    /// Nothing.
    Silent = 0,
    /// Registration and load events.
    Info = 1,
    /// Also every intercepted member access.
    Debug = 2,
    /// Also the caller's location on every line. Expensive.
    CallSite = 3,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Silent
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Verbosity::Silent),
            1 => Ok(Verbosity::Info),
            2 => Ok(Verbosity::Debug),
            3 => Ok(Verbosity::CallSite),
            other => Err(ConfigError::InvalidVerbosity(other)),
        }
    }
}

impl From<Verbosity> for u8 {
    fn from(v: Verbosity) -> u8 {
        v as u8
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Source of the caller context appended to log lines at
/// [`Verbosity::CallSite`].
pub trait CallSite: Send + Sync {
    /// Describe the call site, or `None` when nothing can be captured.
    fn capture(&self, caller: &'static Location<'static>) -> Option<String>;
}

/// Reports the `#[track_caller]` location of the public entry point.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallerLocation;

impl CallSite for CallerLocation {
    fn capture(&self, caller: &'static Location<'static>) -> Option<String> {
        Some(format!(
            "{}:{}:{}",
            caller.file(),
            caller.line(),
            caller.column()
        ))
    }
}

/// Appends the first `depth` lines of a captured backtrace to the caller
/// location. Yields nothing when backtraces are disabled (`RUST_BACKTRACE`).
#[derive(Debug, Clone, Copy)]
pub struct StackCallSite {
    pub depth: usize,
}

impl Default for StackCallSite {
    fn default() -> Self {
        StackCallSite { depth: 8 }
    }
}

impl CallSite for StackCallSite {
    fn capture(&self, caller: &'static Location<'static>) -> Option<String> {
        let trace = Backtrace::capture();
        if trace.status() != BacktraceStatus::Captured {
            return None;
        }
        let rendered = trace.to_string();
        let frames: Vec<&str> = rendered
            .lines()
            .map(str::trim)
            .take(self.depth)
            .collect();
        Some(format!(
            "{}:{} | {}",
            caller.file(),
            caller.line(),
            frames.join(" | ")
        ))
    }
}

/// Shared event emitter for all placeholders of one registry.
pub struct Tracer {
    call_site: RwLock<Option<Arc<dyn CallSite>>>,
}

impl Tracer {
    pub fn new() -> Self {
        Tracer {
            call_site: RwLock::new(Some(Arc::new(CallerLocation))),
        }
    }

    /// Replace the call-site capture; `None` turns it off entirely.
    pub fn set_call_site(&self, call_site: Option<Arc<dyn CallSite>>) {
        *self.call_site.write() = call_site;
    }

    pub fn registered(
        &self,
        name: &DottedName,
        id: &uuid::Uuid,
        verbosity: Verbosity,
        caller: &'static Location<'static>,
    ) {
        if verbosity >= Verbosity::Info {
            let context = self.context(verbosity, caller);
            tracing::info!(target: TRACE_TARGET, %id, "register --> {}{}", name, context);
        }
    }

    pub fn accessed(
        &self,
        name: &DottedName,
        member: &str,
        verbosity: Verbosity,
        caller: &'static Location<'static>,
    ) {
        if verbosity >= Verbosity::Debug {
            let context = self.context(verbosity, caller);
            tracing::debug!(target: TRACE_TARGET, "access --> {}.{}{}", name, member, context);
        }
    }

    pub fn loaded(
        &self,
        name: &DottedName,
        trigger: &str,
        verbosity: Verbosity,
        caller: &'static Location<'static>,
    ) {
        if verbosity >= Verbosity::Info {
            let context = self.context(verbosity, caller);
            tracing::info!(target: TRACE_TARGET, "load --> {}(.{}){}", name, trigger, context);
        }
    }

    /// Caller context for one line. Capture failures, including panics inside
    /// a custom [`CallSite`], degrade to an empty string.
    fn context(&self, verbosity: Verbosity, caller: &'static Location<'static>) -> String {
        if verbosity < Verbosity::CallSite {
            return String::new();
        }
        let call_site = match self.call_site.read().clone() {
            Some(call_site) => call_site,
            None => return String::new(),
        };
        panic::catch_unwind(AssertUnwindSafe(|| call_site.capture(caller)))
            .ok()
            .flatten()
            .map(|site| format!(" at {}", site))
            .unwrap_or_default()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing-subscriber` formatter for the crate's events.
///
/// Safe to call multiple times. Only installs when `RUST_LOG` is set, e.g.
/// `RUST_LOG=dormant=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
