//! Registry configuration.
//!
//! Expected format:
//! ```toml
//! verbosity = 1
//!
//! [probes]
//! reserved = ["__meta__", "__path__"]
//! prefixes = ["__probe_", "__repr_"]
//! loader_passthrough = "__meta__"
//!
//! [[lazy]]
//! name = "pkg"
//! ignore = ["sub"]
//! verbosity = 2
//!
//! [[lazy]]
//! name = ".tools"
//! context = "pkg"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lazy::tracer::Verbosity;

/// Environment variable overriding the default registration verbosity.
pub const VERBOSE_ENV: &str = "DORMANT_VERBOSE";

/// Member names that hosting code probes on a handle without meaning to use
/// the resource. Such probes answer [`Value::Absent`](super::types::Value::Absent)
/// instead of activating the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeRules {
    /// Exact member names.
    pub reserved: BTreeSet<String>,
    /// Member name prefixes.
    pub prefixes: Vec<String>,
    /// A reserved name that does activate when probed from inside a running
    /// loader, so a loader can inspect handles it depends on.
    pub loader_passthrough: Option<String>,
}

impl ProbeRules {
    /// No probes at all: every member access activates.
    pub fn none() -> Self {
        ProbeRules {
            reserved: BTreeSet::new(),
            prefixes: Vec::new(),
            loader_passthrough: None,
        }
    }

    pub fn is_reserved(&self, member: &str) -> bool {
        self.reserved.contains(member)
    }

    pub fn is_passthrough(&self, member: &str) -> bool {
        self.loader_passthrough.as_deref() == Some(member)
    }

    pub fn matches_prefix(&self, member: &str) -> bool {
        self.prefixes.iter().any(|p| member.starts_with(p.as_str()))
    }
}

impl Default for ProbeRules {
    fn default() -> Self {
        ProbeRules {
            reserved: ["__meta__", "__path__"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prefixes: vec!["__probe_".to_string(), "__repr_".to_string()],
            loader_passthrough: Some("__meta__".to_string()),
        }
    }
}

/// One name to register when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub name: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub verbosity: Option<Verbosity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Verbosity for registrations that do not pass their own.
    pub verbosity: Verbosity,
    pub probes: ProbeRules,
    /// Names registered up front.
    #[serde(rename = "lazy")]
    pub entries: Vec<EntryConfig>,
}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply [`VERBOSE_ENV`] on top of this configuration, if set.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        match std::env::var(VERBOSE_ENV) {
            Ok(raw) => self.with_verbosity_override(&raw),
            Err(_) => Ok(self),
        }
    }

    fn with_verbosity_override(mut self, raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidEnv {
            var: VERBOSE_ENV,
            value: raw.to_string(),
        };
        let level: u8 = raw.trim().parse().map_err(|_| invalid())?;
        self.verbosity = Verbosity::try_from(level).map_err(|_| invalid())?;
        Ok(self)
    }
}
