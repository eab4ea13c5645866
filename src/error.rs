//! Error types shared by the registry, the resolver and the config loader.

use thiserror::Error;

/// Result alias used across the crate.
pub type LazyResult<T> = Result<T, LazyError>;

/// Failure reported by a [`Loader`](crate::lazy::loader::Loader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The loader knows nothing under this name.
    #[error("no resource named {0:?}")]
    NotFound(String),
    /// The loader found the name but could not construct it.
    #[error("failed to load {name:?}: {reason}")]
    Failed { name: String, reason: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Errors raised while reading a [`RegistryConfig`](crate::lazy::config::RegistryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("verbosity must be between 0 and 3, got {0}")]
    InvalidVerbosity(u8),
    #[error("{var} must be a verbosity between 0 and 3, got {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum LazyError {
    /// Malformed name, a relative name without an anchor, or an anchor for an
    /// absolute name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The loader failed for one segment of the family chain.
    #[error("no resource named {name:?}")]
    ResourceNotFound {
        name: String,
        #[source]
        source: LoadError,
    },

    /// Registration metadata that cannot apply to an already resolved entry.
    #[error("conflicting registration for {name:?}: {reason}")]
    Conflict { name: String, reason: String },

    /// The name has no registry entry at all.
    #[error("{0:?} is not registered")]
    NotFound(String),

    #[error("{resource:?} has no member {member:?}")]
    MissingMember { resource: String, member: String },

    #[error("{0:?} is not callable")]
    NotCallable(String),

    /// The loader for a name touched that name's own placeholder.
    #[error("{0:?} was accessed while its own loader was running")]
    CircularActivation(String),

    /// The handle outlived the registry it was issued by.
    #[error("the registry that issued {0:?} has been dropped")]
    Detached(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LazyError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        LazyError::InvalidArgument(msg.into())
    }
}
