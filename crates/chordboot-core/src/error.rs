//! Error type shared by the chordboot library crates.

use thiserror::Error;

/// Failures surfaced by configuration loading and system collaborators.
///
/// Problems inside the line-oriented boot catalog files are never reported
/// here; those lines are dropped while loading.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Provider(String),
}

pub type BootResult<T> = Result<T, BootError>;

impl BootError {
    /// Wrap a collaborator failure, keeping only its message.
    pub fn provider(err: impl std::fmt::Display) -> Self {
        BootError::Provider(err.to_string())
    }
}
