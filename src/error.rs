//! Error handling module for gametui
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Plan-invalidating conditions (unknown distro, unknown component key) are
//! errors; execution-time step failures are recorded in the execution report
//! instead, and an already-configured mount is an outcome, not an error.

use thiserror::Error;

/// Main error type for gametui
#[derive(Error, Debug)]
pub enum GameTuiError {
    /// IO errors (file operations, spawning commands, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The host distro has no package table; nothing can be planned
    #[error("Unsupported distribution: {0}")]
    UnsupportedDistro(String),

    /// A selection referenced a component key not present in the catalog
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mount provisioning errors (directory, ownership, fstab, mount)
    #[error("Mount provisioning failed: {0}")]
    MountProvision(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for gametui operations
pub type Result<T> = std::result::Result<T, GameTuiError>;

// Convenient error constructors
impl GameTuiError {
    /// Create an unsupported-distro error
    pub fn unsupported_distro(msg: impl Into<String>) -> Self {
        Self::UnsupportedDistro(msg.into())
    }

    /// Create an unknown-component error
    pub fn unknown_component(msg: impl Into<String>) -> Self {
        Self::UnknownComponent(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a mount provisioning error
    pub fn mount(msg: impl Into<String>) -> Self {
        Self::MountProvision(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GameTuiError::unsupported_distro("gentoo");
        assert_eq!(err.to_string(), "Unsupported distribution: gentoo");

        let err = GameTuiError::unknown_component("quake");
        assert_eq!(err.to_string(), "Unknown component: quake");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GameTuiError = io_err.into();
        assert!(matches!(err, GameTuiError::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        let err = GameTuiError::mount("mkdir failed");
        assert!(matches!(err, GameTuiError::MountProvision(_)));

        let err = GameTuiError::config("bad selection file");
        assert!(matches!(err, GameTuiError::Config(_)));
    }
}
