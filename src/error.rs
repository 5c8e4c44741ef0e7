//! Error types for vcenv operations.
//!
//! This module defines [`VcEnvError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `VcEnvError` for discovery failures that need distinct handling
//!   (an unsupported version aborts a lookup; a failed setup script only
//!   abandons one candidate in the search)
//! - Use `anyhow::Error` (via `VcEnvError::Other`) for unexpected errors
//! - All errors should name the version, architecture, or path involved

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vcenv operations.
#[derive(Debug, Error)]
pub enum VcEnvError {
    /// Requested version is not in the compatibility table.
    #[error("Unsupported MSVC version: {version}")]
    UnsupportedVersion { version: String },

    /// Host architecture string could not be normalized.
    #[error("Unrecognized host architecture: {arch}")]
    UnsupportedHostArch { arch: String },

    /// Target architecture string could not be normalized.
    #[error("Unrecognized target architecture: {arch} (valid: {valid})")]
    UnsupportedTargetArch { arch: String, valid: String },

    /// No setup script name exists for this host/target pair.
    #[error("MSVC {version} has no setup script for host {host} targeting {target}")]
    UnsupportedArchPair {
        version: String,
        host: String,
        target: String,
    },

    /// Registry or filesystem state is present but inconsistent.
    #[error("Configured directory does not exist: {path}")]
    MissingConfiguration { path: PathBuf },

    /// No usable installation was located.
    #[error("No MSVC installation found: {message}")]
    NoVersionFound { message: String },

    /// A setup script ran but self-reported failure on stdout.
    #[error("Setup script {script} reported failure: {message}")]
    ScriptFailed { script: PathBuf, message: String },

    /// An explicitly configured setup script does not exist.
    #[error("Setup script not found: {path}")]
    ScriptNotFound { path: PathBuf },

    /// Malformed path-group entries, aggregated across the whole input.
    #[error("Invalid path group entries ({}): {}", .errors.len(), .errors.join("; "))]
    InvalidPathEntries { errors: Vec<String> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for vcenv operations.
pub type Result<T> = std::result::Result<T, VcEnvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_version_displays_version() {
        let err = VcEnvError::UnsupportedVersion {
            version: "99.9".into(),
        };
        assert!(err.to_string().contains("99.9"));
    }

    #[test]
    fn unsupported_target_arch_displays_arch_and_valid_set() {
        let err = VcEnvError::UnsupportedTargetArch {
            arch: "sparc".into(),
            valid: "x86, amd64".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sparc"));
        assert!(msg.contains("amd64"));
    }

    #[test]
    fn unsupported_arch_pair_displays_all_parts() {
        let err = VcEnvError::UnsupportedArchPair {
            version: "14.0".into(),
            host: "arm64".into(),
            target: "ia64".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("14.0"));
        assert!(msg.contains("arm64"));
        assert!(msg.contains("ia64"));
    }

    #[test]
    fn missing_configuration_displays_path() {
        let err = VcEnvError::MissingConfiguration {
            path: PathBuf::from("C:/stale/vc"),
        };
        assert!(err.to_string().contains("C:/stale/vc"));
    }

    #[test]
    fn script_failed_displays_script_and_message() {
        let err = VcEnvError::ScriptFailed {
            script: PathBuf::from("vcvarsall.bat"),
            message: "The specified configuration type is missing.".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("vcvarsall.bat"));
        assert!(msg.contains("configuration type is missing"));
    }

    #[test]
    fn script_not_found_displays_path() {
        let err = VcEnvError::ScriptNotFound {
            path: PathBuf::from("C:/missing/setup.bat"),
        };
        assert!(err.to_string().contains("C:/missing/setup.bat"));
    }

    #[test]
    fn invalid_path_entries_aggregates_every_offense() {
        let err = VcEnvError::InvalidPathEntries {
            errors: vec![
                "entry 1: expected string, found number".into(),
                "entry 3: expected string, found object".into(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("(2)"));
        assert!(msg.contains("entry 1"));
        assert!(msg.contains("entry 3"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: VcEnvError = io_err.into();
        assert!(matches!(err, VcEnvError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(VcEnvError::NoVersionFound {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
