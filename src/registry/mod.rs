//! Windows registry read primitive.
//!
//! Discovery only ever needs one operation: read a string value at a path
//! like `Software\Microsoft\VisualStudio\14.0\Setup\VC\ProductDir`, where
//! the last path component names the value. The trait seam lets tests
//! substitute an in-memory registry on any platform.

#[cfg(windows)]
mod windows;

use thiserror::Error;

/// Registry hive a compatibility-table key lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    LocalMachine,
    CurrentUser,
}

/// Failures of a single registry read. Absent and unreadable are distinct:
/// an absent key moves discovery on to the next candidate, an unreadable
/// one is surfaced as broken configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry key not found")]
    NotFound,
    #[error("registry value unreadable: {0}")]
    Unreadable(String),
}

/// Read access to the registry.
pub trait RegistryRead {
    /// Read the string value named by the last component of `path`.
    fn read_value(&self, hive: Hive, path: &str) -> Result<String, RegistryError>;
}

/// The live system registry. On non-Windows hosts every key reports
/// absent, which keeps discovery runnable (and testable) anywhere.
#[derive(Debug, Default)]
pub struct SystemRegistry;

impl RegistryRead for SystemRegistry {
    #[cfg(windows)]
    fn read_value(&self, hive: Hive, path: &str) -> Result<String, RegistryError> {
        windows::read_value(hive, path)
    }

    #[cfg(not(windows))]
    fn read_value(&self, _hive: Hive, _path: &str) -> Result<String, RegistryError> {
        Err(RegistryError::NotFound)
    }
}

/// Split a value path into (key path, value name).
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn split_value_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('\\') {
        Some((key, value)) => (key, value),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_path_splits_on_last_backslash() {
        let (key, value) = split_value_path(r"Software\Microsoft\VisualStudio\8.0\Setup\VC\ProductDir");
        assert_eq!(key, r"Software\Microsoft\VisualStudio\8.0\Setup\VC");
        assert_eq!(value, "ProductDir");
    }

    #[test]
    fn bare_value_name_maps_to_hive_root() {
        assert_eq!(split_value_path("installdir"), ("", "installdir"));
    }

    #[cfg(not(windows))]
    #[test]
    fn system_registry_reports_absent_off_windows() {
        let registry = SystemRegistry;
        assert!(matches!(
            registry.read_value(Hive::LocalMachine, r"Software\Anything"),
            Err(RegistryError::NotFound)
        ));
    }
}
