//! Locating the product directory of an installed compiler release.
//!
//! Modern releases (14.1+) come from the vswhere catalog; everything older
//! is registered under per-version registry keys. On 64-bit hosts the
//! WOW64 view is probed first, because 32-bit installers write there.

pub mod presence;

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Result, VcEnvError};
use crate::registry::{Hive, RegistryError, RegistryRead};
use crate::toolset::{native_is_64bit, releases};
use crate::vswhere::InstanceCatalog;

/// Find the product directory for `version`, or `None` when the release is
/// simply not installed.
///
/// A registry value that names a directory no longer on disk is broken
/// configuration and fails with [`VcEnvError::MissingConfiguration`]
/// instead of being skipped.
pub fn find_install_dir(
    registry: &dyn RegistryRead,
    catalog: &InstanceCatalog,
    version: &str,
    release: bool,
) -> Result<Option<PathBuf>> {
    find_install_dir_as(registry, catalog, version, release, native_is_64bit())
}

/// As [`find_install_dir`], with the host bitness supplied by the caller.
pub(crate) fn find_install_dir_as(
    registry: &dyn RegistryRead,
    catalog: &InstanceCatalog,
    version: &str,
    release: bool,
    win64: bool,
) -> Result<Option<PathBuf>> {
    let Some(entry) = releases::find(version) else {
        debug!(version, "unknown MSVC version");
        return Err(VcEnvError::UnsupportedVersion {
            version: version.to_string(),
        });
    };

    if entry.uses_vswhere() {
        let found = catalog.preferred(version, release).map(|i| i.vc_dir.clone());
        if found.is_none() {
            debug!(version, release, "no vswhere instance for version");
        }
        return Ok(found);
    }

    for (hive, key) in entry.hkeys {
        let Some(dir) = read_product_dir(registry, *hive, key, win64) else {
            continue;
        };
        debug!(version, dir = %dir, "found product directory in registry");
        let dir = PathBuf::from(dir);
        if dir.exists() {
            return Ok(Some(dir));
        }
        debug!(path = %dir.display(), "registered directory is not on disk");
        return Err(VcEnvError::MissingConfiguration { path: dir });
    }
    Ok(None)
}

/// Read one product-directory value, preferring the WOW64 view on 64-bit
/// hosts. Absent keys return `None`; unreadable ones are logged and
/// treated the same, so discovery moves on to the next candidate.
fn read_product_dir(
    registry: &dyn RegistryRead,
    hive: Hive,
    key: &str,
    win64: bool,
) -> Option<String> {
    if win64 {
        match registry.read_value(hive, &format!(r"Software\Wow6432Node\{key}")) {
            Ok(value) => return Some(value),
            // Some products (VC for Python) write outside the WOW64 view.
            Err(RegistryError::NotFound) => {}
            Err(RegistryError::Unreadable(err)) => {
                debug!(key, error = %err, "WOW64 registry view unreadable")
            }
        }
    }

    match registry.read_value(hive, &format!(r"Software\{key}")) {
        Ok(value) => Some(value),
        Err(RegistryError::NotFound) => {
            debug!(key, "registry key absent");
            None
        }
        Err(RegistryError::Unreadable(err)) => {
            warn!(key, error = %err, "registry key unreadable");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// In-memory registry keyed by full value paths.
    #[derive(Default)]
    pub(crate) struct FakeRegistry {
        values: HashMap<(Hive, String), String>,
        unreadable: Vec<(Hive, String)>,
    }

    impl FakeRegistry {
        pub(crate) fn insert(&mut self, hive: Hive, path: &str, value: impl Into<String>) {
            self.values.insert((hive, path.to_string()), value.into());
        }

        pub(crate) fn poison(&mut self, hive: Hive, path: &str) {
            self.unreadable.push((hive, path.to_string()));
        }
    }

    impl RegistryRead for FakeRegistry {
        fn read_value(&self, hive: Hive, path: &str) -> std::result::Result<String, RegistryError> {
            if self.unreadable.contains(&(hive, path.to_string())) {
                return Err(RegistryError::Unreadable("access denied".to_string()));
            }
            self.values
                .get(&(hive, path.to_string()))
                .cloned()
                .ok_or(RegistryError::NotFound)
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let registry = FakeRegistry::default();
        let err = find_install_dir_as(&registry, &InstanceCatalog::default(), "5.5", true, true)
            .unwrap_err();
        assert!(matches!(err, VcEnvError::UnsupportedVersion { .. }));
    }

    #[test]
    fn wow64_view_wins_on_64bit_hosts() {
        let dir = TempDir::new().unwrap();
        let wow = dir.path().join("wow");
        let plain = dir.path().join("plain");
        fs::create_dir_all(&wow).unwrap();
        fs::create_dir_all(&plain).unwrap();

        let mut registry = FakeRegistry::default();
        registry.insert(
            Hive::LocalMachine,
            r"Software\Wow6432Node\Microsoft\VisualStudio\10.0\Setup\VC\ProductDir",
            wow.to_string_lossy(),
        );
        registry.insert(
            Hive::LocalMachine,
            r"Software\Microsoft\VisualStudio\10.0\Setup\VC\ProductDir",
            plain.to_string_lossy(),
        );

        let catalog = InstanceCatalog::default();
        let found = find_install_dir_as(&registry, &catalog, "10.0", true, true).unwrap();
        assert_eq!(found, Some(wow));

        let found = find_install_dir_as(&registry, &catalog, "10.0", true, false).unwrap();
        assert_eq!(found, Some(plain));
    }

    #[test]
    fn missing_wow64_key_falls_back_to_plain_view() {
        let dir = TempDir::new().unwrap();
        let mut registry = FakeRegistry::default();
        registry.insert(
            Hive::CurrentUser,
            r"Software\Microsoft\DevDiv\VCForPython\9.0\installdir",
            dir.path().to_string_lossy(),
        );

        let found =
            find_install_dir_as(&registry, &InstanceCatalog::default(), "9.0", true, true).unwrap();
        assert_eq!(found, Some(dir.path().to_path_buf()));
    }

    #[test]
    fn absent_keys_mean_not_installed() {
        let registry = FakeRegistry::default();
        let found =
            find_install_dir_as(&registry, &InstanceCatalog::default(), "12.0", true, true)
                .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn stale_registry_entry_is_broken_configuration() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("uninstalled");

        let mut registry = FakeRegistry::default();
        registry.insert(
            Hive::LocalMachine,
            r"Software\Microsoft\VisualStudio\11.0\Setup\VC\ProductDir",
            gone.to_string_lossy(),
        );

        let err = find_install_dir_as(&registry, &InstanceCatalog::default(), "11.0", true, false)
            .unwrap_err();
        match err {
            VcEnvError::MissingConfiguration { path } => assert_eq!(path, gone),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreadable_key_skips_to_the_next_candidate() {
        let dir = TempDir::new().unwrap();
        let mut registry = FakeRegistry::default();
        registry.poison(
            Hive::CurrentUser,
            r"Software\Microsoft\DevDiv\VCForPython\9.0\installdir",
        );
        registry.insert(
            Hive::LocalMachine,
            r"Software\Microsoft\VisualStudio\9.0\Setup\VC\ProductDir",
            dir.path().to_string_lossy(),
        );

        let found =
            find_install_dir_as(&registry, &InstanceCatalog::default(), "9.0", true, false)
                .unwrap();
        assert_eq!(found, Some(dir.path().to_path_buf()));
    }

    #[test]
    fn vswhere_era_versions_come_from_the_catalog() {
        use crate::vswhere::{Edition, MsvcInstance};

        let registry = FakeRegistry::default();
        let catalog = InstanceCatalog::from_instances(vec![MsvcInstance {
            vc_dir: PathBuf::from("/vs/2022/VC"),
            version: "14.3".to_string(),
            numeric: (14, 3),
            is_release: true,
            edition: Edition::Community,
        }]);

        let found = find_install_dir_as(&registry, &catalog, "14.3", true, true).unwrap();
        assert_eq!(found, Some(PathBuf::from("/vs/2022/VC")));

        let none = find_install_dir_as(&registry, &catalog, "14.3", false, true).unwrap();
        assert_eq!(none, None);

        let none = find_install_dir_as(&registry, &catalog, "14.2", true, true).unwrap();
        assert_eq!(none, None);
    }
}
