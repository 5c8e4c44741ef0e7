//! The discovery service tying registry probing, vswhere, and setup
//! scripts together.
//!
//! [`MsvcLocator`] owns everything that is expensive or stateful about
//! discovery: the registry handle, the vswhere instance catalog, the
//! installed-version survey, the known SDKs, and the setup-script result
//! cache. All of it is computed lazily and memoized for the lifetime of
//! the locator; [`reset`](MsvcLocator::reset) drops the memos when the
//! machine state may have changed.

mod setup;

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::environment::{parse_bool, BuildEnv};
use crate::error::{Result, VcEnvError};
use crate::hostpath::{PathGroupList, PathSpec};
use crate::probe::{self, presence};
use crate::registry::{RegistryRead, SystemRegistry};
use crate::script::{self, runner, InstalledSdk, ScriptCache, ScriptRunner};
use crate::toolset::releases::{CompilerRelease, RELEASES};
use crate::toolset::{host_target, Arch};
use crate::vswhere::{self, InstanceCatalog};

type ScriptExec = Box<dyn Fn(&Path, &str) -> io::Result<String>>;
type VswhereExec = Box<dyn Fn(&Path, &[&str]) -> io::Result<String>>;

/// Versions found on this machine, split by release channel. Both lists
/// preserve the compatibility-table order, newest first.
#[derive(Debug, Clone, Default)]
pub(crate) struct InstalledSets {
    pub(crate) release: Vec<&'static str>,
    pub(crate) prerelease: Vec<&'static str>,
}

/// Discovery and environment-setup service.
pub struct MsvcLocator {
    registry: Box<dyn RegistryRead>,
    vswhere_paths: PathGroupList,
    script_exec: ScriptExec,
    vswhere_exec: VswhereExec,
    runner: ScriptRunner,
    cache: ScriptCache,
    catalog: Option<InstanceCatalog>,
    installed: Option<InstalledSets>,
    sdks: Option<Vec<InstalledSdk>>,
}

impl MsvcLocator {
    /// A locator backed by the system registry and real subprocesses.
    ///
    /// If the `MSVC_SCRIPT_CACHE` process variable names a file, setup
    /// script results are persisted there across processes.
    pub fn new() -> Self {
        let cache_file = std::env::var_os("MSVC_SCRIPT_CACHE")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        MsvcLocator {
            registry: Box::new(SystemRegistry),
            vswhere_paths: vswhere::default_search_groups(),
            script_exec: Box::new(runner::run_script_capture),
            vswhere_exec: Box::new(vswhere::run_capture),
            runner: ScriptRunner::new(),
            cache: ScriptCache::new(cache_file),
            catalog: None,
            installed: None,
            sdks: None,
        }
    }

    /// Replace the registry backend.
    pub fn with_registry(mut self, registry: Box<dyn RegistryRead>) -> Self {
        self.registry = registry;
        self
    }

    /// Persist setup-script results in `path`, overriding any
    /// `MSVC_SCRIPT_CACHE` setting.
    pub fn script_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = ScriptCache::new(Some(path.into()));
        self
    }

    /// Replace the subprocess call used to run setup scripts.
    pub fn with_script_exec<F>(mut self, exec: F) -> Self
    where
        F: Fn(&Path, &str) -> io::Result<String> + 'static,
    {
        self.script_exec = Box::new(exec);
        self
    }

    /// Replace the subprocess call used to query vswhere.
    pub fn with_vswhere_exec<F>(mut self, exec: F) -> Self
    where
        F: Fn(&Path, &[&str]) -> io::Result<String> + 'static,
    {
        self.vswhere_exec = Box::new(exec);
        self
    }

    /// Register an extra directory (or group of directories) to search
    /// for vswhere, ahead of the defaults.
    pub fn add_vswhere_search_path(&mut self, spec: impl Into<PathSpec>) {
        self.vswhere_paths.push_front(spec);
        self.catalog = None;
        self.installed = None;
    }

    /// Forget everything memoized about the machine.
    pub fn reset(&mut self) {
        self.catalog = None;
        self.installed = None;
        self.sdks = None;
    }

    /// Version tokens with a usable compiler on this machine, newest
    /// first. Prerelease installs are included only when `MSVC_PREVIEW`
    /// is set true-like in `env`.
    ///
    /// An unrecognized `HOST_ARCH` or `TARGET_ARCH` fails the whole
    /// survey; a version that is merely broken on disk is skipped.
    pub fn installed_versions(&mut self, env: &BuildEnv) -> Result<Vec<&'static str>> {
        let sets = self.installed_sets(env)?;
        if !preview_requested(env) {
            return Ok(sets.release);
        }
        let merged = RELEASES
            .iter()
            .map(|release| release.version)
            .filter(|version| {
                sets.release.contains(version) || sets.prerelease.contains(version)
            })
            .collect();
        Ok(merged)
    }

    /// The version `setup_env` would use, or `None` when nothing is
    /// requested and nothing is installed.
    ///
    /// `MSVS_VERSION` is honored for backward compatibility and wins over
    /// `MSVC_VERSION` when both are set, with a warning either way.
    pub fn pick_version(&mut self, env: &BuildEnv) -> Result<Option<String>> {
        let msvc = env
            .get("MSVC_VERSION")
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let msvs = env
            .get("MSVS_VERSION")
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        match (msvc, msvs) {
            (None, Some(msvs)) => {
                warn!("MSVS_VERSION is deprecated, use MSVC_VERSION instead");
                Ok(Some(msvs))
            }
            (Some(msvc), Some(msvs)) => {
                if msvc != msvs {
                    warn!(
                        msvc_version = %msvc,
                        msvs_version = %msvs,
                        "MSVC_VERSION and MSVS_VERSION do not match, using the deprecated MSVS_VERSION"
                    );
                }
                Ok(Some(msvs))
            }
            (Some(msvc), None) => Ok(Some(msvc)),
            (None, None) => {
                let installed = self.installed_versions(env)?;
                match installed.first() {
                    Some(version) => {
                        debug!(version = %version, "defaulting to the newest installed version");
                        Ok(Some((*version).to_string()))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Whether a usable compiler is installed: any at all, or a specific
    /// version when one is given.
    pub fn exists(&mut self, env: &BuildEnv, version: Option<&str>) -> Result<bool> {
        let installed = self.installed_versions(env)?;
        Ok(match version {
            Some(version) => installed.iter().any(|v| *v == version),
            None => !installed.is_empty(),
        })
    }

    fn installed_sets(&mut self, env: &BuildEnv) -> Result<InstalledSets> {
        if let Some(sets) = &self.installed {
            return Ok(sets.clone());
        }
        let (host, target, _) = host_target(env)?;
        self.ensure_catalog(env);
        let catalog = self.catalog.get_or_insert_with(InstanceCatalog::default);
        let sets = discover_installed(self.registry.as_ref(), catalog, host, target)?;
        debug!(release = ?sets.release, prerelease = ?sets.prerelease, "installed MSVC versions");
        self.installed = Some(sets.clone());
        Ok(sets)
    }

    fn ensure_catalog(&mut self, env: &BuildEnv) {
        if self.catalog.is_none() {
            let catalog =
                vswhere::load_catalog_with_exec(env, &self.vswhere_paths, &*self.vswhere_exec);
            self.catalog = Some(catalog);
        }
    }

    fn sdks(&mut self) -> Vec<InstalledSdk> {
        if self.sdks.is_none() {
            self.sdks = Some(script::installed_sdks(self.registry.as_ref()));
        }
        self.sdks.clone().unwrap_or_default()
    }
}

impl Default for MsvcLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_installed(
    registry: &dyn RegistryRead,
    catalog: &InstanceCatalog,
    host: Arch,
    target: Arch,
) -> Result<InstalledSets> {
    let mut sets = InstalledSets::default();
    for release in RELEASES {
        if probe_installed(registry, catalog, release, host, target, true)? {
            sets.release.push(release.version);
        }
        if release.uses_vswhere()
            && probe_installed(registry, catalog, release, host, target, false)?
        {
            sets.prerelease.push(release.version);
        }
    }
    Ok(sets)
}

fn probe_installed(
    registry: &dyn RegistryRead,
    catalog: &InstanceCatalog,
    release: &CompilerRelease,
    host: Arch,
    target: Arch,
    released: bool,
) -> Result<bool> {
    let dir = match probe::find_install_dir(registry, catalog, release.version, released) {
        Ok(Some(dir)) => dir,
        Ok(None) => return Ok(false),
        Err(err) if discovery_can_skip(&err) => {
            debug!(version = release.version, error = %err, "skipping version during survey");
            return Ok(false);
        }
        Err(err) => return Err(err),
    };
    if !presence::compiler_exists(&dir, release, host, target) {
        debug!(
            version = release.version,
            dir = %dir.display(),
            "install directory present but no usable compiler"
        );
        return Ok(false);
    }
    Ok(true)
}

/// Broken per-version state is survivable during the survey; a bad
/// version token or architecture aborts it.
fn discovery_can_skip(err: &VcEnvError) -> bool {
    !matches!(
        err,
        VcEnvError::UnsupportedVersion { .. }
            | VcEnvError::UnsupportedHostArch { .. }
            | VcEnvError::UnsupportedTargetArch { .. }
    )
}

fn preview_requested(env: &BuildEnv) -> bool {
    env.get("MSVC_PREVIEW").and_then(parse_bool) == Some(true)
}

fn uwp_requested(env: &BuildEnv) -> bool {
    env.get("MSVC_UWP_APP").and_then(parse_bool) == Some(true)
}
