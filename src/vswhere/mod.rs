//! Discovery of modern Visual Studio installations (2017 and later) through
//! the `vswhere` query tool.
//!
//! One query collects every installation, including prereleases and
//! non-default products; the results are ranked and grouped into an
//! [`InstanceCatalog`] so individual lookups never re-run the tool.

mod instance;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

pub use instance::{Edition, MsvcInstance, RawInstance};

use crate::environment::BuildEnv;
use crate::hostpath::{PathGroupList, ResolveOptions};

/// Query arguments. All products and prereleases are requested up front;
/// filtering happens when the catalog is consulted.
pub const VSWHERE_QUERY_ARGS: &[&str] = &[
    "-all",
    "-products",
    "*",
    "-prerelease",
    "-format",
    "json",
    "-utf8",
];

/// Well-known locations of `vswhere.exe`: the Visual Studio installer
/// directory under either Program Files root, plus the Chocolatey shim
/// directory. Callers can push their own groups in front.
pub fn default_search_groups() -> PathGroupList {
    let mut groups = PathGroupList::new();
    groups.push_back(vec![
        "%ProgramFiles(x86)%/Microsoft Visual Studio/Installer",
        "%ProgramFiles%/Microsoft Visual Studio/Installer",
        "%ChocolateyInstall%/bin",
    ]);
    groups
}

/// Locate `vswhere.exe`. A non-empty `VSWHERE` environment value wins and
/// is substituted but not validated; otherwise the highest-priority
/// existing candidate from `groups` is used.
pub fn find_vswhere(env: &BuildEnv, groups: &PathGroupList) -> Option<PathBuf> {
    let override_path = env.subst("$VSWHERE");
    if !override_path.is_empty() {
        return Some(PathBuf::from(override_path));
    }

    let options = ResolveOptions::new()
        .with_file_name("vswhere.exe")
        .first_match_only();
    groups.resolve(&options).into_iter().next()
}

/// Every known installation, grouped by `(version token, release)` and
/// ordered best-first within each group.
#[derive(Debug, Default, Clone)]
pub struct InstanceCatalog {
    by_version: HashMap<(String, bool), Vec<MsvcInstance>>,
}

impl InstanceCatalog {
    /// Parse raw vswhere JSON output. Unusable output produces an empty
    /// catalog rather than an error, matching a machine with no
    /// installations.
    pub fn from_json_output(text: &str) -> Self {
        if text.trim().is_empty() {
            debug!("vswhere produced no output");
            return Self::default();
        }
        let raw: Vec<RawInstance> = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "vswhere output is not valid JSON");
                return Self::default();
            }
        };
        Self::from_instances(raw.iter().filter_map(MsvcInstance::from_raw).collect())
    }

    pub fn from_instances(mut instances: Vec<MsvcInstance>) -> Self {
        // Newest version first, then release before prerelease, then
        // edition rank. The sort is stable, so equal keys keep the tool's
        // reporting order.
        instances.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

        let mut by_version: HashMap<(String, bool), Vec<MsvcInstance>> = HashMap::new();
        for instance in instances {
            by_version
                .entry((instance.version.clone(), instance.is_release))
                .or_default()
                .push(instance);
        }
        Self { by_version }
    }

    /// The best instance carrying `version`, restricted to release or
    /// prerelease installs.
    pub fn preferred(&self, version: &str, release: bool) -> Option<&MsvcInstance> {
        self.by_version
            .get(&(version.to_string(), release))
            .and_then(|list| list.first())
    }

    pub fn contains(&self, version: &str, release: bool) -> bool {
        self.preferred(version, release).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }
}

/// Run vswhere and build the catalog. Any failure along the way (missing
/// executable, failed run, bad output) yields an empty catalog.
pub fn load_catalog(env: &BuildEnv, groups: &PathGroupList) -> InstanceCatalog {
    load_catalog_with_exec(env, groups, run_capture)
}

/// As [`load_catalog`], with the subprocess call supplied by the caller.
pub fn load_catalog_with_exec<F>(env: &BuildEnv, groups: &PathGroupList, exec: F) -> InstanceCatalog
where
    F: Fn(&Path, &[&str]) -> io::Result<String>,
{
    let Some(vswhere) = find_vswhere(env, groups) else {
        debug!("vswhere executable not found");
        return InstanceCatalog::default();
    };

    debug!(path = %vswhere.display(), "querying vswhere");
    match exec(&vswhere, VSWHERE_QUERY_ARGS) {
        Ok(output) => InstanceCatalog::from_json_output(&output),
        Err(err) => {
            debug!(error = %err, "vswhere query failed");
            InstanceCatalog::default()
        }
    }
}

pub(crate) fn run_capture(program: &Path, args: &[&str]) -> io::Result<String> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}", program.display(), output.status),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
