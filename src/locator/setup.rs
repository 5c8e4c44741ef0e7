//! Applying a located toolchain to a [`BuildEnv`].
//!
//! Setup tries host/target candidates in a fixed order: the resolved pair
//! first, then the 32-bit-hosted cross tools for the same target, since
//! many installs (Express editions in particular) ship only those. The
//! first candidate whose setup script runs cleanly wins; its captured
//! variables are prepended onto the environment.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::environment::{parse_bool, BuildEnv, PATH_LIST_SEPARATOR};
use crate::error::{Result, VcEnvError};
use crate::probe::{self, presence};
use crate::script::{self, find_setup_script, EnvironmentBindings};
use crate::toolset::releases;
use crate::toolset::{host_target, Arch, MsvcVersion};

use super::{preview_requested, uwp_requested, MsvcLocator};

impl MsvcLocator {
    /// Set up `env` for the picked (or requested) MSVC version.
    ///
    /// Returns `Ok(true)` when a setup script ran and its variables were
    /// merged into `env`. `Ok(false)` means setup was skipped without a
    /// usable toolchain: nothing is installed, `MSVC_USE_SCRIPT` is
    /// disabled, or every candidate pair failed. `MSVC_VERSION` and
    /// `MSVS_VERSION` are recorded in `env` whenever a version was picked,
    /// even on the skipped paths.
    pub fn setup_env(&mut self, env: &mut BuildEnv) -> Result<bool> {
        let Some(version) = self.pick_version(env)? else {
            warn!("no MSVC compiler found, C/C++ compilers will most likely not be set");
            return Ok(false);
        };
        debug!(version = %version, "setting up MSVC environment");

        env.set("MSVC_VERSION", version.clone());
        env.set("MSVS_VERSION", version.clone());

        let use_script = env.get("MSVC_USE_SCRIPT").map(str::to_string);
        let bindings = match use_script.as_deref().map(parse_bool) {
            Some(Some(false)) => {
                warn!("MSVC_USE_SCRIPT is disabled, assuming the environment is already set");
                return Ok(false);
            }
            // A non-boolean value names a script to run as-is.
            Some(None) => {
                Some(self.run_explicit_script(env, use_script.as_deref().unwrap_or_default())?)
            }
            _ => self.run_script_ladder(env, &version)?,
        };

        let Some(bindings) = bindings else {
            return Ok(false);
        };

        for (name, value) in &bindings {
            env.prepend_path(name, value, true);
        }

        if !cl_on_path(env) {
            match self.cache.file() {
                Some(file) => warn!(
                    cache = %file.display(),
                    "could not find cl.exe on the resulting PATH, remove the script cache file if it is out of date"
                ),
                None => warn!(
                    "could not find cl.exe on the resulting PATH, it may need to be installed separately with Visual Studio"
                ),
            }
        }
        Ok(true)
    }

    /// As [`setup_env`](Self::setup_env), but only the first call per
    /// environment does anything: `MSVC_SETUP_RUN` marks `env` as done.
    pub fn setup_env_once(&mut self, env: &mut BuildEnv) -> Result<bool> {
        let has_run = env
            .get("MSVC_SETUP_RUN")
            .and_then(parse_bool)
            .unwrap_or(false);
        if has_run {
            return Ok(false);
        }
        let outcome = self.setup_env(env)?;
        env.set("MSVC_SETUP_RUN", "1");
        Ok(outcome)
    }

    fn run_explicit_script(&mut self, env: &BuildEnv, raw: &str) -> Result<EnvironmentBindings> {
        let script = PathBuf::from(raw.trim());
        if !script.exists() {
            return Err(VcEnvError::ScriptNotFound { path: script });
        }
        let args = env.subst("$MSVC_USE_SCRIPT_ARGS");
        debug!(script = %script.display(), args = %args, "using explicitly configured setup script");
        self.cached_script_env(&script, &args)
    }

    fn run_script_ladder(
        &mut self,
        env: &mut BuildEnv,
        version: &str,
    ) -> Result<Option<EnvironmentBindings>> {
        let (host, target, requested) = host_target(env)?;

        let Some(release) = releases::find(version) else {
            let err = VcEnvError::UnsupportedVersion {
                version: version.to_string(),
            };
            self.warn_not_installed(env, version, &err)?;
            restore_target_arch(env, requested.as_deref());
            return Ok(None);
        };
        let parsed = MsvcVersion::parse(version)?;
        let uwp = parsed.major() >= 14 && uwp_requested(env);

        let sdks = self.sdks();
        let mut found = None;

        for (cand_host, cand_target) in ladder(host, target, requested.as_deref()) {
            env.set("TARGET_ARCH", cand_target.as_str());
            debug!(host = %cand_host, target = %cand_target, "trying host/target pair");

            if !release.supports_target(cand_target) {
                warn!(
                    version,
                    host = %cand_host,
                    target = %cand_target,
                    "host/target pair is not supported by this MSVC version"
                );
            }

            let install_dir = match self.locate_for_setup(env, version) {
                Ok(Some(dir)) => dir,
                Ok(None) => {
                    let err = VcEnvError::NoVersionFound {
                        message: "no Visual Studio installation found".to_string(),
                    };
                    self.warn_not_installed(env, version, &err)?;
                    continue;
                }
                Err(err) if selection_can_skip(&err) => {
                    self.warn_not_installed(env, version, &err)?;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let selection =
                match find_setup_script(&install_dir, release, cand_host, cand_target, &sdks) {
                    Ok(selection) => selection,
                    Err(err) if selection_can_skip(&err) => {
                        self.warn_not_installed(env, version, &err)?;
                        continue;
                    }
                    Err(err) => return Err(err),
                };

            let arg = match script_arg(selection.use_arg, cand_host, cand_target, uwp) {
                Some(arg) => arg,
                None => {
                    let err = VcEnvError::UnsupportedArchPair {
                        version: version.to_string(),
                        host: cand_host.to_string(),
                        target: cand_target.to_string(),
                    };
                    self.warn_not_installed(env, version, &err)?;
                    continue;
                }
            };

            if let Some(script) = &selection.script {
                match self.cached_script_env(script, &arg) {
                    Ok(bindings) => {
                        debug!(script = %script.display(), args = %arg, "setup script succeeded");
                        found = Some(bindings);
                        break;
                    }
                    Err(VcEnvError::ScriptFailed { script, message }) => {
                        debug!(
                            script = %script.display(),
                            message = %message,
                            "setup script reported failure"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }

            // The SDK script is the fallback when the release's own script
            // is missing or just failed.
            if let Some(sdk_script) = &selection.sdk_script {
                match self.cached_script_env(sdk_script, "") {
                    Ok(bindings) => {
                        debug!(script = %sdk_script.display(), "SDK setup script succeeded");
                        found = Some(bindings);
                        break;
                    }
                    Err(VcEnvError::ScriptFailed { script, message }) => {
                        debug!(
                            script = %script.display(),
                            message = %message,
                            "SDK setup script reported failure"
                        );
                    }
                    Err(err) => return Err(err),
                }
            } else if selection.script.is_none() {
                debug!("no setup script and no SDK script for this pair");
            }
        }

        if found.is_none() {
            restore_target_arch(env, requested.as_deref());
        }
        Ok(found)
    }

    /// Install directory for setup, honoring the preview flag: prerelease
    /// instances are preferred when requested, with release fallback.
    fn locate_for_setup(&mut self, env: &BuildEnv, version: &str) -> Result<Option<PathBuf>> {
        self.ensure_catalog(env);
        let catalog = self
            .catalog
            .get_or_insert_with(crate::vswhere::InstanceCatalog::default);
        if preview_requested(env) {
            if let Some(dir) =
                probe::find_install_dir(self.registry.as_ref(), catalog, version, false)?
            {
                return Ok(Some(dir));
            }
        }
        probe::find_install_dir(self.registry.as_ref(), catalog, version, true)
    }

    fn cached_script_env(&mut self, script: &Path, args: &str) -> Result<EnvironmentBindings> {
        script::script_env(&mut self.cache, &self.runner, script, args, &*self.script_exec)
    }

    fn warn_not_installed(&mut self, env: &BuildEnv, version: &str, err: &VcEnvError) -> Result<()> {
        let installed = self.installed_versions(env)?;
        warn!(
            version,
            error = %err,
            installed = %installed.join(", "),
            "MSVC version not installed, C/C++ compilers are most likely not set correctly"
        );
        Ok(())
    }
}

/// Host/target candidates in the order they are tried.
///
/// An explicitly requested target adds its 32-bit-hosted cross pair. A
/// defaulted 64-bit target also falls back to plain 32-bit tools.
fn ladder(host: Arch, target: Arch, requested: Option<&str>) -> Vec<(Arch, Arch)> {
    let mut candidates = vec![(host, target)];
    match requested {
        Some("amd64") | Some("x86_64") => candidates.push((Arch::X86, Arch::Amd64)),
        Some("x86") => candidates.push((Arch::X86, Arch::X86)),
        Some("arm") => candidates.push((Arch::X86, Arch::Arm)),
        Some("arm64") => candidates.push((Arch::X86, Arch::Arm64)),
        Some(_) => {}
        None => {
            if target == Arch::Amd64 {
                candidates.push((Arch::X86, Arch::Amd64));
                candidates.push((host, Arch::X86));
            }
        }
    }
    candidates
}

/// Argument string for the setup script, or `None` when the pair has no
/// `vcvarsall.bat` spelling at all.
fn script_arg(use_arg: bool, host: Arch, target: Arch, uwp: bool) -> Option<String> {
    let mut arg = if use_arg {
        releases::vcvarsall_arg(host, target)?.to_string()
    } else {
        String::new()
    };
    if uwp {
        arg = format!("{arg} store").trim_start().to_string();
    }
    Some(arg)
}

/// Candidate-level problems keep the ladder going; anything else aborts.
fn selection_can_skip(err: &VcEnvError) -> bool {
    matches!(
        err,
        VcEnvError::UnsupportedVersion { .. }
            | VcEnvError::UnsupportedArchPair { .. }
            | VcEnvError::MissingConfiguration { .. }
            | VcEnvError::NoVersionFound { .. }
    )
}

fn restore_target_arch(env: &mut BuildEnv, requested: Option<&str>) {
    match requested {
        Some(raw) => env.set("TARGET_ARCH", raw),
        None => env.unset("TARGET_ARCH"),
    }
}

fn cl_on_path(env: &BuildEnv) -> bool {
    let Some(path) = env.get("PATH") else {
        return false;
    };
    path.split(PATH_LIST_SEPARATOR)
        .filter(|dir| !dir.is_empty())
        .any(|dir| Path::new(dir).join(presence::CL_EXE).is_file())
}
