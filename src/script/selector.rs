//! Choosing the setup script for an install directory and host/target
//! pair.
//!
//! Three naming conventions exist: 2017+ installs carry one script per
//! pair under `Auxiliary/Build`, the 8.0–14.0 era has a single
//! `vcvarsall.bat` taking an architecture argument, and older releases
//! keep a 32-bit-only script beside the install. Independently of the
//! main script, an installed SDK may provide its own setup script as a
//! fallback.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, VcEnvError};
use crate::script::sdk::InstalledSdk;
use crate::toolset::{releases, Arch, CompilerRelease, Layout};

/// Outcome of script selection. Either script may be absent; the caller
/// decides what that means for the candidate being tried.
#[derive(Debug)]
pub struct ScriptSelection {
    /// The release's own setup script, if present on disk.
    pub script: Option<PathBuf>,
    /// Whether the script expects an architecture argument.
    pub use_arg: bool,
    /// An SDK-provided fallback script, if one is present on disk.
    pub sdk_script: Option<PathBuf>,
}

/// Find the setup script(s) for this pair.
///
/// Fails only when the release has no script name for the pair at all;
/// a named script that is missing on disk is reported as `None` so the
/// caller can move on to the next candidate.
pub fn find_setup_script(
    install_dir: &Path,
    release: &CompilerRelease,
    host: Arch,
    target: Arch,
    sdks: &[InstalledSdk],
) -> Result<ScriptSelection> {
    let mut use_arg = true;

    // `base` is also the directory SDK scripts are resolved against.
    let (base, script) = match release.layout {
        Layout::PerToolset => {
            let Some(name) = releases::toolset_script_name(host, target) else {
                return Err(VcEnvError::UnsupportedArchPair {
                    version: release.version.to_string(),
                    host: host.to_string(),
                    target: target.to_string(),
                });
            };
            use_arg = false;
            let script = install_dir.join("Auxiliary").join("Build").join(name);
            (install_dir.to_path_buf(), script)
        }
        Layout::UnifiedBin => (install_dir.to_path_buf(), install_dir.join("vcvarsall.bat")),
        Layout::CommonTools => {
            let base = install_dir.join("..").join("Common7").join("Tools");
            let script = base.join("vsvars32.bat");
            (base, script)
        }
        Layout::Legacy => {
            let base = install_dir.join("Bin");
            let script = base.join("vcvars32.bat");
            (base, script)
        }
    };

    let script = if script.exists() {
        Some(script)
    } else {
        debug!(path = %script.display(), "setup script not on disk");
        None
    };

    let mut sdk_script = None;
    for sdk in sdks {
        let Some(rel) = sdk.vc_script_for(host, target) else {
            debug!(version = sdk.version, "SDK has no script for this pair");
            continue;
        };
        let candidate = base.join(rel);
        if candidate.exists() {
            debug!(path = %candidate.display(), "found SDK setup script");
            sdk_script = Some(candidate);
            break;
        }
    }

    Ok(ScriptSelection {
        script,
        use_arg,
        sdk_script,
    })
}
