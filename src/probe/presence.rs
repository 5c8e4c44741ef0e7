//! Verifying that a located installation actually contains a compiler.
//!
//! An install directory in the registry or the vswhere catalog does not
//! guarantee the C++ toolchain was selected at install time, so every
//! candidate is checked for `cl.exe` in the layout its era uses. The
//! check never fails hard: any problem just means "not usable".

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::toolset::{releases, Arch, CompilerRelease, Layout};

pub(crate) const CL_EXE: &str = "cl.exe";

/// Name of the file holding the default toolset version in 2017+ installs.
const DEFAULT_TOOLSET_FILE: &str = "Microsoft.VCToolsVersion.default.txt";

/// Whether `vc_dir` holds a usable compiler for this host/target pair.
pub fn compiler_exists(
    vc_dir: &Path,
    release: &CompilerRelease,
    host: Arch,
    target: Arch,
) -> bool {
    match release.layout {
        Layout::PerToolset => per_toolset_cl_exists(vc_dir, host, target),
        Layout::UnifiedBin => unified_bin_cl_exists(vc_dir, host, target),
        Layout::CommonTools | Layout::Legacy => legacy_cl_exists(vc_dir),
    }
}

fn per_toolset_cl_exists(vc_dir: &Path, host: Arch, target: Arch) -> bool {
    // Multiple toolsets can coexist; only the default one is probed.
    let marker = vc_dir
        .join("Auxiliary")
        .join("Build")
        .join(DEFAULT_TOOLSET_FILE);
    let toolset = match fs::read_to_string(&marker) {
        Ok(contents) => match contents.lines().next().map(str::trim) {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => {
                debug!(path = %marker.display(), "no toolset version in marker file");
                return false;
            }
        },
        Err(err) => {
            debug!(path = %marker.display(), error = %err, "cannot read toolset marker");
            return false;
        }
    };

    let Some((host_dir, target_dir)) = releases::toolset_host_target_dirs(host, target) else {
        debug!(host = %host, target = %target, "unsupported host/target pair");
        return false;
    };

    let cl_path = |host_dir: &str| {
        vc_dir
            .join("Tools")
            .join("MSVC")
            .join(&toolset)
            .join("bin")
            .join(host_dir)
            .join(target_dir)
            .join(CL_EXE)
    };

    let path = cl_path(host_dir);
    debug!(path = %path.display(), "checking for compiler");
    if path.exists() {
        return true;
    }

    // Express installs ship only 32-bit-hosted tools even on a 64-bit
    // host, so retry under Hostx86.
    if host == Arch::Amd64 && host_dir == "Hostx64" {
        let path = cl_path("Hostx86");
        debug!(path = %path.display(), "checking for compiler");
        if path.exists() {
            return true;
        }
    }
    false
}

fn unified_bin_cl_exists(vc_dir: &Path, host: Arch, target: Arch) -> bool {
    let Some(subdir) = releases::unified_bin_subdir(host, target) else {
        debug!(host = %host, target = %target, "unsupported host/target pair");
        return false;
    };

    let path = vc_dir.join("bin").join(subdir).join(CL_EXE);
    debug!(path = %path.display(), "checking for compiler");
    if path.exists() {
        return true;
    }

    // Older releases shipped only 32-bit-hosted binaries, so a 64-bit
    // host may still have the cross tools.
    if host == Arch::Amd64 {
        let Some(subdir) = releases::unified_bin_subdir(Arch::X86, target) else {
            return false;
        };
        let path = vc_dir.join("bin").join(subdir).join(CL_EXE);
        debug!(path = %path.display(), "checking for compiler");
        return path.exists();
    }
    false
}

/// Pre-8.0 installs had no fixed binary layout, so after the likely spots
/// comes a full directory walk.
fn legacy_cl_exists(vc_dir: &Path) -> bool {
    for dir in ["bin", ""] {
        if vc_dir.join(dir).join(CL_EXE).exists() {
            return true;
        }
    }
    for entry in WalkDir::new(vc_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if entry.file_type().is_dir() && entry.path().join(CL_EXE).exists() {
            debug!(path = %entry.path().display(), "compiler found in subdirectory");
            return true;
        }
    }
    false
}
