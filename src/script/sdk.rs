//! Windows SDK releases that ship their own compiler-setup scripts.
//!
//! Standalone SDKs (notably 7.0/7.1) install a C++ toolchain without
//! Visual Studio, so their scripts serve as a fallback when the main
//! setup script is unusable. Discovery is registry-plus-sanity-file; an
//! entry whose directory or sanity file is gone is simply not installed.

use std::path::PathBuf;

use tracing::debug;

use crate::registry::{Hive, RegistryRead};
use crate::toolset::Arch;

/// Where the per-pair scripts live relative to the install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStyle {
    /// Everything directly under `bin/` (SDKs before 8.0).
    Flat,
    /// Cross-target scripts nested in `bin/<pair>/` (8.0 and later).
    Nested,
}

/// One known SDK release.
#[derive(Debug)]
pub struct SdkRelease {
    pub version: &'static str,
    /// Full registry path of the installation-folder value.
    value_path: &'static str,
    /// File that must exist under the install for it to count.
    sanity_file: &'static str,
    style: ScriptStyle,
}

/// Known SDK releases, newest first.
pub const SDK_RELEASES: &[SdkRelease] = &[
    SdkRelease {
        version: "10.0A",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v10.0A\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Nested,
    },
    SdkRelease {
        version: "10.0",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v10.0\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Nested,
    },
    SdkRelease {
        version: "8.1",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v8.1\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Nested,
    },
    SdkRelease {
        version: "7.1",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v7.1\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Flat,
    },
    SdkRelease {
        version: "7.0A",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v7.0A\InstallationFolder",
        sanity_file: "include/windows.h",
        style: ScriptStyle::Flat,
    },
    SdkRelease {
        version: "7.0",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v7.0\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Flat,
    },
    SdkRelease {
        version: "6.1",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v6.1\InstallationFolder",
        sanity_file: "bin/SetEnv.Cmd",
        style: ScriptStyle::Flat,
    },
    SdkRelease {
        version: "6.0A",
        value_path: r"Software\Microsoft\Microsoft SDKs\Windows\v6.0A\InstallationFolder",
        sanity_file: "include/windows.h",
        style: ScriptStyle::Flat,
    },
];

/// An SDK found on this machine.
#[derive(Debug, Clone)]
pub struct InstalledSdk {
    pub version: &'static str,
    pub root: PathBuf,
    pub(crate) style: ScriptStyle,
}

impl InstalledSdk {
    /// Relative path of the compiler-setup script for a host/target pair,
    /// if this SDK generation ships one.
    ///
    /// A 64-bit host building 32-bit needs no cross tools, so that pair
    /// collapses to the plain 32-bit script.
    pub fn vc_script_for(&self, host: Arch, target: Arch) -> Option<&'static str> {
        let host = if host == Arch::Amd64 && target == Arch::X86 {
            Arch::X86
        } else {
            host
        };

        match self.style {
            ScriptStyle::Flat => match (host, target) {
                (Arch::X86, Arch::X86) => Some("bin/vcvars32.bat"),
                (Arch::Amd64, Arch::Amd64) => Some("bin/vcvars64.bat"),
                (Arch::X86, Arch::Amd64) => Some("bin/vcvarsx86_amd64.bat"),
                (Arch::X86, Arch::Ia64) => Some("bin/vcvarsx86_ia64.bat"),
                (Arch::Ia64, Arch::Ia64) => Some("bin/vcvarsia64.bat"),
                _ => None,
            },
            ScriptStyle::Nested => match (host, target) {
                (Arch::X86, Arch::X86) => Some("bin/vcvars32.bat"),
                (Arch::Amd64, Arch::Amd64) => Some("bin/vcvars64.bat"),
                (Arch::X86, Arch::Amd64) => Some("bin/x86_amd64/vcvarsx86_amd64.bat"),
                (Arch::X86, Arch::Arm) => Some("bin/x86_arm/vcvarsx86_arm.bat"),
                _ => None,
            },
        }
    }
}

/// Probe the registry for installed SDKs, newest first.
pub fn installed_sdks(registry: &dyn RegistryRead) -> Vec<InstalledSdk> {
    let mut found = Vec::new();
    for sdk in SDK_RELEASES {
        let root = match registry.read_value(Hive::LocalMachine, sdk.value_path) {
            Ok(value) => PathBuf::from(value),
            Err(err) => {
                debug!(version = sdk.version, error = %err, "SDK not registered");
                continue;
            }
        };
        if !root.exists() {
            debug!(version = sdk.version, path = %root.display(), "registered SDK directory missing");
            continue;
        }
        if !root.join(sdk.sanity_file).exists() {
            debug!(version = sdk.version, "SDK sanity file missing, skipping");
            continue;
        }
        debug!(version = sdk.version, path = %root.display(), "found installed SDK");
        found.push(InstalledSdk {
            version: sdk.version,
            root,
            style: sdk.style,
        });
    }
    found
}
