//! Static compatibility tables for every supported MSVC release.
//!
//! Adding a new compiler release is a data-only change: a new entry here
//! (and, for vswhere-discovered releases, a Visual Studio major mapping)
//! is all the rest of the crate consults.

use crate::registry::Hive;
use crate::toolset::Arch;

/// Installation layout eras, which drive both the compiler-presence probe
/// and the setup-script naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 14.1+ (VS2017 and later): per-toolset directories under
    /// `Tools/MSVC/<toolset>/bin/Host*/...` and per-pair scripts under
    /// `Auxiliary/Build`.
    PerToolset,
    /// 8.0 through 14.0: a unified `bin/<host_target>` tree and a single
    /// `vcvarsall.bat` taking an architecture argument.
    UnifiedBin,
    /// 7.0 and 7.1: `vsvars32.bat` lives beside the install in
    /// `Common7/Tools`.
    CommonTools,
    /// 6.0: `Bin/vcvars32.bat`, no reliable compiler layout.
    Legacy,
}

/// One row of the compatibility table.
#[derive(Debug)]
pub struct CompilerRelease {
    /// Externally visible version token, possibly suffixed (`14.1Exp`).
    pub version: &'static str,
    /// Registry locations of the product directory, probed in order.
    /// Empty means the release is only discoverable through vswhere.
    pub hkeys: &'static [(Hive, &'static str)],
    pub layout: Layout,
    /// Target architectures this release can produce code for.
    pub targets: &'static [Arch],
}

impl CompilerRelease {
    pub fn uses_vswhere(&self) -> bool {
        self.hkeys.is_empty()
    }

    /// Whether this release may support the given target at all. Only a
    /// coarse pre-check: the toolchain still has to be present on disk.
    pub fn supports_target(&self, target: Arch) -> bool {
        self.targets.contains(&target)
    }
}

const MODERN_TARGETS: &[Arch] = &[Arch::X86, Arch::Amd64, Arch::Arm, Arch::Arm64];
const VS2015_TARGETS: &[Arch] = &[Arch::X86, Arch::Amd64, Arch::Arm];
const ITANIUM_ERA_TARGETS: &[Arch] = &[Arch::X86, Arch::Amd64, Arch::Ia64];
const X86_ONLY: &[Arch] = &[Arch::X86];

/// Every release this crate knows about, newest first. Order matters: the
/// installed-version list and the default pick preserve it.
pub const RELEASES: &[CompilerRelease] = &[
    CompilerRelease {
        version: "14.3",
        hkeys: &[],
        layout: Layout::PerToolset,
        targets: MODERN_TARGETS,
    },
    CompilerRelease {
        version: "14.2",
        hkeys: &[],
        layout: Layout::PerToolset,
        targets: MODERN_TARGETS,
    },
    CompilerRelease {
        version: "14.1",
        hkeys: &[],
        layout: Layout::PerToolset,
        targets: MODERN_TARGETS,
    },
    CompilerRelease {
        version: "14.1Exp",
        hkeys: &[],
        layout: Layout::PerToolset,
        targets: MODERN_TARGETS,
    },
    CompilerRelease {
        version: "14.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\14.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: VS2015_TARGETS,
    },
    CompilerRelease {
        version: "14.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\14.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: VS2015_TARGETS,
    },
    CompilerRelease {
        version: "12.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\12.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "12.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\12.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "11.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\11.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "11.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\11.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "10.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\10.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "10.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\10.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "9.0",
        hkeys: &[
            (
                Hive::CurrentUser,
                r"Microsoft\DevDiv\VCForPython\9.0\installdir",
            ),
            (
                Hive::LocalMachine,
                r"Microsoft\VisualStudio\9.0\Setup\VC\ProductDir",
            ),
        ],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "9.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\9.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "8.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\8.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "8.0Exp",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VCExpress\8.0\Setup\VC\ProductDir",
        )],
        layout: Layout::UnifiedBin,
        targets: ITANIUM_ERA_TARGETS,
    },
    CompilerRelease {
        version: "7.1",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\7.1\Setup\VC\ProductDir",
        )],
        layout: Layout::CommonTools,
        targets: X86_ONLY,
    },
    CompilerRelease {
        version: "7.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\7.0\Setup\VC\ProductDir",
        )],
        layout: Layout::CommonTools,
        targets: X86_ONLY,
    },
    CompilerRelease {
        version: "6.0",
        hkeys: &[(
            Hive::LocalMachine,
            r"Microsoft\VisualStudio\6.0\Setup\Microsoft Visual C++\ProductDir",
        )],
        layout: Layout::Legacy,
        targets: X86_ONLY,
    },
];

/// Look up a release by its exact version token.
pub fn find(version: &str) -> Option<&'static CompilerRelease> {
    RELEASES.iter().find(|release| release.version == version)
}

/// Map a Visual Studio installation major version (from vswhere output) to
/// the compiler version token it carries.
pub fn vs_major_to_version(vs_major: &str) -> Option<&'static str> {
    match vs_major {
        "17" => Some("14.3"),
        "16" => Some("14.2"),
        "15" => Some("14.1"),
        _ => None,
    }
}

/// Per-toolset era (14.1+) `bin` subdirectories for a host/target pair.
pub fn toolset_host_target_dirs(host: Arch, target: Arch) -> Option<(&'static str, &'static str)> {
    let dirs = match (host, target) {
        (Arch::Amd64, Arch::Amd64) => ("Hostx64", "x64"),
        (Arch::Amd64, Arch::X86) => ("Hostx64", "x86"),
        (Arch::Amd64, Arch::Arm) => ("Hostx64", "arm"),
        (Arch::Amd64, Arch::Arm64) => ("Hostx64", "arm64"),
        (Arch::X86, Arch::Amd64) => ("Hostx86", "x64"),
        (Arch::X86, Arch::X86) => ("Hostx86", "x86"),
        (Arch::X86, Arch::Arm) => ("Hostx86", "arm"),
        (Arch::X86, Arch::Arm64) => ("Hostx86", "arm64"),
        _ => return None,
    };
    Some(dirs)
}

/// Unified-bin era (8.0 through 14.0) `bin` subdirectory for a host/target
/// pair. The native x86 tools live directly in `bin`, hence the empty
/// string.
pub fn unified_bin_subdir(host: Arch, target: Arch) -> Option<&'static str> {
    let subdir = match (host, target) {
        (Arch::Amd64, Arch::Amd64) => "amd64",
        (Arch::Amd64, Arch::X86) => "amd64_x86",
        (Arch::Amd64, Arch::Arm) => "amd64_arm",
        (Arch::Amd64, Arch::Arm64) => "amd64_arm64",
        (Arch::X86, Arch::Amd64) => "x86_amd64",
        (Arch::X86, Arch::X86) => "",
        (Arch::X86, Arch::Arm) => "x86_arm",
        (Arch::X86, Arch::Arm64) => "x86_arm64",
        (Arch::Arm, Arch::Arm) => "arm",
        _ => return None,
    };
    Some(subdir)
}

/// Per-toolset era setup script under `Auxiliary/Build`. The script name
/// encodes the pair, so no argument is passed when running it.
pub fn toolset_script_name(host: Arch, target: Arch) -> Option<&'static str> {
    let name = match (host, target) {
        (Arch::Amd64, Arch::Amd64) => "vcvars64.bat",
        (Arch::Amd64, Arch::X86) => "vcvarsamd64_x86.bat",
        (Arch::Amd64, Arch::Arm) => "vcvarsamd64_arm.bat",
        (Arch::Amd64, Arch::Arm64) => "vcvarsamd64_arm64.bat",
        (Arch::X86, Arch::X86) => "vcvars32.bat",
        (Arch::X86, Arch::Amd64) => "vcvarsx86_amd64.bat",
        (Arch::X86, Arch::Arm) => "vcvarsx86_arm.bat",
        (Arch::X86, Arch::Arm64) => "vcvarsx86_arm64.bat",
        _ => return None,
    };
    Some(name)
}

/// Architecture argument for `vcvarsall.bat` in the unified-bin era.
pub fn vcvarsall_arg(host: Arch, target: Arch) -> Option<&'static str> {
    let arg = match (host, target) {
        (Arch::X86, Arch::X86) => "x86",
        (Arch::X86, Arch::Amd64) => "x86_amd64",
        (Arch::X86, Arch::Ia64) => "x86_ia64",
        (Arch::X86, Arch::Arm) => "x86_arm",
        (Arch::X86, Arch::Arm64) => "x86_arm64",
        (Arch::Amd64, Arch::Amd64) => "amd64",
        (Arch::Amd64, Arch::X86) => "x86",
        (Arch::Amd64, Arch::Arm) => "amd64_arm",
        (Arch::Amd64, Arch::Arm64) => "amd64_arm64",
        (Arch::Arm, Arch::Arm) => "arm",
        _ => return None,
    };
    Some(arg)
}
