//! CPU architecture canonicalization.
//!
//! Raw platform strings (`x86_64`, `i686`, `AMD64`, ...) are normalized to
//! exactly one canonical token. An unrecognized string is a hard error at
//! the point where host and target are resolved, never silently ignored.

use std::fmt;

use crate::environment::BuildEnv;
use crate::error::{Result, VcEnvError};

/// Canonical CPU architecture token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    Amd64,
    Arm,
    Arm64,
    Ia64,
}

/// Raw-to-canonical mapping. Deprecated names stay recognized because old
/// build files still pass them.
const ARCH_ALIASES: &[(&str, Arch)] = &[
    ("amd64", Arch::Amd64),
    ("emt64", Arch::Amd64),
    ("x86_64", Arch::Amd64),
    ("i386", Arch::X86),
    ("i486", Arch::X86),
    ("i586", Arch::X86),
    ("i686", Arch::X86),
    ("x86", Arch::X86),
    ("arm", Arch::Arm),
    ("arm64", Arch::Arm64),
    ("aarch64", Arch::Arm64),
    ("ia64", Arch::Ia64),
    ("itanium", Arch::Ia64),
];

impl Arch {
    /// Normalize a raw architecture string, case-insensitively.
    pub fn parse(raw: &str) -> Option<Arch> {
        let lowered = raw.to_ascii_lowercase();
        ARCH_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, arch)| *arch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Ia64 => "ia64",
        }
    }

    /// Every accepted raw spelling, for diagnostics.
    pub fn valid_aliases() -> Vec<&'static str> {
        ARCH_ALIASES.iter().map(|(alias, _)| *alias).collect()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the effective (host, target) pair from environment overrides.
///
/// `HOST_ARCH` falls back to the machine this process runs on. `TARGET_ARCH`
/// falls back to the host. The raw requested target (if any) is returned as
/// well: the script search treats an explicit request differently from a
/// defaulted one.
pub fn host_target(env: &BuildEnv) -> Result<(Arch, Arch, Option<String>)> {
    let host_raw = match env.get("HOST_ARCH") {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => native_arch().to_string(),
    };

    let requested = match env.get("TARGET_ARCH") {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => None,
    };
    let target_raw = requested.clone().unwrap_or_else(|| host_raw.clone());

    let host = Arch::parse(&host_raw).ok_or_else(|| VcEnvError::UnsupportedHostArch {
        arch: host_raw.clone(),
    })?;
    let target = Arch::parse(&target_raw).ok_or_else(|| VcEnvError::UnsupportedTargetArch {
        arch: target_raw.clone(),
        valid: Arch::valid_aliases().join(", "),
    })?;

    Ok((host, target, requested))
}

/// Raw architecture token of the running machine.
pub fn native_arch() -> &'static str {
    std::env::consts::ARCH
}

/// Whether the machine is a 64-bit Windows host for registry purposes.
///
/// A 32-bit process on 64-bit Windows still sees the registry through the
/// redirector, so the WOW64 marker variable counts as 64-bit.
pub fn native_is_64bit() -> bool {
    if matches!(Arch::parse(native_arch()), Some(Arch::Amd64 | Arch::Arm64 | Arch::Ia64)) {
        return true;
    }
    std::env::var_os("PROCESSOR_ARCHITEW6432").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_raw_names() {
        assert_eq!(Arch::parse("x86_64"), Some(Arch::Amd64));
        assert_eq!(Arch::parse("emt64"), Some(Arch::Amd64));
        assert_eq!(Arch::parse("i686"), Some(Arch::X86));
        assert_eq!(Arch::parse("aarch64"), Some(Arch::Arm64));
        assert_eq!(Arch::parse("itanium"), Some(Arch::Ia64));
    }

    #[test]
    fn normalization_is_case_insensitive() {
        assert_eq!(Arch::parse("AMD64"), Some(Arch::Amd64));
        assert_eq!(Arch::parse("X86"), Some(Arch::X86));
        assert_eq!(Arch::parse("ARM64"), Some(Arch::Arm64));
    }

    #[test]
    fn canonical_tokens_normalize_to_themselves() {
        for arch in [Arch::X86, Arch::Amd64, Arch::Arm, Arch::Arm64, Arch::Ia64] {
            assert_eq!(Arch::parse(arch.as_str()), Some(arch));
        }
    }

    #[test]
    fn unknown_raw_name_is_rejected() {
        assert_eq!(Arch::parse("sparc"), None);
        assert_eq!(Arch::parse(""), None);
    }

    #[test]
    fn host_target_defaults_target_to_host() {
        let mut env = BuildEnv::new();
        env.set("HOST_ARCH", "amd64");
        let (host, target, requested) = host_target(&env).unwrap();
        assert_eq!(host, Arch::Amd64);
        assert_eq!(target, Arch::Amd64);
        assert!(requested.is_none());
    }

    #[test]
    fn host_target_honors_explicit_target() {
        let mut env = BuildEnv::new();
        env.set("HOST_ARCH", "amd64");
        env.set("TARGET_ARCH", "x86");
        let (host, target, requested) = host_target(&env).unwrap();
        assert_eq!(host, Arch::Amd64);
        assert_eq!(target, Arch::X86);
        assert_eq!(requested.as_deref(), Some("x86"));
    }

    #[test]
    fn host_target_keeps_raw_request() {
        let mut env = BuildEnv::new();
        env.set("HOST_ARCH", "x86_64");
        env.set("TARGET_ARCH", "x86_64");
        let (_, target, requested) = host_target(&env).unwrap();
        assert_eq!(target, Arch::Amd64);
        assert_eq!(requested.as_deref(), Some("x86_64"));
    }

    #[test]
    fn host_target_rejects_unknown_host() {
        let mut env = BuildEnv::new();
        env.set("HOST_ARCH", "vax");
        assert!(matches!(
            host_target(&env),
            Err(VcEnvError::UnsupportedHostArch { .. })
        ));
    }

    #[test]
    fn host_target_rejects_unknown_target_and_lists_valid() {
        let mut env = BuildEnv::new();
        env.set("HOST_ARCH", "amd64");
        env.set("TARGET_ARCH", "mips");
        match host_target(&env) {
            Err(VcEnvError::UnsupportedTargetArch { arch, valid }) => {
                assert_eq!(arch, "mips");
                assert!(valid.contains("amd64"));
            }
            other => panic!("expected UnsupportedTargetArch, got {other:?}"),
        }
    }
}
