//! Version, architecture, and compatibility data for MSVC toolchains.
//!
//! Everything version-shaped lives here: the canonical architecture tokens,
//! the `major.minor[suffix]` version type, and the static per-release
//! compatibility tables the discovery modules consult.

pub mod arch;
pub mod releases;
pub mod version;

pub use arch::{host_target, native_is_64bit, Arch};
pub use releases::{CompilerRelease, Layout};
pub use version::MsvcVersion;
