//! Vcenv - MSVC toolchain discovery and environment setup.
//!
//! Vcenv finds installed Microsoft Visual C++ toolchains (modern vswhere
//! instances and registry-era releases alike), runs the matching
//! `vcvars`-style setup script, and captures the variables it exports so
//! a build environment can use the compiler without a developer prompt.
//!
//! # Modules
//!
//! - [`environment`] - Build-environment variables and PATH merging
//! - [`error`] - Error types and result aliases
//! - [`hostpath`] - Path templates and existence-filtered search
//! - [`locator`] - Discovery and setup service tying everything together
//! - [`probe`] - Install-directory lookup for each release
//! - [`registry`] - Windows registry access behind a trait
//! - [`script`] - Setup-script execution, capture, and caching
//! - [`toolset`] - Version tokens, architectures, and the release table
//! - [`vswhere`] - Instance enumeration for Visual Studio 2017 and later
//!
//! # Example
//!
//! ```
//! use vcenv::environment::BuildEnv;
//!
//! // Merge a captured variable into a build environment.
//! let mut env = BuildEnv::new();
//! env.set("PATH", r"C:\tools");
//! env.prepend_path("PATH", r"C:\vc\bin", true);
//! assert_eq!(env.get("PATH"), Some(r"C:\vc\bin;C:\tools"));
//! ```
//!
//! For end-to-end discovery and setup, see [`locator::MsvcLocator`] and
//! the integration tests.

pub mod environment;
pub mod error;
pub mod hostpath;
pub mod locator;
pub mod probe;
pub mod registry;
pub mod script;
pub mod toolset;
pub mod vswhere;

pub use environment::BuildEnv;
pub use error::{Result, VcEnvError};
pub use locator::MsvcLocator;
