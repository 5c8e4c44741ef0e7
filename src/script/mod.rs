//! Running Visual C++ setup scripts and capturing what they export.
//!
//! A setup script (`vcvarsall.bat` and friends) mutates the calling
//! shell's environment. We run the script followed by `set`, keep the
//! variables the build cares about, and cache the result keyed on the
//! script path and its arguments so repeated setups skip the subprocess.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

pub mod cache;
pub mod runner;
pub mod sdk;
pub mod selector;

pub use cache::{cache_key, ScriptCache};
pub use runner::{ScriptRunner, DEFAULT_FAILURE_SIGNATURES};
pub use sdk::{installed_sdks, InstalledSdk};
pub use selector::{find_setup_script, ScriptSelection};

/// Environment variables captured from a setup script, keyed by their
/// canonical (upper-cased) names.
pub type EnvironmentBindings = std::collections::BTreeMap<String, String>;

/// Run a setup script through the cache.
///
/// A hit returns the stored bindings without touching the subprocess. On
/// a miss the script is run and a successful capture is stored; failures
/// are never cached, so a fixed install is picked up on the next call.
pub fn script_env<F>(
    cache: &mut ScriptCache,
    runner: &ScriptRunner,
    script: &Path,
    args: &str,
    exec: F,
) -> Result<EnvironmentBindings>
where
    F: Fn(&Path, &str) -> io::Result<String>,
{
    let key = cache_key(script, args);
    if let Some(hit) = cache.get(&key) {
        debug!(script = %script.display(), args, "setup environment already cached");
        return Ok(hit.clone());
    }

    let bindings = runner.run_with_exec(script, args, exec)?;
    cache.insert(key, bindings.clone());
    Ok(bindings)
}
