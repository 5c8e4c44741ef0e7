//! Executing a setup script and capturing the environment it produces.
//!
//! The script runs under `cmd.exe` chained with `set`, so its stdout ends
//! with a full variable dump. Batch files do not reliably propagate exit
//! codes, so failure is detected from known stdout signatures instead of
//! the process status.

use std::io;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::environment::PATH_LIST_SEPARATOR;
use crate::error::{Result, VcEnvError};
use crate::script::EnvironmentBindings;

/// Variables captured from the dump. Everything else a script sets is
/// noise for build purposes.
pub(crate) const KEEP_VARS: &[&str] = &["INCLUDE", "LIB", "LIBPATH", "PATH", "VSCMD_ARG_app_plat"];

/// Stdout prefixes that mean the script failed despite exiting zero.
pub const DEFAULT_FAILURE_SIGNATURES: &[&str] = &["The specified configuration type is missing"];

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    failure_signatures: Vec<String>,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRunner {
    pub fn new() -> Self {
        ScriptRunner {
            failure_signatures: DEFAULT_FAILURE_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Treat stdout starting with `prefix` as a failed run.
    pub fn add_failure_signature(&mut self, prefix: impl Into<String>) {
        self.failure_signatures.push(prefix.into());
    }

    pub fn run(&self, script: &Path, args: &str) -> Result<EnvironmentBindings> {
        self.run_with_exec(script, args, run_script_capture)
    }

    /// As [`run`](Self::run), with the subprocess call supplied by the
    /// caller.
    pub fn run_with_exec<F>(&self, script: &Path, args: &str, exec: F) -> Result<EnvironmentBindings>
    where
        F: Fn(&Path, &str) -> io::Result<String>,
    {
        debug!(script = %script.display(), args, "running setup script");
        let stdout = exec(script, args)?;

        if let Some(first) = stdout.lines().next() {
            if self
                .failure_signatures
                .iter()
                .any(|sig| first.starts_with(sig.as_str()))
            {
                let message = stdout.lines().take(2).collect::<Vec<_>>().join("\n");
                return Err(VcEnvError::ScriptFailed {
                    script: script.to_path_buf(),
                    message,
                });
            }
        }

        Ok(parse_bindings(&stdout))
    }
}

/// Extract the keep-list variables from a `set` dump. Matching is
/// case-insensitive; results are stored under the canonical names. Empty
/// list segments are dropped and stray quotes stripped (VC98 quotes its
/// PATH entries).
pub(crate) fn parse_bindings(output: &str) -> EnvironmentBindings {
    let mut bindings = EnvironmentBindings::new();
    for line in output.lines() {
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let Some(var) = KEEP_VARS.iter().find(|k| k.eq_ignore_ascii_case(name)) else {
            continue;
        };

        let parts: Vec<&str> = value
            .split(PATH_LIST_SEPARATOR)
            .map(|part| part.trim_matches('"'))
            .filter(|part| !part.is_empty())
            .collect();

        let entry = bindings.entry(var.to_string()).or_default();
        if entry.is_empty() {
            *entry = parts.join(&PATH_LIST_SEPARATOR.to_string());
        } else if !parts.is_empty() {
            entry.push(PATH_LIST_SEPARATOR);
            entry.push_str(&parts.join(&PATH_LIST_SEPARATOR.to_string()));
        }
    }
    bindings
}

pub(crate) fn run_script_capture(script: &Path, args: &str) -> io::Result<String> {
    let comspec = std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string());
    let command = if args.is_empty() {
        format!("\"{}\" & set", script.display())
    } else {
        format!("\"{}\" {} & set", script.display(), args)
    };

    let mut cmd = Command::new(comspec);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.raw_arg("/C").raw_arg(&command);
    }
    #[cfg(not(windows))]
    {
        cmd.args(["/C", &command]);
    }

    let output = cmd.output()?;
    if !output.stderr.is_empty() {
        debug!(stderr = %String::from_utf8_lossy(&output.stderr).trim_end(), "setup script stderr");
    }
    // Exit status is deliberately not checked; see the failure signatures.
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
