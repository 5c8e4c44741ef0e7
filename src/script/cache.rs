//! Two-layer cache for captured setup-script environments.
//!
//! Setup scripts are by far the slowest step of configuration (several
//! seconds each on modern installs), so results are memoized in-process
//! and, when a cache file is configured, persisted as JSON so later
//! processes skip the scripts entirely. The file is read once at first
//! use and rewritten after every new entry; across processes the last
//! writer wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::script::EnvironmentBindings;

/// Cache key: the script path and its argument string.
pub fn cache_key(script: &Path, args: &str) -> String {
    format!("{}--{}", script.display(), args)
}

#[derive(Debug, Default)]
pub struct ScriptCache {
    file: Option<PathBuf>,
    loaded: bool,
    entries: HashMap<String, EnvironmentBindings>,
}

impl ScriptCache {
    /// In-memory cache, optionally backed by a JSON file.
    pub fn new(file: Option<PathBuf>) -> Self {
        ScriptCache {
            file,
            loaded: false,
            entries: HashMap::new(),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn get(&mut self, key: &str) -> Option<&EnvironmentBindings> {
        self.load_once();
        self.entries.get(key)
    }

    /// Record a result and, if a file is configured, write the cache out.
    /// A failed write is logged and otherwise ignored; the in-process
    /// entry still stands.
    pub fn insert(&mut self, key: String, bindings: EnvironmentBindings) {
        self.load_once();
        self.entries.insert(key, bindings);
        if let Some(file) = &self.file {
            if let Err(err) = write_entries(file, &self.entries) {
                warn!(path = %file.display(), error = %err, "could not write script cache");
            }
        }
    }

    fn load_once(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let Some(file) = &self.file else { return };

        match fs::read_to_string(file) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => {
                    self.entries = entries;
                    debug!(path = %file.display(), entries = self.entries.len(), "loaded script cache");
                }
                Err(err) => {
                    debug!(path = %file.display(), error = %err, "ignoring unreadable script cache");
                }
            },
            Err(err) => {
                debug!(path = %file.display(), error = %err, "no script cache to load");
            }
        }
    }
}

fn write_entries(file: &Path, entries: &HashMap<String, EnvironmentBindings>) -> anyhow::Result<()> {
    if let Some(parent) = file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }
    }
    let text = serde_json::to_string_pretty(entries).context("serializing script cache")?;
    fs::write(file, text).with_context(|| format!("writing cache file {}", file.display()))?;
    Ok(())
}
