//! Ordered path-group resolution for locating externally installed tools.
//!
//! Callers register groups of candidate directories (front = higher
//! priority) and then resolve them into the unique candidates that exist
//! on disk, optionally joined with a suffix or file name and filtered by
//! pattern. Candidates may contain `~`, environment references, and glob
//! wildcards.

mod expand;

use std::collections::{HashSet, VecDeque};
use std::env::VarError;
use std::path::PathBuf;

use anyhow::Context;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{Result, VcEnvError};

/// A candidate path value: a single string or an arbitrarily nested list.
#[derive(Debug, Clone)]
pub enum PathSpec {
    Value(String),
    List(Vec<PathSpec>),
}

impl PathSpec {
    /// Build a spec from untyped JSON, accepting strings and nested arrays.
    ///
    /// Every invalid leaf is reported, not just the first; the error lists
    /// each offender with its position in leaf order.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let mut count = 0usize;
        let mut errors = Vec::new();
        let spec = Self::from_json_inner(value, true, &mut count, &mut errors);
        if errors.is_empty() {
            Ok(spec)
        } else {
            Err(VcEnvError::InvalidPathEntries { errors })
        }
    }

    fn from_json_inner(
        value: &serde_json::Value,
        top: bool,
        count: &mut usize,
        errors: &mut Vec<String>,
    ) -> Self {
        match value {
            serde_json::Value::String(s) => {
                *count += 1;
                PathSpec::Value(s.clone())
            }
            serde_json::Value::Array(items) => PathSpec::List(
                items
                    .iter()
                    .map(|item| Self::from_json_inner(item, false, count, errors))
                    .collect(),
            ),
            other => {
                *count += 1;
                if top {
                    errors.push(format!("expected string, found {}", json_type_name(other)));
                } else {
                    errors.push(format!(
                        "sequence item {}: expected string, found {}",
                        count,
                        json_type_name(other)
                    ));
                }
                PathSpec::List(Vec::new())
            }
        }
    }

    /// Flatten to trimmed, non-empty candidate strings in spec order.
    fn flatten(&self) -> Vec<String> {
        let mut flat = Vec::new();
        self.flatten_into(&mut flat);
        flat
    }

    fn flatten_into(&self, flat: &mut Vec<String>) {
        match self {
            PathSpec::Value(value) => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    flat.push(trimmed.to_string());
                }
            }
            PathSpec::List(items) => {
                for item in items {
                    item.flatten_into(flat);
                }
            }
        }
    }
}

impl From<&str> for PathSpec {
    fn from(value: &str) -> Self {
        PathSpec::Value(value.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(value: String) -> Self {
        PathSpec::Value(value)
    }
}

impl From<PathBuf> for PathSpec {
    fn from(value: PathBuf) -> Self {
        PathSpec::Value(value.to_string_lossy().into_owned())
    }
}

impl<T: Into<PathSpec>> From<Vec<T>> for PathSpec {
    fn from(values: Vec<T>) -> Self {
        PathSpec::List(values.into_iter().map(Into::into).collect())
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Options applied to every candidate during [`PathGroupList::resolve`].
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    path_suffix: Option<String>,
    file_name: Option<String>,
    filter: Option<Regex>,
    first_only: bool,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join every candidate with a relative directory suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.path_suffix = Some(suffix.into());
        self
    }

    /// Join every candidate with a file name and require it to be a file.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Keep only results matched by `filter`.
    pub fn with_filter(mut self, filter: Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Compile `pattern` as a case-insensitive filter anchored at the start
    /// of the full path.
    pub fn with_filter_pattern(self, pattern: &str) -> Result<Self> {
        let filter = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid path filter pattern {pattern:?}"))?;
        Ok(self.with_filter(filter))
    }

    /// Stop at the first existing result instead of collecting all of them.
    pub fn first_match_only(mut self) -> Self {
        self.first_only = true;
        self
    }
}

/// Priority-ordered groups of candidate paths.
#[derive(Debug, Default, Clone)]
pub struct PathGroupList {
    groups: VecDeque<Vec<String>>,
}

impl PathGroupList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group ahead of all existing groups.
    pub fn push_front(&mut self, spec: impl Into<PathSpec>) {
        self.groups.push_front(spec.into().flatten());
    }

    /// Add a group behind all existing groups.
    pub fn push_back(&mut self, spec: impl Into<PathSpec>) {
        self.groups.push_back(spec.into().flatten());
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Resolve all groups against the filesystem and the process
    /// environment.
    pub fn resolve(&self, options: &ResolveOptions) -> Vec<PathBuf> {
        self.resolve_with_env(options, |name: &str| std::env::var(name))
    }

    /// Resolve with an explicit environment lookup for variable expansion.
    pub fn resolve_with_env<F>(&self, options: &ResolveOptions, env_var: F) -> Vec<PathBuf>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let suffix = options
            .path_suffix
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let file_name = options
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut all = Vec::new();
        let mut seen = HashSet::new();
        for group in &self.groups {
            let found = resolve_group(group, suffix, file_name, options, &env_var);
            if found.is_empty() {
                continue;
            }
            if options.first_only {
                return found;
            }
            for path in found {
                if seen.insert(path.clone()) {
                    all.push(path);
                }
            }
        }
        debug!(count = all.len(), "resolved path groups");
        all
    }
}

fn resolve_group<F>(
    group: &[String],
    suffix: Option<&str>,
    file_name: Option<&str>,
    options: &ResolveOptions,
    env_var: &F,
) -> Vec<PathBuf>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
{
    let mut found = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for candidate in group {
        let mut joined = PathBuf::from(candidate);
        if let Some(suffix) = suffix {
            joined.push(suffix);
        }
        if let Some(file_name) = file_name {
            joined.push(file_name);
        }

        let expanded = expand::expand_user(&joined.to_string_lossy());
        let expanded = expand::expand_vars(&expanded, |name| env_var(name).ok());
        let candidate = expand::normcase(expand::canonical(&expanded));
        if !seen.insert(candidate.clone()) {
            continue;
        }

        let pattern = candidate.to_string_lossy();
        let matches = match glob::glob(&pattern) {
            Ok(matches) => matches,
            Err(err) => {
                debug!(pattern = %pattern, error = %err, "skipping unglobbable candidate");
                continue;
            }
        };

        for entry in matches.flatten() {
            let path = if entry != candidate {
                let resolved = expand::normcase(expand::canonical(&entry.to_string_lossy()));
                if !seen.insert(resolved.clone()) {
                    continue;
                }
                resolved
            } else {
                entry
            };

            let exists = if file_name.is_some() {
                path.is_file()
            } else {
                path.is_dir()
            };
            if !exists {
                continue;
            }
            if let Some(filter) = &options.filter {
                if !filter.is_match(&path.to_string_lossy()) {
                    continue;
                }
            }

            found.push(path);
            if options.first_only {
                return found;
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn no_env(_name: &str) -> std::result::Result<String, VarError> {
        Err(VarError::NotPresent)
    }

    #[test]
    fn flatten_skips_blank_entries() {
        let spec = PathSpec::from(vec![
            PathSpec::from("  a  "),
            PathSpec::from(""),
            PathSpec::from(vec!["b", "   "]),
        ]);
        assert_eq!(spec.flatten(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn from_json_accepts_nested_strings() {
        let spec = PathSpec::from_json(&json!(["a", ["b", ["c"]]])).unwrap();
        assert_eq!(spec.flatten(), vec!["a", "b", "c"]);
    }

    #[test]
    fn from_json_collects_every_invalid_leaf() {
        let err = PathSpec::from_json(&json!(["ok", 3, ["deep", false]])).unwrap_err();
        match err {
            VcEnvError::InvalidPathEntries { errors } => {
                assert_eq!(
                    errors,
                    vec![
                        "sequence item 2: expected string, found number".to_string(),
                        "sequence item 4: expected string, found boolean".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_json_rejects_bare_scalar() {
        let err = PathSpec::from_json(&json!(42)).unwrap_err();
        assert!(err.to_string().contains("expected string, found number"));
    }

    #[test]
    fn resolve_keeps_group_order_and_dedups() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(second.clone());
        groups.push_back(first.clone());
        groups.push_front(vec![first.clone(), first.clone()]);

        let paths = groups.resolve_with_env(&ResolveOptions::new(), no_env);
        assert_eq!(paths, vec![first.canonicalize().unwrap(), second.canonicalize().unwrap()]);
        // re-running with an unchanged filesystem reproduces the output
        assert_eq!(groups.resolve_with_env(&ResolveOptions::new(), no_env), paths);
    }

    #[test]
    fn resolve_skips_missing_candidates() {
        let dir = TempDir::new().unwrap();
        let mut groups = PathGroupList::new();
        groups.push_back(dir.path().join("not-there"));
        assert!(groups.resolve_with_env(&ResolveOptions::new(), no_env).is_empty());
    }

    #[test]
    fn suffix_and_file_name_are_joined_before_the_check() {
        let dir = TempDir::new().unwrap();
        let tool_dir = dir.path().join("root").join("Installer");
        fs::create_dir_all(&tool_dir).unwrap();
        fs::write(tool_dir.join("vswhere.exe"), b"").unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(dir.path().join("root"));

        let options = ResolveOptions::new()
            .with_suffix("Installer")
            .with_file_name("vswhere.exe");
        let paths = groups.resolve_with_env(&options, no_env);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_file());
        assert!(paths[0].ends_with("Installer/vswhere.exe") || paths[0].ends_with(r"Installer\vswhere.exe"));
    }

    #[test]
    fn file_name_requires_a_file_not_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("vswhere.exe")).unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(dir.path().to_path_buf());
        let options = ResolveOptions::new().with_file_name("vswhere.exe");
        assert!(groups.resolve_with_env(&options, no_env).is_empty());
    }

    #[test]
    fn environment_references_expand_through_the_lookup() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let env = move |name: &str| {
            if name == "TOOL_ROOT" {
                Ok(root.clone())
            } else {
                Err(VarError::NotPresent)
            }
        };

        let mut groups = PathGroupList::new();
        groups.push_back("%TOOL_ROOT%/nested");
        groups.push_back("${TOOL_ROOT}/nested");

        let paths = groups.resolve_with_env(&ResolveOptions::new(), env);
        assert_eq!(paths, vec![nested.canonicalize().unwrap()]);
    }

    #[test]
    fn wildcards_expand_to_every_match() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("v160")).unwrap();
        fs::create_dir_all(dir.path().join("v170")).unwrap();
        fs::write(dir.path().join("v-not-a-dir"), b"").unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(dir.path().join("v*"));

        let paths = groups.resolve_with_env(&ResolveOptions::new(), no_env);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_dir()));
    }

    #[test]
    fn filter_pattern_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Tools")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(vec![dir.path().join("Tools"), dir.path().join("other")]);

        let options = ResolveOptions::new().with_filter_pattern(".*TOOLS.*").unwrap();
        let paths = groups.resolve_with_env(&options, no_env);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("Tools"));
    }

    #[test]
    fn first_match_only_returns_the_highest_priority_hit() {
        let dir = TempDir::new().unwrap();
        let low = dir.path().join("low");
        let high = dir.path().join("high");
        fs::create_dir_all(&low).unwrap();
        fs::create_dir_all(&high).unwrap();

        let mut groups = PathGroupList::new();
        groups.push_back(low);
        groups.push_front(vec![dir.path().join("missing"), high.clone()]);

        let options = ResolveOptions::new().first_match_only();
        let paths = groups.resolve_with_env(&options, no_env);
        assert_eq!(paths, vec![high.canonicalize().unwrap()]);
    }
}
