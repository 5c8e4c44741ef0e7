//! The build environment this crate configures.
//!
//! [`BuildEnv`] is a string key-value store with the three behaviors the
//! discovery code relies on: `$NAME` substitution, boolean-ish flag
//! parsing, and `PATH`-style prepend-with-dedup merging of captured
//! script variables.

mod subst;

use std::collections::{HashMap, HashSet};

/// Separator for `PATH`-like list variables. The captured environments are
/// Windows-shaped regardless of where the library itself runs.
pub const PATH_LIST_SEPARATOR: char = ';';

/// Mutable build-configuration environment.
#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
    vars: HashMap<String, String>,
}

impl BuildEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn unset(&mut self, name: &str) {
        self.vars.remove(name);
    }

    /// Expand `$NAME` / `${NAME}` references against this environment.
    pub fn subst(&self, text: &str) -> String {
        subst::expand(text, |name| self.get(name).map(str::to_string))
    }

    /// Iterate over all variables, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Prepend the segments of `value` onto the list variable `name`.
    ///
    /// With `delete_existing`, segments already present move to the front;
    /// without it, already-present segments are left where they are and
    /// not prepended again. Comparison is case-insensitive with trailing
    /// separators ignored, so `C:\Tools\` and `c:/tools` collide.
    pub fn prepend_path(&mut self, name: &str, value: &str, delete_existing: bool) {
        let existing = self.vars.get(name).cloned().unwrap_or_default();
        let mut merged: Vec<&str> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        if delete_existing {
            for part in value
                .split(PATH_LIST_SEPARATOR)
                .chain(existing.split(PATH_LIST_SEPARATOR))
            {
                if part.is_empty() {
                    continue;
                }
                if seen.insert(normalize_segment(part)) {
                    merged.push(part);
                }
            }
        } else {
            let existing_keys: HashSet<String> = existing
                .split(PATH_LIST_SEPARATOR)
                .filter(|part| !part.is_empty())
                .map(normalize_segment)
                .collect();
            for part in value.split(PATH_LIST_SEPARATOR) {
                if part.is_empty() || existing_keys.contains(&normalize_segment(part)) {
                    continue;
                }
                if seen.insert(normalize_segment(part)) {
                    merged.push(part);
                }
            }
            merged.extend(
                existing
                    .split(PATH_LIST_SEPARATOR)
                    .filter(|part| !part.is_empty()),
            );
        }

        let joined = merged.join(&PATH_LIST_SEPARATOR.to_string());
        self.vars.insert(name.to_string(), joined);
    }
}

/// Dedup key for one path segment.
fn normalize_segment(segment: &str) -> String {
    segment
        .trim_end_matches(['\\', '/'])
        .replace('/', "\\")
        .to_ascii_lowercase()
}

/// Interpret a configuration value as a boolean where possible.
///
/// Returns `None` for anything that is neither clearly true nor clearly
/// false, letting callers treat such values as data (e.g. a script path).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip() {
        let mut env = BuildEnv::new();
        assert!(env.get("MSVC_VERSION").is_none());
        env.set("MSVC_VERSION", "14.2");
        assert_eq!(env.get("MSVC_VERSION"), Some("14.2"));
        env.unset("MSVC_VERSION");
        assert!(env.get("MSVC_VERSION").is_none());
    }

    #[test]
    fn subst_reads_own_variables() {
        let mut env = BuildEnv::new();
        env.set("MSVC_USE_SCRIPT_ARGS", "amd64 store");
        assert_eq!(env.subst("$MSVC_USE_SCRIPT_ARGS"), "amd64 store");
        assert_eq!(env.subst("$UNSET_ARGS"), "");
    }

    #[test]
    fn prepend_path_prepends_in_order() {
        let mut env = BuildEnv::new();
        env.set("PATH", r"C:\old");
        env.prepend_path("PATH", r"C:\new1;C:\new2", true);
        assert_eq!(env.get("PATH"), Some(r"C:\new1;C:\new2;C:\old"));
    }

    #[test]
    fn prepend_path_moves_duplicates_forward_when_deleting() {
        let mut env = BuildEnv::new();
        env.set("PATH", r"C:\a;C:\b;C:\c");
        env.prepend_path("PATH", r"C:\b", true);
        assert_eq!(env.get("PATH"), Some(r"C:\b;C:\a;C:\c"));
    }

    #[test]
    fn prepend_path_keeps_duplicates_in_place_otherwise() {
        let mut env = BuildEnv::new();
        env.set("PATH", r"C:\a;C:\b");
        env.prepend_path("PATH", r"C:\b;C:\c", false);
        assert_eq!(env.get("PATH"), Some(r"C:\c;C:\a;C:\b"));
    }

    #[test]
    fn prepend_path_dedup_is_case_and_slash_insensitive() {
        let mut env = BuildEnv::new();
        env.set("INCLUDE", r"C:\Program Files\Include\");
        env.prepend_path("INCLUDE", r"c:/program files/include", true);
        assert_eq!(env.get("INCLUDE"), Some("c:/program files/include"));
    }

    #[test]
    fn prepend_path_skips_empty_segments() {
        let mut env = BuildEnv::new();
        env.prepend_path("LIB", r";C:\lib;;", true);
        assert_eq!(env.get("LIB"), Some(r"C:\lib"));
    }

    #[test]
    fn prepend_path_starts_absent_variable() {
        let mut env = BuildEnv::new();
        env.prepend_path("LIBPATH", r"C:\libpath", true);
        assert_eq!(env.get("LIBPATH"), Some(r"C:\libpath"));
    }

    #[test]
    fn parse_bool_recognizes_both_polarities() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool(r"C:\custom\vars.bat"), None);
    }
}
