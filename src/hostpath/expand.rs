//! Candidate-path expansion: user home, environment variables, canonical
//! form, and case normalization.
//!
//! Environment references come in both `$NAME`/`${NAME}` and Windows
//! `%NAME%` spellings; the latter matters because well-known install
//! locations are written as `%ProgramFiles(x86)%\...` templates. Missing
//! variables are left untouched rather than erased, so a template that
//! cannot expand simply fails the existence check later.

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
pub(super) fn expand_user(path: &str) -> String {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().into_owned();
        }
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix(r"~\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

/// Expand `$NAME`, `${NAME}`, and `%NAME%` references via `lookup`.
///
/// `%NAME%` names may contain anything but `%`, covering variables like
/// `ProgramFiles(x86)`. Unresolvable references stay as written.
pub(super) fn expand_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let name: String = chars.clone().take_while(|&c| c != '%').collect();
                let closed = chars.clone().nth(name.chars().count()) == Some('%');
                if closed && !name.is_empty() {
                    for _ in 0..=name.chars().count() {
                        chars.next();
                    }
                    match lookup(&name) {
                        Some(value) => result.push_str(&value),
                        None => {
                            result.push('%');
                            result.push_str(&name);
                            result.push('%');
                        }
                    }
                } else {
                    result.push('%');
                }
            }
            '$' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        name.push(c);
                    }
                    match lookup(&name) {
                        Some(value) => result.push_str(&value),
                        None => {
                            result.push_str("${");
                            result.push_str(&name);
                            result.push('}');
                        }
                    }
                }
                Some(next) if next.is_ascii_alphabetic() || *next == '_' => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    match lookup(&name) {
                        Some(value) => result.push_str(&value),
                        None => {
                            result.push('$');
                            result.push_str(&name);
                        }
                    }
                }
                _ => result.push('$'),
            },
            _ => result.push(c),
        }
    }

    result
}

/// Resolve to a canonical absolute path.
///
/// Symlinks are resolved when the path exists; otherwise the path is made
/// absolute and simplified lexically so it still works as a dedup key.
pub(super) fn canonical(path: &str) -> PathBuf {
    let p = Path::new(path);
    if let Ok(real) = p.canonicalize() {
        return real;
    }

    let absolute = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(p)
    };

    let mut simplified = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                simplified.pop();
            }
            other => simplified.push(other),
        }
    }
    simplified
}

/// Case-normalize for deduplication on case-insensitive filesystems.
///
/// Also drops the `\\?\` prefix `canonicalize` produces, which glob
/// patterns cannot contain.
#[cfg(windows)]
pub(super) fn normcase(path: PathBuf) -> PathBuf {
    let text = path.to_string_lossy().replace('/', "\\").to_lowercase();
    PathBuf::from(text.strip_prefix(r"\\?\").unwrap_or(&text))
}

#[cfg(not(windows))]
pub(super) fn normcase(path: PathBuf) -> PathBuf {
    path
}
