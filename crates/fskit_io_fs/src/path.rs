//! Path normalization and decomposition.
//!
//! Nothing here touches the filesystem except [`absolute_path`] (current
//! directory lookup) and [`real_path`] (canonicalization).

use std::fs;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf, is_separator};
use std::sync::LazyLock;

use regex::Regex;

use crate::spec::{SpecPathInfo, SpecPathInfoMask};

static RE_SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\]+").expect("separator pattern is valid"));

/// Lower-cased text after the last `.` of the final segment, without the dot.
///
/// Dot-only names such as `.gitkeep` have no extension, and neither does a
/// path ending in a separator (`a.b/`).
pub fn extension<P: AsRef<Path>>(path: P) -> String {
    let c_path = path.as_ref().to_string_lossy();
    let c_segment = c_path.rsplit(is_separator).next().unwrap_or_default();
    match c_segment.rfind('.') {
        Some(n_pos) if n_pos > 0 => c_segment[n_pos + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Final path component; `"."` for an empty path.
pub fn basename<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    match path.components().next_back() {
        Some(Component::Normal(name)) => name.to_string_lossy().to_string(),
        Some(Component::RootDir) => MAIN_SEPARATOR_STR.to_string(),
        Some(Component::ParentDir) => "..".to_string(),
        Some(Component::Prefix(prefix)) => prefix.as_os_str().to_string_lossy().to_string(),
        Some(Component::CurDir) | None => ".".to_string(),
    }
}

/// Directory part of `path`, lexically cleaned; `"."` when there is none.
///
/// Everything up to the last separator is kept, so `a/b/` yields `a/b`.
pub fn dirname<P: AsRef<Path>>(path: P) -> String {
    let c_path = path.as_ref().to_string_lossy();
    let c_dir = match c_path.rfind(is_separator) {
        Some(n_pos) => &c_path[..=n_pos],
        None => "",
    };
    _clean_lexically(c_dir)
}

/// Clean a path string: drop empty and `.` segments, fold `..` into its
/// parent, keep a leading root. Empty results become `"."`.
fn _clean_lexically(path: &str) -> String {
    let b_rooted = path.starts_with(is_separator);
    let mut l_parts: Vec<&str> = Vec::new();
    for c_part in path.split(is_separator) {
        match c_part {
            "" | "." => {}
            ".." => {
                if l_parts.last().is_some_and(|p| *p != "..") {
                    l_parts.pop();
                } else if !b_rooted {
                    l_parts.push("..");
                }
            }
            other => l_parts.push(other),
        }
    }

    let c_joined = l_parts.join(MAIN_SEPARATOR_STR);
    if b_rooted {
        format!("{MAIN_SEPARATOR_STR}{c_joined}")
    } else if c_joined.is_empty() {
        ".".to_string()
    } else {
        c_joined
    }
}

/// Drop `.` components and fold `..` into their parent without touching disk.
fn _normalize_lexically(path: &Path) -> PathBuf {
    let mut path_out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let b_can_pop = matches!(
                    path_out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if b_can_pop {
                    path_out.pop();
                } else if !path_out.has_root() {
                    path_out.push("..");
                }
            }
            other => path_out.push(other.as_os_str()),
        }
    }
    path_out
}

/// Absolute, lexically cleaned form of `path`.
///
/// Falls back to joining under the filesystem root when the current
/// directory cannot be resolved; never fails.
pub fn absolute_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return _normalize_lexically(path);
    }
    match std::env::current_dir() {
        Ok(path_cwd) => _normalize_lexically(&path_cwd.join(path)),
        Err(e) => {
            tracing::warn!("Failed to resolve current directory ({e}); rooting {}", path.display());
            _normalize_lexically(&Path::new(MAIN_SEPARATOR_STR).join(path))
        }
    }
}

/// Canonical path with symlinks resolved; empty when the target is missing.
pub fn real_path<P: AsRef<Path>>(path: P) -> PathBuf {
    fs::canonicalize(path.as_ref()).unwrap_or_default()
}

/// Collapse every run of `/` and `\` into one `/`.
fn _collapse_separators(path: &str) -> String {
    RE_SEPARATOR_RUN.replace_all(path, "/").into_owned()
}

/// Directory form: collapsed separators and exactly one trailing `/`.
///
/// Empty input stays empty.
pub fn format_directory(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let c_collapsed = _collapse_separators(path);
    format!("{}/", c_collapsed.trim_end_matches('/'))
}

/// File form: collapsed separators, no trailing slash added.
pub fn format_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    _collapse_separators(path)
}

/// Decompose `path` into the fields selected by `mask`.
///
/// Extension and filename split the basename at its last `.`: a dot at
/// position 0 makes the remainder the extension; no dot leaves the extension
/// empty. The extension keeps its original case.
pub fn path_info<P: AsRef<Path>>(path: P, mask: SpecPathInfoMask) -> SpecPathInfo {
    let path = path.as_ref();
    let mut info = SpecPathInfo::default();

    if mask.contains(SpecPathInfoMask::DIRNAME) {
        info.dirname = Some(dirname(path));
    }

    let c_basename = basename(path);
    if mask.contains(SpecPathInfoMask::EXTENSION) || mask.contains(SpecPathInfoMask::FILENAME) {
        let (c_filename, c_extension) = match c_basename.rfind('.') {
            None => (c_basename.clone(), String::new()),
            Some(0) => (String::new(), c_basename[1..].to_string()),
            Some(n_pos) => (
                c_basename[..n_pos].to_string(),
                c_basename[n_pos + 1..].to_string(),
            ),
        };
        if mask.contains(SpecPathInfoMask::EXTENSION) {
            info.extension = Some(c_extension);
        }
        if mask.contains(SpecPathInfoMask::FILENAME) {
            info.filename = Some(c_filename);
        }
    }

    if mask.contains(SpecPathInfoMask::BASENAME) {
        info.basename = Some(c_basename);
    }
    info
}
