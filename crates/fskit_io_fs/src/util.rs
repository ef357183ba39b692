use std::fs;
use std::io;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::conf::N_MODE_DIR_DEFAULT;
use crate::spec::{EnumPatternMode, FsError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

pub(crate) fn compile_patterns(
    patterns: Option<&[String]>,
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>, FsError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| FsError::InvalidPattern(format!("{pattern}: {e}")))?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern)
                    .map_err(|e| FsError::InvalidPattern(format!("{pattern}: {e}")))?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

fn _is_pattern_matching(value: &str, patterns: &TypePatternSeq) -> bool {
    match patterns {
        TypePatternSeq::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
        TypePatternSeq::Glob(v) => v.iter().any(|p| p.is_match(value)),
        TypePatternSeq::Regex(v) => v.iter().any(|p| p.is_match(value)),
    }
}

/// Missing include list admits everything; missing exclude list rejects nothing.
pub(crate) fn should_exclude_by_patterns(
    value: &str,
    patterns_include: Option<&TypePatternSeq>,
    patterns_exclude: Option<&TypePatternSeq>,
) -> bool {
    let b_included = patterns_include.is_none_or(|p| _is_pattern_matching(value, p));
    let b_excluded = patterns_exclude.is_some_and(|p| _is_pattern_matching(value, p));
    !b_included || b_excluded
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Create `path` and its missing ancestors with `mode` (unix only).
pub(crate) fn create_dir_all_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }
    builder.create(path)
}

/// Create the parent directory of `path` when it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    let Some(path_parent) = path.parent() else {
        return Ok(());
    };
    if path_parent.as_os_str().is_empty() || path_parent.is_dir() {
        return Ok(());
    }
    create_dir_all_with_mode(path_parent, N_MODE_DIR_DEFAULT)
}

/// Create a symbolic link at `path_dst` pointing at the literal `target`.
///
/// `path_src` is only consulted on Windows to pick file vs directory links.
pub(crate) fn create_symbolic_link(
    target: &Path,
    path_src: &Path,
    path_dst: &Path,
) -> io::Result<()> {
    #[cfg(unix)]
    {
        let _ = path_src;
        std::os::unix::fs::symlink(target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(target, path_dst)
        } else {
            symlink_file(target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_src, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// `(device, inode)` pair identifying the entry behind `meta`.
#[cfg(unix)]
pub(crate) fn file_identity(meta: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
pub(crate) fn file_identity(_meta: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

/// Whether two paths refer to the same underlying file.
pub(crate) fn is_same_file(
    path_a: &Path,
    meta_a: &fs::Metadata,
    path_b: &Path,
    meta_b: &fs::Metadata,
) -> bool {
    match (file_identity(meta_a), file_identity(meta_b)) {
        (Some(id_a), Some(id_b)) => id_a == id_b,
        _ => match (fs::canonicalize(path_a), fs::canonicalize(path_b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
