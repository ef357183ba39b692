//! Recursive directory enumeration with scope and predicate filtering.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::spec::{EnumFileTreeScope, EnumPatternMode, FsError};
use crate::util::{TypePatternSeq, compile_patterns, file_identity, should_exclude_by_patterns};

/// Predicate applied to non-directory candidates.
pub type TypeTreeFilter<'a> = &'a dyn Fn(&Path) -> bool;

/// Compiled include/exclude basename patterns usable as a tree filter.
#[derive(Debug, Clone, Default)]
pub struct SpecTreePatterns {
    patterns_include: Option<TypePatternSeq>,
    patterns_exclude: Option<TypePatternSeq>,
}

impl SpecTreePatterns {
    pub fn from_raw(
        patterns_include: Option<&[String]>,
        patterns_exclude: Option<&[String]>,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, FsError> {
        Ok(Self {
            patterns_include: compile_patterns(patterns_include, rule_pattern)?,
            patterns_exclude: compile_patterns(patterns_exclude, rule_pattern)?,
        })
    }

    /// Whether the basename of `path` passes include and exclude lists.
    pub fn is_match(&self, path: &Path) -> bool {
        let c_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        !should_exclude_by_patterns(
            &c_name,
            self.patterns_include.as_ref(),
            self.patterns_exclude.as_ref(),
        )
    }
}

struct SpecTreeWalkContext<'a> {
    rule_scope: EnumFileTreeScope,
    if_recursive: bool,
    filters: &'a [TypeTreeFilter<'a>],
    set_visited_dirs: HashSet<(u64, u64)>,
    l_paths: Vec<PathBuf>,
}

/// Enumerate entries under `root`.
///
/// A non-directory root (including a symlink to a directory) yields itself
/// unless `scope` is [`EnumFileTreeScope::DirectoriesOnly`]. Otherwise
/// children are visited in name order:
/// - a directory is yielded unless `scope` is `FilesOnly`, then walked when
///   `recursive` is set;
/// - anything else is yielded unless `scope` is `DirectoriesOnly`, and only
///   when every filter accepts it.
///
/// Symlinked directories are reported as entries, never descended.
/// Unreadable directories contribute nothing.
pub fn file_tree<P: AsRef<Path>>(
    root: P,
    scope: EnumFileTreeScope,
    recursive: bool,
    filters: &[TypeTreeFilter<'_>],
) -> Vec<PathBuf> {
    let path_root = root.as_ref();
    if path_root.as_os_str().is_empty() {
        return Vec::new();
    }

    let Ok(meta_root) = fs::symlink_metadata(path_root) else {
        return Vec::new();
    };
    if !meta_root.is_dir() {
        if scope == EnumFileTreeScope::DirectoriesOnly {
            return Vec::new();
        }
        return vec![path_root.to_path_buf()];
    }

    let mut spec_walk_ctx = SpecTreeWalkContext {
        rule_scope: scope,
        if_recursive: recursive,
        filters,
        set_visited_dirs: HashSet::new(),
        l_paths: Vec::new(),
    };
    walk_tree_directory(path_root, &mut spec_walk_ctx);
    spec_walk_ctx.l_paths
}

fn walk_tree_directory(path_dir: &Path, spec_walk_ctx: &mut SpecTreeWalkContext<'_>) {
    if let Some(id_dir) = fs::metadata(path_dir).ok().as_ref().and_then(file_identity) {
        if !spec_walk_ctx.set_visited_dirs.insert(id_dir) {
            tracing::warn!("file_tree: directory loop skipped at {}", path_dir.display());
            return;
        }
    }

    let iter_entries = match fs::read_dir(path_dir) {
        Ok(iter) => iter,
        Err(e) => {
            tracing::debug!("file_tree: cannot read {} ({e})", path_dir.display());
            return;
        }
    };

    let mut l_entries: Vec<(PathBuf, bool)> = iter_entries
        .filter_map(Result::ok)
        .map(|entry| {
            let b_is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            (entry.path(), b_is_dir)
        })
        .collect();
    l_entries.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

    for (path_entry, b_is_dir) in l_entries {
        if b_is_dir {
            if spec_walk_ctx.rule_scope != EnumFileTreeScope::FilesOnly {
                spec_walk_ctx.l_paths.push(path_entry.clone());
            }
            if spec_walk_ctx.if_recursive {
                walk_tree_directory(&path_entry, spec_walk_ctx);
            }
            continue;
        }

        if spec_walk_ctx.rule_scope == EnumFileTreeScope::DirectoriesOnly {
            continue;
        }
        if spec_walk_ctx.filters.iter().all(|f| f(&path_entry)) {
            spec_walk_ctx.l_paths.push(path_entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{SpecTreePatterns, TypeTreeFilter, file_tree};
    use crate::spec::{EnumFileTreeScope, EnumPatternMode, FsError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn build_sample(root: &Path) {
        write_text(&root.join("a.txt"), "a");
        write_text(&root.join("b.rs"), "b");
        write_text(&root.join("sub/c.txt"), "c");
        write_text(&root.join("sub/deep/d.rs"), "d");
    }

    fn relative(root: &Path, l_paths: &[PathBuf]) -> Vec<String> {
        l_paths
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn empty_and_missing_roots_yield_nothing() {
        assert!(file_tree("", EnumFileTreeScope::All, true, &[]).is_empty());
        assert!(file_tree("/no/such/root", EnumFileTreeScope::All, true, &[]).is_empty());
    }

    #[test]
    fn file_root_yields_itself_unless_directories_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("one.txt");
        write_text(&path_file, "1");

        assert_eq!(
            file_tree(&path_file, EnumFileTreeScope::All, true, &[]),
            vec![path_file.clone()]
        );
        assert_eq!(
            file_tree(&path_file, EnumFileTreeScope::FilesOnly, false, &[]),
            vec![path_file.clone()]
        );
        assert!(file_tree(&path_file, EnumFileTreeScope::DirectoriesOnly, true, &[]).is_empty());
    }

    #[test]
    fn recursive_all_lists_everything_in_name_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_sample(tmp.path());

        let l_paths = file_tree(tmp.path(), EnumFileTreeScope::All, true, &[]);
        assert_eq!(
            relative(tmp.path(), &l_paths),
            vec!["a.txt", "b.rs", "sub", "sub/c.txt", "sub/deep", "sub/deep/d.rs"]
        );
    }

    #[test]
    fn scopes_restrict_entry_kinds() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_sample(tmp.path());

        let l_dirs = file_tree(tmp.path(), EnumFileTreeScope::DirectoriesOnly, false, &[]);
        assert_eq!(relative(tmp.path(), &l_dirs), vec!["sub"]);

        let l_dirs = file_tree(tmp.path(), EnumFileTreeScope::DirectoriesOnly, true, &[]);
        assert_eq!(relative(tmp.path(), &l_dirs), vec!["sub", "sub/deep"]);

        let l_files = file_tree(tmp.path(), EnumFileTreeScope::FilesOnly, true, &[]);
        assert_eq!(
            relative(tmp.path(), &l_files),
            vec!["a.txt", "b.rs", "sub/c.txt", "sub/deep/d.rs"]
        );
        assert!(l_files.iter().all(|p| p.is_file()));
    }

    #[test]
    fn filters_apply_to_files_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_sample(tmp.path());

        let is_rs = |p: &Path| p.extension().is_some_and(|e| e == "rs");
        let filters: [TypeTreeFilter<'_>; 1] = [&is_rs];
        let l_paths = file_tree(tmp.path(), EnumFileTreeScope::All, true, &filters);
        assert_eq!(
            relative(tmp.path(), &l_paths),
            vec!["b.rs", "sub", "sub/deep", "sub/deep/d.rs"]
        );

        let reject_all = |_: &Path| false;
        let filters: [TypeTreeFilter<'_>; 2] = [&is_rs, &reject_all];
        let l_paths = file_tree(tmp.path(), EnumFileTreeScope::FilesOnly, true, &filters);
        assert!(l_paths.is_empty());
    }

    #[test]
    fn tree_patterns_as_filter() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_sample(tmp.path());

        let spec_pats = SpecTreePatterns::from_raw(
            Some(&["*.txt".to_string()]),
            None,
            EnumPatternMode::Glob,
        )
        .expect("valid glob");
        let is_match = |p: &Path| spec_pats.is_match(p);
        let filters: [TypeTreeFilter<'_>; 1] = [&is_match];
        let l_paths = file_tree(tmp.path(), EnumFileTreeScope::FilesOnly, true, &filters);
        assert_eq!(relative(tmp.path(), &l_paths), vec!["a.txt", "sub/c.txt"]);

        let spec_pats = SpecTreePatterns::from_raw(
            None,
            Some(&["^c\\.".to_string()]),
            EnumPatternMode::Regex,
        )
        .expect("valid regex");
        assert!(spec_pats.is_match(Path::new("sub/a.txt")));
        assert!(!spec_pats.is_match(Path::new("sub/c.txt")));

        let err = SpecTreePatterns::from_raw(Some(&["(".to_string()]), None, EnumPatternMode::Regex)
            .expect_err("invalid regex");
        assert!(matches!(err, FsError::InvalidPattern(_)));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_descended() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        build_sample(tmp.path());
        symlink(tmp.path(), tmp.path().join("sub/loop")).expect("symlink");

        let l_paths = file_tree(tmp.path(), EnumFileTreeScope::All, true, &[]);
        assert_eq!(
            relative(tmp.path(), &l_paths),
            vec!["a.txt", "b.rs", "sub", "sub/c.txt", "sub/deep", "sub/deep/d.rs", "sub/loop"]
        );

        let l_paths = file_tree(tmp.path().join("sub/loop"), EnumFileTreeScope::All, true, &[]);
        assert_eq!(l_paths, vec![tmp.path().join("sub/loop")]);
    }
}
