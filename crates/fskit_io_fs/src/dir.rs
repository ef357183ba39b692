//! Directory and file lifecycle: create, pre-size, rename, delete, measure.

use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use walkdir::WalkDir;

use crate::conf::N_MODE_FILE_TOUCH;
use crate::path::absolute_path;
use crate::spec::FsError;
use crate::util::{create_dir_all_with_mode, ensure_parent_dir};

/// Create or truncate `path` and sparsely extend it to `size` bytes.
///
/// Missing parents are created. For `size > 1` only the last byte is
/// written. Returns `false` when the parent or the file cannot be created.
pub fn touch<P: AsRef<Path>>(path: P, size: u64) -> bool {
    let path = path.as_ref();
    if let Err(e) = ensure_parent_dir(path) {
        tracing::debug!("touch: cannot create parent of {} ({e})", path.display());
        return false;
    }

    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(N_MODE_FILE_TOUCH);
    }
    let mut file = match opts.open(path) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("touch: cannot open {} ({e})", path.display());
            return false;
        }
    };

    if size > 1 {
        let res_extend = file
            .seek(SeekFrom::Start(size - 1))
            .and_then(|_| file.write_all(&[0_u8]));
        if let Err(e) = res_extend {
            tracing::warn!("touch: cannot extend {} to {size} bytes ({e})", path.display());
        }
    }
    true
}

/// Create `path` and missing ancestors with `mode`.
pub fn mkdir<P: AsRef<Path>>(path: P, mode: u32) -> io::Result<()> {
    create_dir_all_with_mode(path.as_ref(), mode)
}

pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<()> {
    fs::rename(from, to)
}

/// Remove a file or an empty directory.
pub fn unlink<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(path),
        _ => fs::remove_file(path),
    }
}

/// Remove every child of `dir`, and `dir` itself when `delete_root` is set.
///
/// All children are attempted; the last failure is returned. The root is
/// only removed once every child is gone. A symlink root is not followed and
/// fails with [`FsError::NotDirectory`].
pub fn delete_directory<P: AsRef<Path>>(dir: P, delete_root: bool) -> Result<(), FsError> {
    let path_dir = absolute_path(dir);
    let meta_dir = fs::symlink_metadata(&path_dir).map_err(|e| FsError::from_io(&path_dir, e))?;
    if !meta_dir.is_dir() {
        return Err(FsError::NotDirectory(path_dir));
    }

    let iter_entries = fs::read_dir(&path_dir).map_err(|e| FsError::from_io(&path_dir, e))?;
    let mut err_last: Option<FsError> = None;
    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                err_last = Some(FsError::from_io(&path_dir, e));
                continue;
            }
        };
        let path_entry = entry.path();
        let b_is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        let res_remove = if b_is_dir {
            fs::remove_dir_all(&path_entry)
        } else {
            fs::remove_file(&path_entry)
        };
        if let Err(e) = res_remove {
            tracing::debug!("delete_directory: cannot remove {} ({e})", path_entry.display());
            err_last = Some(FsError::from_io(&path_entry, e));
        }
    }

    if let Some(e) = err_last {
        return Err(e);
    }
    if delete_root {
        fs::remove_dir(&path_dir).map_err(|e| FsError::from_io(&path_dir, e))?;
    }
    Ok(())
}

/// Sum of all non-directory entry sizes under `path`; `0` when unreadable.
///
/// Symlinks count with their own size and are not followed.
pub fn directory_size<P: AsRef<Path>>(path: P) -> u64 {
    WalkDir::new(path.as_ref())
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{delete_directory, directory_size, mkdir, rename, touch, unlink};
    use crate::spec::FsError;
    #[cfg(unix)]
    use crate::platform::{HostPlatform, PlatformProbe};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    #[test]
    fn touch_sparse_allocates_size() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for c_rel in ["a.bin", "fresh/b.bin", "fresh/deeper/c.bin"] {
            let path_file = tmp.path().join(c_rel);
            assert!(touch(&path_file, 2_097_152));
            assert_eq!(fs::metadata(&path_file).expect("metadata").len(), 2_097_152);
        }

        let path_small = tmp.path().join("one.bin");
        assert!(touch(&path_small, 1));
        assert_eq!(fs::metadata(&path_small).expect("metadata").len(), 0);
        assert!(touch(&path_small, 0));
        assert_eq!(fs::metadata(&path_small).expect("metadata").len(), 0);
    }

    #[test]
    fn touch_truncates_existing_and_fails_on_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("keep.txt");
        write_text(&path_file, "previous content");
        assert!(touch(&path_file, 4));
        assert_eq!(fs::read(&path_file).expect("read"), vec![0_u8; 4]);

        assert!(!touch(tmp.path(), 10));
    }

    #[test]
    fn mkdir_rename_unlink_delegate() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("x/y");
        mkdir(&path_dir, 0o755).expect("mkdir");
        assert!(path_dir.is_dir());

        let path_old = tmp.path().join("old.txt");
        let path_new = tmp.path().join("new.txt");
        write_text(&path_old, "1");
        rename(&path_old, &path_new).expect("rename");
        assert!(!path_old.exists());
        assert!(path_new.exists());

        unlink(&path_new).expect("unlink file");
        assert!(!path_new.exists());
        unlink(&path_dir).expect("unlink empty dir");
        assert!(!path_dir.exists());

        let err = unlink(tmp.path().join("missing")).expect_err("missing");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(rename(tmp.path().join("missing"), tmp.path().join("m2")).is_err());
    }

    #[test]
    fn delete_directory_clears_or_removes_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("a.txt"), "a");
        write_text(&root.join("sub/b.txt"), "b");

        delete_directory(&root, false).expect("clear");
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).expect("read_dir").count(), 0);

        write_text(&root.join("c.txt"), "c");
        delete_directory(&root, true).expect("remove");
        assert!(!root.exists());
    }

    #[test]
    fn delete_directory_rejects_non_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        write_text(&path_file, "f");

        let err = delete_directory(&path_file, true).expect_err("file");
        assert!(matches!(err, FsError::NotDirectory(_)));
        let err = delete_directory(tmp.path().join("none"), true).expect_err("missing");
        assert!(matches!(err, FsError::NotFound { .. }));
        assert!(path_file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn delete_directory_does_not_follow_symlink_root() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_target = tmp.path().join("precious");
        write_text(&path_target.join("keep.txt"), "keep");
        let path_link = tmp.path().join("link");
        symlink(&path_target, &path_link).expect("symlink");

        for b_delete_root in [false, true] {
            let err = delete_directory(&path_link, b_delete_root).expect_err("symlink root");
            assert!(matches!(err, FsError::NotDirectory(_)));
        }
        assert!(path_target.join("keep.txt").exists());
        assert!(path_link.is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn delete_directory_keeps_going_and_returns_last_error() {
        use std::os::unix::fs::PermissionsExt;

        if HostPlatform.is_privileged() {
            return;
        }
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("a.txt"), "a");
        write_text(&root.join("sub/b.txt"), "b");
        write_text(&root.join("locked/inner.txt"), "inner");
        write_text(&root.join("z.txt"), "z");
        let path_locked = root.join("locked");
        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o555)).expect("chmod");

        let res_delete = delete_directory(&root, true);
        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o755)).expect("chmod");

        let err = res_delete.expect_err("locked child");
        assert!(matches!(err, FsError::PermissionDenied { .. }));
        assert!(!root.join("a.txt").exists());
        assert!(!root.join("sub").exists());
        assert!(!root.join("z.txt").exists());
        assert!(path_locked.join("inner.txt").exists());
        assert!(root.is_dir());
    }

    #[test]
    fn directory_size_sums_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "12345");
        write_text(&tmp.path().join("x/y/b.txt"), "123");
        assert!(touch(tmp.path().join("x/c.bin"), 1000));

        assert_eq!(directory_size(tmp.path()), 1008);
        assert_eq!(directory_size(tmp.path().join("a.txt")), 5);
        assert_eq!(directory_size(tmp.path().join("none")), 0);
    }
}
