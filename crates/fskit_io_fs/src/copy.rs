//! Single-file, symlink and directory-tree copy with overwrite policies.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::conf::{N_SIZE_FAST_COPY_BUFFER, derive_copy_buffer_size};
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{EnumFileCoverPolicy, FsError};
use crate::util::{
    create_dir_all_with_mode, create_symbolic_link, ensure_parent_dir, file_identity, is_same_file,
};

#[derive(Debug)]
struct SpecCopyDirContext {
    rule_cover: EnumFileCoverPolicy,
    builder_cp_report: ReportCopyBuilder,
    set_visited_dirs: HashSet<(u64, u64)>,
}

////////////////////////////////////////////////////////////////////////////////
// #region Transfer

/// Read/write loop with a caller-sized buffer.
///
/// Returns the bytes written before the first failure together with that
/// failure, so partial progress is never lost.
fn _copy_with_buffer(
    file_src: &mut File,
    file_dst: &mut File,
    n_size_buffer: usize,
) -> (u64, Option<io::Error>) {
    let mut buf = vec![0_u8; n_size_buffer];
    let mut n_total: u64 = 0;
    loop {
        let n_read = match file_src.read(&mut buf) {
            Ok(0) => return (n_total, None),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (n_total, Some(e)),
        };
        if let Err(e) = file_dst.write_all(&buf[..n_read]) {
            return (n_total, Some(e));
        }
        n_total += n_read as u64;
    }
}

fn _is_same_path(path_src: &Path, path_dst: &Path) -> bool {
    path_src.as_os_str() == path_dst.as_os_str()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SingleFile

/// Copy one regular file from `source` to `dest` under `policy`.
///
/// - identical paths are a no-op;
/// - the source must be a regular file (symlinks are followed);
/// - an existing destination is skipped (`Ignore`) or rejected (`Deny`);
/// - missing destination parents are created.
///
/// Files up to 1 MiB go through a manual buffer loop (51200 bytes below
/// 512 KiB, otherwise 102400). Larger files use `io::copy` and then receive
/// the source permissions.
///
/// The report carries the bytes actually written and, on failure, the first
/// error encountered.
pub fn copy_file<P, Q>(source: P, dest: Q, policy: EnumFileCoverPolicy) -> ReportCopy
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_src = source.as_ref();
    let path_dst = dest.as_ref();
    let mut builder_cp_report = ReportCopyBuilder::default();

    if _is_same_path(path_src, path_dst) {
        return builder_cp_report.build();
    }

    if let Err(e) = _copy_file_inner(path_src, path_dst, policy, &mut builder_cp_report) {
        builder_cp_report.add_error(e);
    }
    builder_cp_report.build()
}

fn _copy_file_inner(
    path_src: &Path,
    path_dst: &Path,
    policy: EnumFileCoverPolicy,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), FsError> {
    let meta_src = fs::metadata(path_src).map_err(|e| FsError::from_io(path_src, e))?;
    if !meta_src.is_file() {
        return Err(FsError::NotRegularFile(path_src.to_path_buf()));
    }

    if policy != EnumFileCoverPolicy::Allow && fs::metadata(path_dst).is_ok() {
        match policy {
            EnumFileCoverPolicy::Ignore => {
                tracing::debug!("copy_file: keep existing {}", path_dst.display());
                builder_cp_report.add_skipped();
                return Ok(());
            }
            EnumFileCoverPolicy::Deny => {
                return Err(FsError::AlreadyExists(path_dst.to_path_buf()));
            }
            EnumFileCoverPolicy::Allow => {}
        }
    }

    let mut file_src = File::open(path_src).map_err(|e| FsError::from_io(path_src, e))?;
    ensure_parent_dir(path_dst).map_err(|e| FsError::from_io(path_dst, e))?;
    let mut file_dst = File::create(path_dst).map_err(|e| FsError::from_io(path_dst, e))?;

    let n_size_src = meta_src.len();
    match derive_copy_buffer_size(n_size_src) {
        Some(n_size_buffer) => {
            let (n_bytes, err) = _copy_with_buffer(&mut file_src, &mut file_dst, n_size_buffer);
            builder_cp_report.add_bytes(n_bytes);
            if let Some(e) = err {
                return Err(FsError::from_io(path_dst, e));
            }
        }
        None => match io::copy(&mut file_src, &mut file_dst) {
            Ok(n_bytes) => {
                builder_cp_report.add_bytes(n_bytes);
                fs::set_permissions(path_dst, meta_src.permissions())
                    .map_err(|e| FsError::from_io(path_dst, e))?;
            }
            Err(e) => {
                let n_bytes = file_dst.metadata().map(|m| m.len()).unwrap_or(0);
                builder_cp_report.add_bytes(n_bytes);
                return Err(FsError::from_io(path_dst, e));
            }
        },
    }

    builder_cp_report.add_copied();
    tracing::debug!(
        "copy_file: {} -> {} ({} bytes)",
        path_src.display(),
        path_dst.display(),
        builder_cp_report.cnt_bytes
    );
    Ok(())
}

/// Copy without existence, kind or policy checks, using a 32 KiB buffer.
///
/// Meant for trusted, pre-validated inputs. Any failure ends the copy; the
/// report keeps the bytes written so far.
pub fn fast_copy<P, Q>(source: P, dest: Q) -> ReportCopy
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_src = source.as_ref();
    let path_dst = dest.as_ref();
    let mut builder_cp_report = ReportCopyBuilder::default();

    let res_copy = (|| -> Result<(), FsError> {
        let mut file_src = File::open(path_src).map_err(|e| FsError::from_io(path_src, e))?;
        ensure_parent_dir(path_dst).map_err(|e| FsError::from_io(path_dst, e))?;
        let mut file_dst = File::create(path_dst).map_err(|e| FsError::from_io(path_dst, e))?;
        let (n_bytes, err) =
            _copy_with_buffer(&mut file_src, &mut file_dst, N_SIZE_FAST_COPY_BUFFER);
        builder_cp_report.add_bytes(n_bytes);
        match err {
            Some(e) => Err(FsError::from_io(path_dst, e)),
            None => Ok(()),
        }
    })();

    match res_copy {
        Ok(()) => builder_cp_report.add_copied(),
        Err(e) => builder_cp_report.add_error(e),
    }
    builder_cp_report.build()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Symlink

/// Recreate the symlink `source` at `dest` with the same target text.
///
/// An existing entry at `dest` is removed first. The target is not resolved,
/// so relative links stay relative.
pub fn copy_link<P, Q>(source: P, dest: Q) -> Result<(), FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_src = source.as_ref();
    let path_dst = dest.as_ref();
    if _is_same_path(path_src, path_dst) {
        return Ok(());
    }

    let path_target = match fs::read_link(path_src) {
        Ok(v) => v,
        Err(e) => {
            if fs::symlink_metadata(path_src).is_ok() {
                return Err(FsError::NotSymlink(path_src.to_path_buf()));
            }
            return Err(FsError::from_io(path_src, e));
        }
    };

    if let Ok(meta_dst) = fs::symlink_metadata(path_dst) {
        let res_remove = if meta_dst.file_type().is_dir() {
            fs::remove_dir(path_dst)
        } else {
            fs::remove_file(path_dst)
        };
        if let Err(e) = res_remove {
            tracing::warn!("copy_link: cannot remove {} ({e})", path_dst.display());
        }
    }

    ensure_parent_dir(path_dst).map_err(|e| FsError::from_io(path_dst, e))?;
    create_symbolic_link(&path_target, path_src, path_dst)
        .map_err(|e| FsError::from_io(path_dst, e))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Directory

/// Replicate the directory `source` into `dest` under `policy`.
///
/// `dest` and its parents are created with the source mode. Children are
/// handled one by one:
/// - directories recurse with the same policy;
/// - an existing non-directory destination is skipped for `Ignore`/`Deny`,
///   and for `Allow` only when it is the very same file;
/// - symlinks are recreated via [`copy_link`], everything else goes through
///   [`copy_file`].
///
/// Failures do not stop sibling processing and nothing is rolled back: the
/// report sums the bytes of every successful file and lists every error, the
/// last one being the surfaced error. Directories already visited in this
/// call (by device and inode) are not entered again, which keeps a
/// destination nested inside its source from being copied into itself.
pub fn copy_dir<P, Q>(source: P, dest: Q, policy: EnumFileCoverPolicy) -> ReportCopy
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = source.as_ref();
    let path_dir_dst = dest.as_ref();
    let mut spec_cp_ctx = SpecCopyDirContext {
        rule_cover: policy,
        builder_cp_report: ReportCopyBuilder::default(),
        set_visited_dirs: HashSet::new(),
    };

    if path_dir_dst.as_os_str().is_empty() {
        spec_cp_ctx
            .builder_cp_report
            .add_error(FsError::InvalidPath("copy_dir: destination is empty".to_string()));
        return spec_cp_ctx.builder_cp_report.build();
    }

    if let Err(e) = walk_copy_directory(path_dir_src, path_dir_dst, &mut spec_cp_ctx) {
        spec_cp_ctx.builder_cp_report.add_error(e);
    }
    let report = spec_cp_ctx.builder_cp_report.build();
    tracing::debug!(
        "copy_dir: {} -> {} {}",
        path_dir_src.display(),
        path_dir_dst.display(),
        report
    );
    report
}

fn _mode_of(meta: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o7777
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        0o777
    }
}

/// Copy one directory level; only setup failures of this level are returned.
fn walk_copy_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyDirContext,
) -> Result<(), FsError> {
    let meta_dir_src = fs::metadata(path_dir_src).map_err(|e| FsError::from_io(path_dir_src, e))?;
    if !meta_dir_src.is_dir() {
        return Err(FsError::NotDirectory(path_dir_src.to_path_buf()));
    }

    if let Some(id_src) = file_identity(&meta_dir_src) {
        if !spec_cp_ctx.set_visited_dirs.insert(id_src) {
            spec_cp_ctx
                .builder_cp_report
                .add_warning(format!("Directory loop skipped: {}", path_dir_src.display()));
            tracing::warn!("copy_dir: directory loop skipped at {}", path_dir_src.display());
            return Ok(());
        }
    }

    create_dir_all_with_mode(path_dir_dst, _mode_of(&meta_dir_src))
        .map_err(|e| FsError::from_io(path_dir_dst, e))?;
    if let Ok(meta_dir_dst) = fs::metadata(path_dir_dst) {
        if let Some(id_dst) = file_identity(&meta_dir_dst) {
            spec_cp_ctx.set_visited_dirs.insert(id_dst);
        }
    }

    let iter_entries =
        fs::read_dir(path_dir_src).map_err(|e| FsError::from_io(path_dir_src, e))?;
    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        match entry_res {
            Ok(entry) => l_entries.push(entry),
            Err(e) => spec_cp_ctx
                .builder_cp_report
                .add_error(FsError::from_io(path_dir_src, e)),
        }
    }
    l_entries.sort_by_key(|entry| entry.file_name());

    for entry in l_entries {
        let path_entry_src = entry.path();
        let path_entry_dst = path_dir_dst.join(entry.file_name());
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_cp_ctx
                    .builder_cp_report
                    .add_error(FsError::from_io(&path_entry_src, e));
                continue;
            }
        };

        if cfg_file_type.is_dir() {
            if let Err(e) = walk_copy_directory(&path_entry_src, &path_entry_dst, spec_cp_ctx) {
                spec_cp_ctx.builder_cp_report.add_error(e);
            }
            continue;
        }

        if should_skip_existing_entry(&path_entry_src, &path_entry_dst, spec_cp_ctx.rule_cover) {
            spec_cp_ctx.builder_cp_report.add_skipped();
            continue;
        }

        if cfg_file_type.is_symlink() {
            match copy_link(&path_entry_src, &path_entry_dst) {
                Ok(()) => spec_cp_ctx.builder_cp_report.add_copied(),
                Err(e) => spec_cp_ctx.builder_cp_report.add_error(e),
            }
            continue;
        }

        let report_file = copy_file(&path_entry_src, &path_entry_dst, spec_cp_ctx.rule_cover);
        spec_cp_ctx.builder_cp_report.merge(report_file);
    }
    Ok(())
}

/// Existing destinations are kept for `Ignore`/`Deny`; `Allow` only refuses
/// to overwrite a file with itself.
fn should_skip_existing_entry(
    path_entry_src: &Path,
    path_entry_dst: &Path,
    rule_cover: EnumFileCoverPolicy,
) -> bool {
    let Ok(meta_dst) = fs::metadata(path_entry_dst) else {
        return false;
    };
    match rule_cover {
        EnumFileCoverPolicy::Ignore | EnumFileCoverPolicy::Deny => {
            tracing::debug!("copy_dir: keep existing {}", path_entry_dst.display());
            true
        }
        EnumFileCoverPolicy::Allow => match fs::symlink_metadata(path_entry_src) {
            Ok(meta_src) => is_same_file(path_entry_src, &meta_src, path_entry_dst, &meta_dst),
            Err(_) => false,
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
