//! Whole-file and line-oriented content access.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::classify::is_image;
use crate::conf::{N_MODE_DIR_CONTENT, N_MODE_FILE_CONTENT, N_SIZE_LINE_CHUNK};
use crate::path::extension;
use crate::spec::FsError;
use crate::util::create_dir_all_with_mode;

fn _reject_empty_path(path: &Path, c_op: &str) -> Result<(), FsError> {
    if path.as_os_str().is_empty() {
        return Err(FsError::InvalidPath(format!("{c_op}: path is empty")));
    }
    Ok(())
}

fn _ensure_content_parent(path: &Path) -> Result<(), FsError> {
    match path.parent() {
        Some(path_parent) if !path_parent.as_os_str().is_empty() && !path_parent.is_dir() => {
            create_dir_all_with_mode(path_parent, N_MODE_DIR_CONTENT)
                .map_err(|e| FsError::from_io(path_parent, e))
        }
        _ => Ok(()),
    }
}

fn _strip_line_ending(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, FsError> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| FsError::from_io(path, e))
}

/// Write `data` to `path`, replacing any previous content.
///
/// Parents are created with mode `0o755`. New files get `mode` or `0o644`;
/// an explicit `mode` is also applied to an existing file.
pub fn write_file<P: AsRef<Path>>(path: P, data: &[u8], mode: Option<u32>) -> Result<(), FsError> {
    let path = path.as_ref();
    _reject_empty_path(path, "write_file")?;
    _ensure_content_parent(path)?;

    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode.unwrap_or(N_MODE_FILE_CONTENT));
    }
    let mut file = opts.open(path).map_err(|e| FsError::from_io(path, e))?;
    file.write_all(data).map_err(|e| FsError::from_io(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(n_mode) = mode {
            fs::set_permissions(path, fs::Permissions::from_mode(n_mode))
                .map_err(|e| FsError::from_io(path, e))?;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }
    Ok(())
}

/// Append `data` to `path`, creating the file (and its parents) when missing.
pub fn append_file<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<(), FsError> {
    let path = path.as_ref();
    _reject_empty_path(path, "append_file")?;
    _ensure_content_parent(path)?;

    let mut opts = OpenOptions::new();
    opts.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(N_MODE_FILE_CONTENT);
    }
    let mut file = opts.open(path).map_err(|e| FsError::from_io(path, e))?;
    file.write_all(data).map_err(|e| FsError::from_io(path, e))
}

/// All lines of a UTF-8 text file without terminators.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, FsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FsError::from_io(path, e))?;
    BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|e| FsError::from_io(path, e)))
        .collect()
}

/// First line without its terminator; empty when unreadable.
pub fn read_first_line<P: AsRef<Path>>(path: P) -> Vec<u8> {
    let Ok(file) = File::open(path.as_ref()) else {
        return Vec::new();
    };
    let mut line = Vec::new();
    if BufReader::new(file).read_until(b'\n', &mut line).is_err() {
        return Vec::new();
    }
    _strip_line_ending(line)
}

/// Last non-empty line without its terminator; empty when unreadable.
///
/// The file is scanned backwards in 4 KiB chunks, so only the tail is read.
pub fn read_last_line<P: AsRef<Path>>(path: P) -> Vec<u8> {
    let path = path.as_ref();
    match _read_last_line(path) {
        Ok(line) => line,
        Err(e) => {
            tracing::debug!("read_last_line: {} ({e})", path.display());
            Vec::new()
        }
    }
}

fn _read_last_line(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut n_pos = file.metadata()?.len();
    let mut buf = vec![0_u8; N_SIZE_LINE_CHUNK];
    let mut l_tail: Vec<u8> = Vec::new();

    while n_pos > 0 {
        let n_chunk = N_SIZE_LINE_CHUNK.min(n_pos as usize);
        n_pos -= n_chunk as u64;
        file.seek(SeekFrom::Start(n_pos))?;
        file.read_exact(&mut buf[..n_chunk])?;
        l_tail.splice(0..0, buf[..n_chunk].iter().copied());

        let n_end = l_tail
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(0, |n| n + 1);
        if n_end == 0 {
            continue;
        }
        if let Some(n_newline) = l_tail[..n_end].iter().rposition(|b| *b == b'\n') {
            return Ok(l_tail[n_newline + 1..n_end].to_vec());
        }
    }

    let n_end = l_tail
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |n| n + 1);
    l_tail.truncate(n_end);
    Ok(l_tail)
}

/// Inline an image file as `data:image/<ext>;base64,<payload>`.
pub fn image_to_data_uri<P: AsRef<Path>>(path: P) -> Result<String, FsError> {
    let path = path.as_ref();
    if !is_image(path) {
        return Err(FsError::NotImage(path.to_path_buf()));
    }
    let bytes = read_file(path)?;
    Ok(format!(
        "data:image/{};base64,{}",
        extension(path),
        STANDARD.encode(bytes)
    ))
}
