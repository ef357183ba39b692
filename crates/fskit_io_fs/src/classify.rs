//! Existence and kind predicates over filesystem metadata or content.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::conf::{N_SIZE_MIME_SNIFF, TUP_IMAGE_EXTENSIONS};
use crate::path::extension;
use crate::spec::EnumFileKind;

////////////////////////////////////////////////////////////////////////////////
// #region KindPredicates

/// Whether `path` exists. Symlinks are followed, so a dangling link is `false`.
pub fn is_exist<P: AsRef<Path>>(path: P) -> bool {
    fs::metadata(path.as_ref()).is_ok()
}

/// Directory check without following symlinks.
pub fn is_dir<P: AsRef<Path>>(path: P) -> bool {
    fs::symlink_metadata(path.as_ref()).is_ok_and(|meta| meta.file_type().is_dir())
}

/// Symlink check without following symlinks.
pub fn is_link<P: AsRef<Path>>(path: P) -> bool {
    fs::symlink_metadata(path.as_ref()).is_ok_and(|meta| meta.file_type().is_symlink())
}

/// Whether `path` exists and its own (not followed) kind matches `kind`.
pub fn is_file<P: AsRef<Path>>(path: P, kind: EnumFileKind) -> bool {
    let Ok(meta) = fs::symlink_metadata(path.as_ref()) else {
        return false;
    };
    let cfg_file_type = meta.file_type();
    match kind {
        EnumFileKind::Any => true,
        EnumFileKind::Regular => cfg_file_type.is_file(),
        EnumFileKind::Symlink => cfg_file_type.is_symlink(),
        EnumFileKind::Directory => cfg_file_type.is_dir(),
        EnumFileKind::Common => cfg_file_type.is_file() || cfg_file_type.is_symlink(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ContentPredicates

/// True when any byte is zero.
pub fn is_binary_content(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

/// Reads the whole file; unreadable files count as not binary.
pub fn is_binary_file<P: AsRef<Path>>(path: P) -> bool {
    match fs::read(path.as_ref()) {
        Ok(bytes) => is_binary_content(&bytes),
        Err(e) => {
            tracing::debug!("is_binary_file: cannot read {} ({e})", path.as_ref().display());
            false
        }
    }
}

/// Extension-based image check.
pub fn is_image<P: AsRef<Path>>(path: P) -> bool {
    let c_ext = extension(path);
    TUP_IMAGE_EXTENSIONS.contains(&c_ext.as_str())
}

/// File size in bytes, `-1` when the path cannot be stat'ed.
pub fn file_size<P: AsRef<Path>>(path: P) -> i64 {
    match fs::metadata(path.as_ref()) {
        Ok(meta) => i64::try_from(meta.len()).unwrap_or(i64::MAX),
        Err(_) => -1,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AccessChecks

#[cfg(unix)]
fn _access(path: &Path, mode: nix::unistd::AccessFlags) -> bool {
    nix::unistd::access(path, mode).is_ok()
}

/// Whether the current process may read `path`.
pub fn is_readable<P: AsRef<Path>>(path: P) -> bool {
    #[cfg(unix)]
    {
        _access(path.as_ref(), nix::unistd::AccessFlags::R_OK)
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path.as_ref()).is_ok()
    }
}

/// Whether the current process may write `path`.
pub fn is_writable<P: AsRef<Path>>(path: P) -> bool {
    #[cfg(unix)]
    {
        _access(path.as_ref(), nix::unistd::AccessFlags::W_OK)
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path.as_ref()).is_ok_and(|meta| !meta.permissions().readonly())
    }
}

/// Whether `path` is a regular file the platform considers executable.
pub fn is_executable<P: AsRef<Path>>(path: P) -> bool {
    let Ok(meta) = fs::metadata(path.as_ref()) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        matches!(
            extension(path).as_str(),
            "exe" | "bat" | "cmd" | "com"
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Mime

/// Leading-byte signatures, checked in order.
const TUP_MIME_SIGNATURES: [(&[u8], &str); 14] = [
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"Rar!\x1a\x07", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\x7fELF", "application/x-executable"),
];

/// Case-insensitive markup prefixes, matched after leading whitespace.
const TUP_MIME_MARKUP: [(&str, &str); 5] = [
    ("<?xml", "text/xml; charset=utf-8"),
    ("<svg", "image/svg+xml"),
    ("<!doctype html", "text/html; charset=utf-8"),
    ("<html", "text/html; charset=utf-8"),
    ("<head", "text/html; charset=utf-8"),
];

/// Content type from the leading bytes of a file.
pub(crate) fn sniff_content_type(buf: &[u8]) -> &'static str {
    if buf.len() >= 12 && &buf[..4] == b"RIFF" && &buf[8..12] == b"WEBP" {
        return "image/webp";
    }
    for (signature, c_mime) in TUP_MIME_SIGNATURES {
        if buf.starts_with(signature) {
            return c_mime;
        }
    }

    let n_skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let buf_trimmed = &buf[n_skip..];
    for (c_prefix, c_mime) in TUP_MIME_MARKUP {
        let b_matched = buf_trimmed.len() >= c_prefix.len()
            && buf_trimmed[..c_prefix.len()].eq_ignore_ascii_case(c_prefix.as_bytes());
        if b_matched {
            return c_mime;
        }
    }

    let b_has_control = buf
        .iter()
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c | 0x1b));
    if b_has_control {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}

/// MIME type of `path`.
///
/// `fast` looks the extension up in a table and never opens the file; the
/// slow path sniffs the first bytes. Empty string when nothing is known or
/// the file cannot be read.
pub fn mime_type<P: AsRef<Path>>(path: P, fast: bool) -> String {
    let path = path.as_ref();
    if fast {
        return mime_guess::from_path(path)
            .first_raw()
            .map(str::to_string)
            .unwrap_or_default();
    }

    let Ok(file) = fs::File::open(path) else {
        return String::new();
    };
    let mut buf = Vec::with_capacity(N_SIZE_MIME_SNIFF);
    match file.take(N_SIZE_MIME_SNIFF as u64).read_to_end(&mut buf) {
        Ok(0) | Err(_) => String::new(),
        Ok(_) => sniff_content_type(&buf).to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
