//! Filesystem specification models and top-level error types.

use std::collections::BTreeMap;
use std::io;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Behavior when a copy destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileCoverPolicy {
    /// Overwrite the destination unconditionally.
    Allow,
    /// Keep the destination, report zero bytes and no error.
    Ignore,
    /// Keep the destination and fail the item with [`FsError::AlreadyExists`].
    Deny,
}

/// On-disk kind filter used by [`crate::classify::is_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileKind {
    /// Any existing entry.
    Any,
    /// Regular file, symlinks excluded.
    Regular,
    /// Symbolic link (not followed).
    Symlink,
    /// Directory (not followed).
    Directory,
    /// Regular file or symbolic link.
    Common,
}

/// Which entries a tree walk yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFileTreeScope {
    /// Files, symlinks and directories.
    All,
    /// Directories only.
    DirectoriesOnly,
    /// Everything except directories.
    FilesOnly,
}

/// Supported SHA family digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumShaAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl EnumShaAlgorithm {
    /// Legacy numeric selector (`1` stands for SHA-1).
    pub fn bits(self) -> u32 {
        match self {
            Self::Sha1 => 1,
            Self::Sha256 => 256,
            Self::Sha512 => 512,
        }
    }
}

impl TryFrom<u32> for EnumShaAlgorithm {
    type Error = FsError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(Self::Sha1),
            256 => Ok(Self::Sha256),
            512 => Ok(Self::Sha512),
            _ => Err(FsError::UnsupportedAlgorithm(bits)),
        }
    }
}

/// Pattern matching mode for tree include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathInfo

/// Field selection for [`crate::path::path_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecPathInfoMask(u8);

impl SpecPathInfoMask {
    pub const DIRNAME: Self = Self(1);
    pub const BASENAME: Self = Self(2);
    pub const EXTENSION: Self = Self(4);
    pub const FILENAME: Self = Self(8);
    pub const ALL: Self = Self(1 | 2 | 4 | 8);

    /// Build a mask from raw bits. Any negative value selects every field.
    pub fn from_bits(bits: i32) -> Self {
        if bits < 0 {
            return Self::ALL;
        }
        Self((bits as u8) & Self::ALL.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for SpecPathInfoMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Decomposed path. Fields not selected by the mask stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecPathInfo {
    pub dirname: Option<String>,
    pub basename: Option<String>,
    pub extension: Option<String>,
    pub filename: Option<String>,
}

impl SpecPathInfo {
    /// Map view containing only the populated keys.
    pub fn to_dict(&self) -> BTreeMap<String, String> {
        let mut dict_info = BTreeMap::new();
        let l_fields = [
            ("dirname", &self.dirname),
            ("basename", &self.basename),
            ("extension", &self.extension),
            ("filename", &self.filename),
        ];
        for (c_key, value) in l_fields {
            if let Some(v) = value {
                dict_info.insert(c_key.to_string(), v.clone());
            }
        }
        dict_info
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Required path could not be found.
    #[error("Path not found: {} ({source})", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Platform access check failed.
    #[error("Permission denied: {} ({source})", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a regular file", .0.display())]
    NotRegularFile(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotDirectory(PathBuf),
    #[error("{} is not a symbolic link", .0.display())]
    NotSymlink(PathBuf),
    #[error("{} is not an image", .0.display())]
    NotImage(PathBuf),
    /// Deny-policy copy collision.
    #[error("File {} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    /// Unknown SHA selector.
    #[error("Unsupported SHA algorithm selector: {0}")]
    UnsupportedAlgorithm(u32),
    /// Read/write/seek failure.
    #[error("IO failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Wrap an IO error with the failing path, classified by error kind.
    pub fn from_io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to, when it carries one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::NotRegularFile(path)
            | Self::NotDirectory(path)
            | Self::NotSymlink(path)
            | Self::NotImage(path)
            | Self::AlreadyExists(path) => Some(path),
            Self::InvalidPath(_) | Self::InvalidPattern(_) | Self::UnsupportedAlgorithm(_) => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
