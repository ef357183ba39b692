//! `fskit_io_fs` v1:
//! Local filesystem utility layer.
//!
//! Modules:
//! - `path`     : pure path normalization and decomposition
//! - `classify` : existence, kind, access and content predicates
//! - `hash`     : streaming MD5/SHA digests
//! - `copy`     : file, symlink and directory copy under a cover policy
//! - `tree`     : recursive enumeration with scope and filters
//! - `dir`      : create, pre-size, rename, delete, measure
//! - `content`  : whole-file and line-oriented reads/writes
//! - `spec`     : enums, path-info model, errors
//! - `report`   : copy report model
//! - `conf`     : buffer sizes and default modes
//! - `platform` : injectable host capability probe

pub mod classify;
pub mod conf;
pub mod content;
pub mod copy;
pub mod dir;
pub mod hash;
pub mod path;
pub mod platform;
pub mod report;
pub mod spec;
pub mod tree;
mod util;

pub use classify::{
    file_size, is_binary_content, is_binary_file, is_dir, is_executable, is_exist, is_file,
    is_image, is_link, is_readable, is_writable, mime_type,
};
pub use content::{
    append_file, image_to_data_uri, read_file, read_first_line, read_last_line, read_lines,
    write_file,
};
pub use copy::{copy_dir, copy_file, copy_link, fast_copy};
pub use dir::{delete_directory, directory_size, mkdir, rename, touch, unlink};
pub use hash::{file_md5, file_sha1, file_sha256, file_sha512, file_sha_x, file_sha_x_bits};
pub use path::{
    absolute_path, basename, dirname, extension, format_directory, format_path, path_info,
    real_path,
};
pub use platform::{EnumOsFamily, HostPlatform, PlatformProbe};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use spec::{
    EnumFileCoverPolicy, EnumFileKind, EnumFileTreeScope, EnumPatternMode, EnumShaAlgorithm,
    FsError, SpecPathInfo, SpecPathInfoMask,
};
pub use tree::{SpecTreePatterns, TypeTreeFilter, file_tree};
