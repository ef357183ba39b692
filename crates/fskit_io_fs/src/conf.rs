//! Filesystem constants: buffer tiers, default modes and whitelists.

/// Files up to this size are copied through a manually sized buffer.
pub const N_SIZE_COPY_SMALL_FILE_MAX: u64 = 1_048_576;
/// Sources below this size use [`N_SIZE_COPY_BUFFER_SMALL`].
pub const N_SIZE_COPY_SMALL_BUFFER_THRESHOLD: u64 = 524_288;
pub const N_SIZE_COPY_BUFFER_SMALL: usize = 51_200;
pub const N_SIZE_COPY_BUFFER_LARGE: usize = 102_400;
/// Fixed buffer of [`crate::copy::fast_copy`].
pub const N_SIZE_FAST_COPY_BUFFER: usize = 32_768;
/// Streaming read buffer for digests.
pub const N_SIZE_HASH_BUFFER: usize = 65_536;
/// Backward read chunk for last-line lookups.
pub const N_SIZE_LINE_CHUNK: usize = 4_096;
/// Bytes inspected by content-based MIME sniffing.
pub const N_SIZE_MIME_SNIFF: usize = 512;
/// Full MD5 hex digest length.
pub const N_LEN_MD5_HEX: usize = 32;

/// Mode for intermediate directories created on demand.
pub const N_MODE_DIR_DEFAULT: u32 = 0o766;
/// Mode for parent directories created by content writers.
pub const N_MODE_DIR_CONTENT: u32 = 0o755;
/// Mode for files created by [`crate::dir::touch`].
pub const N_MODE_FILE_TOUCH: u32 = 0o666;
/// Mode for files created by content writers.
pub const N_MODE_FILE_CONTENT: u32 = 0o644;

/// Extensions recognized as images (lower-case, no dot).
pub const TUP_IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "bmp", "gif", "png", "svg", "ico"];

/// Buffer size for [`crate::copy::copy_file`], `None` when the bulk path applies.
pub fn derive_copy_buffer_size(n_size_src: u64) -> Option<usize> {
    if n_size_src > N_SIZE_COPY_SMALL_FILE_MAX {
        return None;
    }
    if n_size_src < N_SIZE_COPY_SMALL_BUFFER_THRESHOLD {
        return Some(N_SIZE_COPY_BUFFER_SMALL);
    }
    Some(N_SIZE_COPY_BUFFER_LARGE)
}
