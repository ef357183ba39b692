//! Streaming content digests.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::conf::{N_LEN_MD5_HEX, N_SIZE_HASH_BUFFER};
use crate::spec::{EnumShaAlgorithm, FsError};

/// Stream the file at `path` through digest `D` and hex-encode the result.
fn _hash_file<D: Digest>(path: &Path) -> Result<String, FsError> {
    let mut file = File::open(path).map_err(|e| FsError::from_io(path, e))?;
    let mut hasher = D::new();
    let mut buf = vec![0_u8; N_SIZE_HASH_BUFFER];
    loop {
        let n_read = file.read(&mut buf).map_err(|e| FsError::from_io(path, e))?;
        if n_read == 0 {
            break;
        }
        hasher.update(&buf[..n_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// MD5 hex digest of a file.
///
/// A `length` in `1..32` returns that many leading hex characters; any other
/// value returns the full 32-character digest.
pub fn file_md5<P: AsRef<Path>>(path: P, length: usize) -> Result<String, FsError> {
    let mut c_digest = _hash_file::<Md5>(path.as_ref())?;
    if length > 0 && length < N_LEN_MD5_HEX {
        c_digest.truncate(length);
    }
    Ok(c_digest)
}

pub fn file_sha1<P: AsRef<Path>>(path: P) -> Result<String, FsError> {
    _hash_file::<Sha1>(path.as_ref())
}

pub fn file_sha256<P: AsRef<Path>>(path: P) -> Result<String, FsError> {
    _hash_file::<Sha256>(path.as_ref())
}

pub fn file_sha512<P: AsRef<Path>>(path: P) -> Result<String, FsError> {
    _hash_file::<Sha512>(path.as_ref())
}

/// SHA digest selected by algorithm.
pub fn file_sha_x<P: AsRef<Path>>(path: P, algorithm: EnumShaAlgorithm) -> Result<String, FsError> {
    match algorithm {
        EnumShaAlgorithm::Sha1 => file_sha1(path),
        EnumShaAlgorithm::Sha256 => file_sha256(path),
        EnumShaAlgorithm::Sha512 => file_sha512(path),
    }
}

/// SHA digest selected by the legacy numeric selector (`1`, `256`, `512`).
///
/// # Panics
///
/// Panics on any other selector. A bad selector is a caller bug, not an IO
/// condition; use [`EnumShaAlgorithm::try_from`] to validate untrusted input.
pub fn file_sha_x_bits<P: AsRef<Path>>(path: P, bits: u32) -> Result<String, FsError> {
    let algorithm = match EnumShaAlgorithm::try_from(bits) {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    };
    file_sha_x(path, algorithm)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{file_md5, file_sha1, file_sha256, file_sha512, file_sha_x, file_sha_x_bits};
    use crate::spec::{EnumShaAlgorithm, FsError};

    const C_SHA256_EMPTY: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn md5_full_and_truncated() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("abc.txt");
        fs::write(&path_file, "abc").expect("write");

        let c_full = file_md5(&path_file, 0).expect("md5");
        assert_eq!(c_full, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(file_md5(&path_file, 32).expect("md5"), c_full);
        assert_eq!(file_md5(&path_file, 64).expect("md5"), c_full);

        for n_len in 1..32 {
            let c_short = file_md5(&path_file, n_len).expect("md5");
            assert_eq!(c_short.len(), n_len);
            assert!(c_full.starts_with(&c_short));
        }
    }

    #[test]
    fn sha_family_known_vectors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_empty = tmp.path().join("empty");
        let path_abc = tmp.path().join("abc");
        fs::write(&path_empty, b"").expect("write");
        fs::write(&path_abc, b"abc").expect("write");

        assert_eq!(file_sha256(&path_empty).expect("sha256"), C_SHA256_EMPTY);
        assert_eq!(
            file_sha1(&path_abc).expect("sha1"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            file_sha_x(&path_abc, EnumShaAlgorithm::Sha256).expect("sha256"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(file_sha512(&path_abc).expect("sha512").len(), 128);
        assert_eq!(
            file_sha_x_bits(&path_abc, 512).expect("sha512"),
            file_sha512(&path_abc).expect("sha512")
        );
        assert_eq!(
            file_sha_x_bits(&path_abc, 1).expect("sha1"),
            file_sha1(&path_abc).expect("sha1")
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = file_sha1("/no/such/file.bin").expect_err("missing file");
        assert!(matches!(err, FsError::NotFound { .. }));
        assert!(file_md5("/no/such/file.bin", 16).is_err());
    }

    #[test]
    #[should_panic(expected = "Unsupported SHA algorithm selector")]
    fn unsupported_selector_panics() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("f");
        fs::write(&path_file, b"x").expect("write");
        let _ = file_sha_x_bits(&path_file, 384);
    }
}
