//! SHA256 digests of byte streams
//!
//! Used for download integrity and for fingerprinting local certificate
//! inputs. Digests are lowercase hex.

use crate::error::{JvmLayerError, JvmLayerResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Hash everything readable from `reader`
pub fn sha256_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash a byte slice
pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hash a file's contents
pub fn sha256_file(path: &Path) -> JvmLayerResult<String> {
    let file = File::open(path)
        .map_err(|e| JvmLayerError::io(format!("opening {}", path.display()), e))?;
    sha256_reader(file).map_err(|e| JvmLayerError::io(format!("hashing {}", path.display()), e))
}

/// Compare two hex digests, ignoring case
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

/// Whether `digest` is a hex-encoded SHA256 digest
pub fn is_sha256(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Writer that hashes every byte passed through to the inner writer
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Consume the writer, returning the inner writer and the hex digest
    pub fn finish(self) -> (W, String) {
        (self.inner, hex::encode(self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
