//! Hashing utilities

use crate::types::MirrorError;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size for hashing
const CHUNK_SIZE: usize = 64 * 1024;

/// BLAKE3 digest of one file's contents
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDigest([u8; 32]);

impl FileDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<[u8; 32]> for FileDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileDigest({})", self.to_hex())
    }
}

/// Compute the BLAKE3 digest of a file
///
/// The file is streamed in 64KB chunks so memory use does not grow with file size.
///
/// # Errors
/// `MirrorError::Read` if the file cannot be opened or a read fails part way.
///
/// # Example
/// ```no_run
/// use replica::hash::compute_hash;
/// use std::path::Path;
///
/// let digest = compute_hash(Path::new("file.txt"))?;
/// println!("{}", digest.to_hex());
/// # Ok::<(), replica::MirrorError>(())
/// ```
pub fn compute_hash(file_path: &Path) -> Result<FileDigest, MirrorError> {
    let mut file = File::open(file_path).map_err(|e| MirrorError::read(file_path, e))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| MirrorError::read(file_path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[0..bytes_read]);
    }

    Ok(FileDigest(*hasher.finalize().as_bytes()))
}
