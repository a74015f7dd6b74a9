//! Atomic file copy implementation

use crate::types::MirrorError;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Suffix for in-flight copies
pub const PART_SUFFIX: &str = ".replica-part";

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Stream the source into a fresh, uniquely named hidden temp file
///    (`.<random>.replica-part`) next to the destination
/// 2. Flush and sync to disk
/// 3. Copy permissions and modification time from the source
/// 4. Rename over the destination
///
/// The temp name never matches an existing entry, so a source file that
/// happens to look like a temp file is neither clobbered nor raced by a
/// concurrent copy. On any failure the temp file is removed when dropped.
///
/// The destination's parent directory must already exist; the planner
/// creates directories before any copy beneath them.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
/// * `Err(MirrorError::Read)` - the source could not be opened or read
/// * `Err(MirrorError::Write)` - the destination could not be written
///
/// # Example
/// ```no_run
/// use replica::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), replica::MirrorError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, MirrorError> {
    let mut src_file = File::open(src).map_err(|e| MirrorError::read(src, e))?;

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut part = tempfile::Builder::new()
        .prefix(".")
        .suffix(PART_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| MirrorError::write(dest, e))?;

    let bytes = stream_into(&mut src_file, part.as_file_mut(), src, dest)?;
    part.as_file()
        .sync_all()
        .map_err(|e| MirrorError::write(dest, e))?;
    apply_source_metadata(src, part.path(), dest)?;
    part.persist(dest)
        .map_err(|e| MirrorError::write(dest, e.error))?;

    Ok(bytes)
}

fn stream_into(
    src_file: &mut File,
    part_file: &mut File,
    src: &Path,
    dest: &Path,
) -> Result<u64, MirrorError> {
    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| MirrorError::read(src, e))?;

        if bytes_read == 0 {
            break;
        }

        part_file
            .write_all(&buffer[0..bytes_read])
            .map_err(|e| MirrorError::write(dest, e))?;
        total_bytes += bytes_read as u64;
    }

    Ok(total_bytes)
}

fn apply_source_metadata(src: &Path, part_path: &Path, dest: &Path) -> Result<(), MirrorError> {
    let src_metadata = fs::metadata(src).map_err(|e| MirrorError::read(src, e))?;

    let mtime = filetime::FileTime::from_last_modification_time(&src_metadata);
    filetime::set_file_mtime(part_path, mtime).map_err(|e| MirrorError::write(dest, e))?;

    // Permissions last: a read-only source would otherwise block the mtime update on some platforms.
    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| MirrorError::write(dest, e))
}
