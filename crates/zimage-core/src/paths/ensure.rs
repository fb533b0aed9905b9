//! Output directory preparation.

use std::fs;
use std::path::Path;

use super::error::PathError;

/// Name of the scratch file written by [`check_writable`]. Dot-prefixed and
/// without the artifact extension, so listings never pick it up.
const WRITE_CHECK_FILE: &str = ".zimage-write-check";

/// Make sure `dir` is a directory this process can write into, creating it
/// (and its parents) when missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PathError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(PathError::NotADirectory(dir.to_path_buf())),
        Ok(_) => {}
        Err(_) => fs::create_dir_all(dir).map_err(|source| PathError::Create {
            path: dir.to_path_buf(),
            source,
        })?,
    }
    check_writable(dir)
}

/// Write and remove a small scratch file in `dir`.
pub fn check_writable(dir: &Path) -> Result<(), PathError> {
    let scratch = dir.join(WRITE_CHECK_FILE);
    fs::write(&scratch, b"ok").map_err(|source| PathError::NotWritable {
        path: dir.to_path_buf(),
        source,
    })?;
    // A leftover scratch file is harmless; it is not an artifact.
    let _ = fs::remove_file(&scratch);
    Ok(())
}
