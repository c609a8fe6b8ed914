//! Atomic artifact writes

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{EncodingError, Result};

/// Write `contents` to `path` through a temporary file in the same directory,
/// renamed into place once fully written. On failure the destination is left
/// as it was.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let io_err = |source: std::io::Error| EncodingError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(io_err)?;
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
