//! Write the final binary map.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::parser::MapFile;

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write through a sibling temp file so a failed run never leaves a
/// half-written map behind.
pub fn emit(map: &MapFile, path: &Path) -> Result<()> {
    let staging = staging_path(path);
    fs::write(&staging, map.as_bytes()).map_err(|e| ConvertError::io(&staging, e))?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(ConvertError::io(path, e));
    }
    tracing::debug!(path = %path.display(), "map written");
    Ok(())
}
