use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, ToolError};

/// Reads a template as UTF-8 text.
pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|error| source_error(path, error))
}

/// Maps a failure to open an input file. Missing or unreadable inputs become
/// [`ToolError::SourceNotFound`]; anything else stays an I/O error.
pub fn source_error(path: &Path, error: std::io::Error) -> ToolError {
    match error.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::IsADirectory => {
            ToolError::SourceNotFound(path.to_path_buf())
        }
        _ => ToolError::Io(error),
    }
}

/// Writes rendered text to `path`, creating missing parent directories.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text)?;
    Ok(())
}

/// Creates the parent directory of `path` when it does not exist yet.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
