use std::fs;
use std::path::Path;

use latex_doc_utils::atomic_write;

use crate::error::EditResult;

/// Replace `path` with `content`, first copying the current file to a `.bak`
/// sibling when `backup` is set.
pub fn write_with_backup(path: &Path, content: &str, backup: bool) -> EditResult<()> {
    if backup {
        fs::copy(path, path.with_extension("bak"))?;
    }
    atomic_write(path, content)?;
    Ok(())
}
