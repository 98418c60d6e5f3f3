use crate::error::{CuesplitError, CuesplitResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Every `.cue` file directly inside `dir`, in name order. The extension is
/// matched case-insensitively.
pub async fn find_cue_files(dir: &Path) -> CuesplitResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_cue = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cue"));

        if is_cue && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(CuesplitError::NoCueFilesFound(dir.to_path_buf()));
    }

    files.sort();
    Ok(files)
}
