use std::path::PathBuf;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CuesplitError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Could not find any .cue file in the specified path: {0}")]
    NoCueFilesFound(PathBuf),

    #[error("Joining needs two cue sheets, found {found}")]
    NotEnoughCueSheets { found: usize },
}

pub type CuesplitResult<T> = result::Result<T, CuesplitError>;
