use crate::cue::error::CueError;
use crate::split::error::SplitError;
use crate::wave::error::WaveError;
use hound::WavSpec;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueJoinError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    TaskError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    WaveError(#[from] WaveError),

    #[error(transparent)]
    SplitError(#[from] SplitError),

    #[error("The primary cue sheet has no tracks")]
    NoTracks,

    #[error("{path:?} is {found:?}, expected {expected:?} like the first source")]
    FormatMismatch {
        path: PathBuf,
        expected: WavSpec,
        found: WavSpec,
    },

    #[error(
        "Appended tracks would start at sector {first_secondary}, not after the last primary index at sector {last_primary}"
    )]
    NonMonotonicTimeline {
        last_primary: u32,
        first_secondary: u32,
    },
}

pub type CueJoinResult<T> = Result<T, CueJoinError>;
