use crate::cue::error::CueError;
use crate::encode::error::EncodeError;
use crate::wave::error::WaveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    WaveError(#[from] WaveError),

    #[error(transparent)]
    EncodeError(#[from] EncodeError),

    #[error("Track {track:02} has no INDEX 01")]
    MissingStartIndex { track: u8 },

    #[error("Track {track:02} is not preceded by a FILE ... WAVE line")]
    NoSourceFile { track: u8 },

    #[error("Track {track:02} starts at frame {start}, after its end at {stop}")]
    InvalidRange { track: u8, start: u64, stop: u64 },

    #[error("Slicing stopped because no one is receiving the slices")]
    SlicerStopped,
}

pub type SplitResult<T> = Result<T, SplitError>;
