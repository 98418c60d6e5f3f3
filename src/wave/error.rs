use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaveError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    HoundError(#[from] hound::Error),

    #[error("Source WAV not found and no compressed sibling to decode: {0}")]
    SourceNotFound(PathBuf),

    #[error("Decoder {decoder} failed to produce {output}")]
    DecoderFailed { decoder: &'static str, output: PathBuf },

    #[error("Unexpected end of {path} at sample frame {frame}")]
    UnexpectedEof { path: PathBuf, frame: u64 },

    #[error("Sample frame {frame} is beyond the 32-bit WAV range")]
    FrameOutOfRange { frame: u64 },
}

pub type WaveResult<T> = Result<T, WaveError>;
