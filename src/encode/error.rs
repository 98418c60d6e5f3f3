use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    AcquireError(#[from] tokio::sync::AcquireError),

    #[error("{program} exited with {status}: {stderr}")]
    ExitStatus {
        program: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Encoder finished but did not write {0}")]
    MissingOutput(PathBuf),

    #[error("Encoder did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("{0} encode job(s) failed")]
    JobsFailed(usize),
}

pub type EncodeResult<T> = Result<T, EncodeError>;
