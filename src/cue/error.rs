use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Invalid MSF format: {0}")]
    InvalidMSFFormat(String),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

pub type CueResult<T> = Result<T, CueError>;
