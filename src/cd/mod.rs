// src/cd/mod.rs
use crate::cue::error::{CueError, CueResult};
use std::fmt;
use std::str::FromStr;

/// Red Book addressing: one sector is 1/75 of a second.
pub const SECTORS_PER_SECOND: u32 = 75;
pub const SECTORS_PER_MINUTE: u32 = 60 * SECTORS_PER_SECOND;

/// A `MM:SS:FF` position as written in cue sheets.
///
/// `frames` are CD sectors, not PCM sample frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Msf {
    pub minutes: u32,
    pub seconds: u8,
    pub frames: u8,
}

impl Msf {
    pub fn from_sectors(sectors: u32) -> Self {
        Self {
            minutes: sectors / SECTORS_PER_MINUTE,
            seconds: ((sectors % SECTORS_PER_MINUTE) / SECTORS_PER_SECOND) as u8,
            frames: (sectors % SECTORS_PER_SECOND) as u8,
        }
    }

    pub fn to_sectors(&self) -> u32 {
        (self.minutes * 60 + self.seconds as u32) * SECTORS_PER_SECOND + self.frames as u32
    }
}

impl FromStr for Msf {
    type Err = CueError;

    fn from_str(msf_str: &str) -> CueResult<Self> {
        let parts: Vec<&str> = msf_str.split(':').collect();
        if parts.len() != 3 {
            return Err(CueError::InvalidMSFFormat(msf_str.to_string()));
        }

        Ok(Msf {
            minutes: parts[0].parse()?,
            seconds: parts[1].parse()?,
            frames: parts[2].parse()?,
        })
    }
}

impl fmt::Display for Msf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}

/// Absolute sample-frame offset of a sector position, truncating.
pub fn sectors_to_sample_frames(sectors: u32, sample_rate: u32) -> u64 {
    sectors as u64 * sample_rate as u64 / SECTORS_PER_SECOND as u64
}

/// Sector count covered by `frames` sample frames, truncating.
pub fn sample_frames_to_sectors(frames: u64, sample_rate: u32) -> u32 {
    let sectors = frames * SECTORS_PER_SECOND as u64 / sample_rate as u64;
    u32::try_from(sectors).unwrap_or(u32::MAX)
}
