use crate::wave::error::{WaveError, WaveResult};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// External decoders able to restore a WAV from a compressed sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Flac,
    Ape,
    WavPack,
    Tta,
}

impl Decoder {
    /// Probe order for compressed siblings.
    pub const ALL: [Decoder; 4] = [Decoder::Flac, Decoder::Ape, Decoder::WavPack, Decoder::Tta];

    pub fn extension(&self) -> &'static str {
        match self {
            Decoder::Flac => "flac",
            Decoder::Ape => "ape",
            Decoder::WavPack => "wv",
            Decoder::Tta => "tta",
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Decoder::Flac => "flac",
            Decoder::Ape => "mac",
            Decoder::WavPack => "wvunpack",
            Decoder::Tta => "ttaenc",
        }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(self.program());
        match self {
            Decoder::Flac => {
                cmd.arg("-d").arg("-o").arg(output).arg(input);
            }
            Decoder::Ape => {
                cmd.arg(input).arg(output).arg("-d");
            }
            Decoder::WavPack => {
                cmd.arg(input).arg(output);
            }
            Decoder::Tta => {
                // ttaenc only takes an output directory and keeps the stem
                let dir = output.parent().unwrap_or_else(|| Path::new("."));
                cmd.arg("-d").arg(input).arg(dir);
            }
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

/// A WAV source that may have been decoded for the current operation.
///
/// Dropping the guard deletes the WAV only if this guard decoded it.
#[derive(Debug)]
pub struct DecodedSource {
    path: PathBuf,
    decoded_from: Option<PathBuf>,
}

impl DecodedSource {
    pub fn acquire(path: impl AsRef<Path>) -> WaveResult<Self> {
        Self::acquire_with(path, |decoder, input, output| decoder.command(input, output))
    }

    /// Like [`DecodedSource::acquire`], with the decode command built by `command`.
    fn acquire_with<F>(path: impl AsRef<Path>, mut command: F) -> WaveResult<Self>
    where
        F: FnMut(Decoder, &Path, &Path) -> Command,
    {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Ok(Self {
                path,
                decoded_from: None,
            });
        }

        for decoder in Decoder::ALL {
            let candidate = path.with_extension(decoder.extension());
            if !candidate.exists() {
                continue;
            }

            info!("Decoding {candidate:?} with {}", decoder.program());
            let status = command(decoder, &candidate, &path).status()?;

            if !status.success() || !path.exists() {
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                return Err(WaveError::DecoderFailed {
                    decoder: decoder.program(),
                    output: path,
                });
            }

            return Ok(Self {
                path,
                decoded_from: Some(candidate),
            });
        }

        Err(WaveError::SourceNotFound(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn was_decoded(&self) -> bool {
        self.decoded_from.is_some()
    }
}

impl Drop for DecodedSource {
    fn drop(&mut self) {
        let Some(origin) = &self.decoded_from else {
            return;
        };

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {:?} decoded from {origin:?}", self.path),
            Err(err) => warn!("Could not remove decoded file {:?}: {err}", self.path),
        }
    }
}

/// Every source touched by one split or join, each decoded at most once.
#[derive(Debug, Default)]
pub struct DecodedSources {
    guards: HashMap<PathBuf, DecodedSource>,
}

impl DecodedSources {
    pub fn acquire(&mut self, path: impl AsRef<Path>) -> WaveResult<&Path> {
        let guard = match self.guards.entry(path.as_ref().to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let guard = DecodedSource::acquire(entry.key())?;
                entry.insert(guard)
            }
        };

        Ok(guard.path())
    }
}
