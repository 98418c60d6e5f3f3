use crate::wave::decode::DecodedSources;
use crate::wave::error::{WaveError, WaveResult};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

pub mod decode;
pub mod error;

pub type WaveSink = WavWriter<BufWriter<File>>;

/// Half-open `[start, stop)` range of sample frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u64,
    pub stop: u64,
}

impl FrameRange {
    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }
}

/// Read handle on a PCM WAV, positioned by absolute sample frame.
pub struct WaveSource {
    path: PathBuf,
    reader: WavReader<BufReader<File>>,
}

impl WaveSource {
    pub fn open(path: impl AsRef<Path>) -> WaveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = WavReader::open(&path)?;

        Ok(Self { path, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn spec(&self) -> WavSpec {
        self.reader.spec()
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.reader.duration() as u64
    }

    /// Copies `range` into `sink`, returning the number of frames written.
    pub fn copy_range<W: Write + Seek>(
        &mut self,
        range: FrameRange,
        sink: &mut WavWriter<W>,
    ) -> WaveResult<u64> {
        if range.is_empty() {
            return Ok(0);
        }

        let start = u32::try_from(range.start)
            .map_err(|_| WaveError::FrameOutOfRange { frame: range.start })?;
        self.reader.seek(start)?;

        let spec = self.spec();
        let channels = spec.channels.max(1) as u64;
        let samples = range.len() * channels;

        let reader = &mut self.reader;
        let copied = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, _) => copy_samples::<f32, _, _>(reader, sink, samples)?,
            (SampleFormat::Int, 0..=8) => copy_samples::<i8, _, _>(reader, sink, samples)?,
            (SampleFormat::Int, 9..=16) => copy_samples::<i16, _, _>(reader, sink, samples)?,
            (SampleFormat::Int, _) => copy_samples::<i32, _, _>(reader, sink, samples)?,
        };

        if copied < samples {
            return Err(WaveError::UnexpectedEof {
                path: self.path.clone(),
                frame: range.start + copied / channels,
            });
        }

        Ok(range.len())
    }
}

pub fn create_sink(path: impl AsRef<Path>, spec: WavSpec) -> WaveResult<WaveSink> {
    Ok(WavWriter::create(path, spec)?)
}

/// Keeps the last used source open so consecutive tracks on one file share a
/// handle, and holds every decoded source until the operation ends.
#[derive(Default)]
pub struct SourceCursor {
    // declared first so the handle closes before decoded files are removed
    open: Option<WaveSource>,
    sources: DecodedSources,
}

impl SourceCursor {
    pub fn source(&mut self, path: &Path) -> WaveResult<&mut WaveSource> {
        let source = match self.open.take() {
            Some(source) if source.path() == path => source,
            _ => WaveSource::open(self.sources.acquire(path)?)?,
        };

        Ok(self.open.insert(source))
    }
}

fn copy_samples<S, R, W>(
    reader: &mut WavReader<R>,
    sink: &mut WavWriter<W>,
    count: u64,
) -> WaveResult<u64>
where
    S: hound::Sample,
    R: Read,
    W: Write + Seek,
{
    let mut copied = 0;
    for sample in reader.samples::<S>().take(count as usize) {
        sink.write_sample(sample?)?;
        copied += 1;
    }

    Ok(copied)
}
