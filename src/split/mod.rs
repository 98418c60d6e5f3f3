use crate::cd::sectors_to_sample_frames;
use crate::commands::split::SplitCommand;
use crate::cue::CueParser;
use crate::cue::models::{CueSheet, Track};
use crate::encode::backend::Encoder;
use crate::encode::error::EncodeError;
use crate::encode::{EncodeDispatcher, EncodeJob};
use crate::split::error::{SplitError, SplitResult};
use crate::util::fs::find_cue_files;
use crate::util::progress_style;
use crate::wave::error::WaveError;
use crate::wave::{FrameRange, SourceCursor, WaveSource, create_sink};
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;

pub mod error;

const UNSAFE_FILE_NAME_CHARS: [char; 4] = ['?', '/', '\\', ':'];

/// Where a track ends when the next track shares its file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PregapMode {
    /// At the next track's INDEX 01, the pregap stays with this track.
    #[default]
    Previous,
    /// At the next track's INDEX 00 when it has one, the pregap is dropped.
    Discard,
}

#[derive(Debug, Clone)]
pub struct SliceOptions {
    /// Directory FILE names are resolved against.
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pregap: PregapMode,
}

#[derive(Debug, Clone)]
pub struct SlicedTrack {
    pub path: PathBuf,
    pub track: Track,
    pub range: FrameRange,
    /// `false` when the file already existed and was left alone.
    pub written: bool,
}

/// Sample-frame range of `track` in its source.
///
/// The range runs from INDEX 01 to the next track's boundary when the next
/// track lives in the same file, or to the end of the source otherwise.
pub fn slice_range(
    track: &Track,
    next: Option<&Track>,
    sample_rate: u32,
    total_frames: u64,
    pregap: PregapMode,
) -> SplitResult<FrameRange> {
    let start = track.start().ok_or(SplitError::MissingStartIndex {
        track: track.number,
    })?;
    let start = sectors_to_sample_frames(start, sample_rate);

    let stop = match next.filter(|next| next.file == track.file) {
        Some(next) => {
            let boundary = match pregap {
                PregapMode::Previous => next.start(),
                PregapMode::Discard => next.pregap().or(next.start()),
            }
            .ok_or(SplitError::MissingStartIndex {
                track: next.number,
            })?;
            sectors_to_sample_frames(boundary, sample_rate)
        }
        None => total_frames,
    };

    if stop > total_frames {
        warn!(
            "Track {:02} ends at frame {stop}, past the end of its source ({total_frames}), clamping",
            track.number
        );
    }
    let stop = stop.min(total_frames);

    if start > stop {
        return Err(SplitError::InvalidRange {
            track: track.number,
            start,
            stop,
        });
    }

    Ok(FrameRange { start, stop })
}

/// `"NN - Title.wav"` without characters that are unsafe in file names.
pub fn slice_file_name(track: &Track) -> String {
    format!("{}.wav", track.display_name())
        .chars()
        .filter(|c| !UNSAFE_FILE_NAME_CHARS.contains(c))
        .collect()
}

/// Writes every track of `sheet` to its own WAV, in sheet order, and hands
/// each one to `on_slice`. Track files that already exist are not rewritten.
///
/// Returns the number of files written.
pub fn slice_tracks<F>(
    sheet: &CueSheet,
    options: &SliceOptions,
    mut on_slice: F,
) -> SplitResult<usize>
where
    F: FnMut(SlicedTrack) -> SplitResult<()>,
{
    let mut cursor = SourceCursor::default();
    let mut written = 0;

    for (i, track) in sheet.tracks.iter().enumerate() {
        let file = track.file.as_deref().ok_or(SplitError::NoSourceFile {
            track: track.number,
        })?;
        let source = cursor.source(&options.source_dir.join(file))?;
        let range = slice_range(
            track,
            sheet.tracks.get(i + 1),
            source.sample_rate(),
            source.total_frames(),
            options.pregap,
        )?;

        let path = options.output_dir.join(slice_file_name(track));
        let write = !path.exists();
        if write {
            debug!("Writing {path:?} from frames [{}, {})", range.start, range.stop);
            write_slice(source, range, &path)?;
            written += 1;
        } else {
            info!("{path:?} already exists, skipping");
        }

        on_slice(SlicedTrack {
            path,
            track: track.clone(),
            range,
            written: write,
        })?;
    }

    Ok(written)
}

fn write_slice(source: &mut WaveSource, range: FrameRange, path: &Path) -> SplitResult<()> {
    let partial = path.with_extension("wav.part");

    let result = (|| {
        let mut sink = create_sink(&partial, source.spec())?;
        source.copy_range(range, &mut sink)?;
        sink.finalize()?;
        Ok::<(), WaveError>(())
    })();

    if let Err(err) = result {
        if let Err(remove_err) = std::fs::remove_file(&partial) {
            warn!("Could not remove partial file {partial:?}: {remove_err}");
        }
        return Err(err.into());
    }

    std::fs::rename(&partial, path)?;
    Ok(())
}

/// Slices one cue sheet and submits an encode job per track and encoder as
/// soon as the track file is ready.
pub async fn split_cue_file(
    cue_path: &Path,
    options: SliceOptions,
    encoders: &[Encoder],
    dispatcher: &mut EncodeDispatcher,
    progress: ProgressBar,
) -> SplitResult<usize> {
    debug!("Parsing CUE file: {cue_path:?}");
    let sheet = CueParser::new(cue_path).parse().await?;
    progress.set_length(sheet.tracks.len() as u64);

    let (tx, mut rx) = mpsc::channel(1);
    let slicer = task::spawn_blocking(move || {
        slice_tracks(&sheet, &options, |sliced| {
            tx.blocking_send(sliced).map_err(|_| SplitError::SlicerStopped)
        })
    });

    while let Some(sliced) = rx.recv().await {
        progress.inc(1);
        for encoder in encoders {
            dispatcher
                .submit(EncodeJob::new(*encoder, &sliced.path, &sliced.track))
                .await?;
        }
    }

    let written = slicer.await??;
    progress.finish();

    Ok(written)
}

pub async fn split_cue_sheets(pb: MultiProgress, cmd: SplitCommand) -> anyhow::Result<()> {
    let cue_files = find_cue_files(&cmd.dir).await?;
    let output_dir = cmd.output.clone().unwrap_or_else(|| cmd.dir.clone());
    tokio::fs::create_dir_all(&output_dir).await?;

    let encoders = if cmd.no_encode {
        Vec::new()
    } else {
        cmd.codecs.clone()
    };
    let capacity = cmd.jobs.unwrap_or_else(EncodeDispatcher::default_capacity);
    let pregap = if cmd.discard_pregap {
        PregapMode::Discard
    } else {
        PregapMode::Previous
    };

    info!(
        "Splitting {} cue sheet(s), up to {capacity} encoder(s) at a time",
        cue_files.len()
    );

    let encode_bar = pb.add(ProgressBar::new(0).with_style(progress_style()?));
    encode_bar.set_message("encode");
    let mut dispatcher = EncodeDispatcher::new(capacity, cmd.timeout.map(Duration::from_secs))
        .with_progress(encode_bar.clone());

    for cue_path in cue_files {
        let source_dir = cue_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let options = SliceOptions {
            source_dir,
            output_dir: output_dir.clone(),
            pregap,
        };

        let bar = pb.add(ProgressBar::new(0).with_style(progress_style()?));
        bar.set_message(
            cue_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let written = split_cue_file(&cue_path, options, &encoders, &mut dispatcher, bar).await?;
        info!("{cue_path:?}: wrote {written} track file(s)");
    }

    let report = dispatcher.join().await;
    encode_bar.finish_and_clear();

    for failure in &report.failures {
        error!("{}: {}", failure.label, failure.error);
    }
    if !report.failures.is_empty() {
        return Err(EncodeError::JobsFailed(report.failures.len()).into());
    }

    info!("Encoded {} file(s)", report.succeeded);
    Ok(())
}
