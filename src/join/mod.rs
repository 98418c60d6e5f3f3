use crate::cd::{sample_frames_to_sectors, sectors_to_sample_frames};
use crate::commands::join::JoinCommand;
use crate::cue::CueParser;
use crate::cue::models::{CueSheet, Track};
use crate::error::CuesplitError;
use crate::join::error::{CueJoinError, CueJoinResult};
use crate::split::error::SplitError;
use crate::split::{PregapMode, slice_range};
use crate::util::fs::find_cue_files;
use crate::util::{join_name, spinner_style};
use crate::wave::error::WaveError;
use crate::wave::{FrameRange, SourceCursor, create_sink};
use hound::WavSpec;
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;

pub mod error;

#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Directory FILE names of both sheets are resolved against.
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Stem of the merged `.wav` and `.cue`.
    pub name: String,
}

impl JoinOptions {
    pub fn wav_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.wav", self.name))
    }

    pub fn cue_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.cue", self.name))
    }
}

struct PlannedCopy {
    source: PathBuf,
    range: FrameRange,
    /// Source sector the copy starts at when it opens a run of tracks on one
    /// file, `None` when it continues the previous copy.
    lead: Option<u32>,
}

/// Resolves the range of every track in `sheet`, checking each source against
/// the format of the first one seen.
///
/// The first track on each file is copied from its INDEX 00 when it has one,
/// so the pregap stays in the merged audio.
fn plan_sheet(
    sheet: &CueSheet,
    source_dir: &Path,
    cursor: &mut SourceCursor,
    format: &mut Option<WavSpec>,
) -> CueJoinResult<Vec<PlannedCopy>> {
    let mut plan = Vec::with_capacity(sheet.tracks.len());

    for (i, track) in sheet.tracks.iter().enumerate() {
        let file = track.file.as_deref().ok_or(SplitError::NoSourceFile {
            track: track.number,
        })?;
        let path = source_dir.join(file);
        let source = cursor.source(&path)?;

        let expected = *format.get_or_insert(source.spec());
        if source.spec() != expected {
            return Err(CueJoinError::FormatMismatch {
                path,
                expected,
                found: source.spec(),
            });
        }

        let mut range = slice_range(
            track,
            sheet.tracks.get(i + 1),
            source.sample_rate(),
            source.total_frames(),
            PregapMode::Previous,
        )?;

        let opens_run = i == 0 || sheet.tracks[i - 1].file != track.file;
        let lead = match (opens_run, track.start()) {
            (true, Some(start)) => {
                let lead = track.pregap().filter(|&pregap| pregap <= start).unwrap_or(start);
                range.start = sectors_to_sample_frames(lead, source.sample_rate()).min(range.start);
                Some(lead)
            }
            _ => None,
        };

        plan.push(PlannedCopy {
            source: path,
            range,
            lead,
        });
    }

    Ok(plan)
}

fn index_span(tracks: &[Track]) -> Option<(u32, u32)> {
    let mut positions = tracks.iter().flat_map(|track| track.indices.values().copied());
    let first = positions.next()?;
    Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
}

/// Builds the merged sheet from `primary` then `secondary`, every track on
/// `file`. Each run of tracks is moved to where its audio lands in the merged
/// stream.
fn merge_sheets(
    primary: &CueSheet,
    secondary: &CueSheet,
    plan: &[PlannedCopy],
    sample_rate: u32,
    file: &str,
) -> CueJoinResult<CueSheet> {
    let mut merged = CueSheet {
        current_file: Some(file.to_string()),
        tracks: Vec::with_capacity(plan.len()),
        ..primary.clone()
    };

    let mut frames = 0;
    let (mut lead, mut base) = (0, 0);
    for (track, copy) in primary.tracks.iter().chain(&secondary.tracks).zip(plan) {
        if let Some(run_lead) = copy.lead {
            lead = run_lead;
            base = sample_frames_to_sectors(frames, sample_rate);
        }

        let mut track = track.clone();
        track.file = Some(file.to_string());
        track.rebase_indices(lead, base);
        merged.tracks.push(track);

        frames += copy.range.len();
    }

    let (head, tail) = merged.tracks.split_at(primary.tracks.len());
    if let (Some((_, last_primary)), Some((first_secondary, _))) =
        (index_span(head), index_span(tail))
    {
        if first_secondary <= last_primary {
            return Err(CueJoinError::NonMonotonicTimeline {
                last_primary,
                first_secondary,
            });
        }
    }

    Ok(merged)
}

/// Concatenates the audio of `primary` and `secondary` into one WAV and writes
/// a cue sheet for it. Every range and the merged timeline are checked before
/// anything is written.
pub fn join_cue_sheets(
    primary: &CueSheet,
    secondary: &CueSheet,
    options: &JoinOptions,
) -> CueJoinResult<CueSheet> {
    if primary.tracks.is_empty() {
        return Err(CueJoinError::NoTracks);
    }

    let mut cursor = SourceCursor::default();
    let mut format = None;
    let mut plan = plan_sheet(primary, &options.source_dir, &mut cursor, &mut format)?;
    plan.extend(plan_sheet(secondary, &options.source_dir, &mut cursor, &mut format)?);
    let format = format.ok_or(CueJoinError::NoTracks)?;

    let wav_name = format!("{}.wav", options.name);
    let merged = merge_sheets(primary, secondary, &plan, format.sample_rate, &wav_name)?;

    let wav_path = options.wav_path();
    let mut sink = create_sink(&wav_path, format)?;
    let mut frames = 0;
    for copy in &plan {
        frames += cursor.source(&copy.source)?.copy_range(copy.range, &mut sink)?;
    }
    sink.finalize().map_err(WaveError::from)?;
    debug!("Wrote {frames} frames to {wav_path:?}");

    std::fs::write(options.cue_path(), merged.render())?;

    Ok(merged)
}

/// Joins the first two cue sheets found in the command's directory.
pub async fn join_cue_sheets_in_dir(pb: MultiProgress, cmd: JoinCommand) -> anyhow::Result<()> {
    let cue_files = find_cue_files(&cmd.dir).await?;
    let [primary_path, secondary_path, rest @ ..] = cue_files.as_slice() else {
        return Err(CuesplitError::NotEnoughCueSheets {
            found: cue_files.len(),
        }
        .into());
    };
    for ignored in rest {
        warn!("Only two cue sheets are joined, ignoring {ignored:?}");
    }

    let primary = CueParser::new(primary_path).parse().await?;
    let secondary = CueParser::new(secondary_path).parse().await?;

    let name = cmd
        .name
        .clone()
        .unwrap_or_else(|| join_name(primary_path, secondary_path));
    let output_dir = cmd.output.clone().unwrap_or_else(|| cmd.dir.clone());
    tokio::fs::create_dir_all(&output_dir).await?;
    let options = JoinOptions {
        source_dir: cmd.dir.clone(),
        output_dir,
        name,
    };

    info!("Joining {primary_path:?} and {secondary_path:?} into {:?}", options.wav_path());

    let spinner = pb.add(ProgressBar::new_spinner().with_style(spinner_style()?));
    spinner.set_message(options.name.clone());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let merged =
        task::spawn_blocking(move || join_cue_sheets(&primary, &secondary, &options)).await??;

    spinner.finish_and_clear();
    info!("Joined {} tracks", merged.tracks.len());

    Ok(())
}
