use crate::encode::backend::Encoder;
use clap::Parser;
use std::path::PathBuf;

/// Split every cue sheet in a directory into one WAV per track, then encode them
#[derive(Parser, Debug, Clone)]
pub struct SplitCommand {
    /// Directory holding the .cue files and their audio
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Where track files are written, defaults to DIR
    #[arg(long, short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Codecs to encode each track with, may be repeated
    #[arg(
        long = "codec",
        short = 'c',
        value_name = "CODEC",
        value_enum,
        default_values_t = Encoder::DEFAULT
    )]
    pub codecs: Vec<Encoder>,

    /// Only write the WAV slices
    #[arg(long, default_value_t = false)]
    pub no_encode: bool,

    /// Maximum number of encoders running at once, defaults to the CPU count
    #[arg(long, short = 'j', value_name = "JOBS", env = "CUESPLIT_JOBS")]
    pub jobs: Option<usize>,

    /// Seconds after which a running encoder is killed
    #[arg(long, value_name = "SECS", env = "CUESPLIT_ENCODE_TIMEOUT")]
    pub timeout: Option<u64>,

    #[arg(
        long,
        help = "end each track at the next track's INDEX 00 instead of its INDEX 01, dropping the pregap",
        default_value_t = false
    )]
    pub discard_pregap: bool,
}
