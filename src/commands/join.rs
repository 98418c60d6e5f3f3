use clap::Parser;
use std::path::PathBuf;

/// Join the first two cue sheets of a directory into one WAV and one cue sheet
#[derive(Parser, Debug, Clone)]
pub struct JoinCommand {
    /// Directory holding the .cue files and their audio
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Where the joined files are written, defaults to DIR
    #[arg(long, short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Stem of the joined .wav and .cue, defaults to the common prefix of the cue file names
    #[arg(long, short = 'n', value_name = "NAME")]
    pub name: Option<String>,
}
