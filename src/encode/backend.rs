use crate::cue::models::Track;
use clap::ValueEnum;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const LAME_VBR_QUALITY: u8 = 5;
const OPUS_BITRATE_KBPS: f32 = 112.0;
const VORBIS_QUALITY: u8 = 5;
const APE_COMPRESSION: u16 = 3000;
const MUSEPACK_QUALITY: f32 = 5.0;

/// Tags handed to every encoder for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub performer: Option<String>,
    pub number: String,
    pub title: String,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
}

impl From<&Track> for TrackTags {
    fn from(track: &Track) -> Self {
        Self {
            performer: track.performer.clone(),
            number: format!("{:02}", track.number),
            title: track.title.clone(),
            album: track.disc.title.clone(),
            date: track.disc.date.clone(),
            genre: track.disc.genre.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Encoder {
    #[value(name = "mp3")]
    Mp3,
    #[value(name = "opus")]
    Opus,
    #[value(name = "ogg")]
    Vorbis,
    #[value(name = "flac")]
    Flac,
    #[value(name = "ape")]
    Ape,
    #[value(name = "tta")]
    Tta,
    #[value(name = "wv")]
    WavPack,
    #[value(name = "mpc")]
    Musepack,
}

impl Encoder {
    pub const DEFAULT: [Encoder; 5] = [
        Encoder::Mp3,
        Encoder::Opus,
        Encoder::Vorbis,
        Encoder::Musepack,
        Encoder::Tta,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            Encoder::Mp3 => "lame",
            Encoder::Opus => "opusenc",
            Encoder::Vorbis => "oggenc2",
            Encoder::Flac => "flac",
            Encoder::Ape => "mac",
            Encoder::Tta => "ttaenc",
            Encoder::WavPack => "wavpack",
            Encoder::Musepack => "mppenc",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Encoder::Mp3 => "mp3",
            Encoder::Opus => "opus",
            Encoder::Vorbis => "ogg",
            Encoder::Flac => "flac",
            Encoder::Ape => "ape",
            Encoder::Tta => "tta",
            Encoder::WavPack => "wv",
            Encoder::Musepack => "mpc",
        }
    }

    /// Encoded file name for a sliced WAV: same stem, codec extension.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(self.extension())
    }

    pub fn args(&self, input: &Path, output: &Path, tags: &TrackTags) -> Vec<OsString> {
        let mut args = ArgList::default();

        match self {
            Encoder::Mp3 => {
                args.push("-h").push("-V").push(LAME_VBR_QUALITY.to_string());
                args.opt("--ta", &tags.performer)
                    .pair("--tn", &tags.number)
                    .pair("--tt", &tags.title)
                    .opt("--ty", &tags.date)
                    .opt("--tg", &tags.genre)
                    .opt("--tl", &tags.album)
                    .push(input)
                    .push(output);
            }
            Encoder::Opus => {
                args.push("--vbr")
                    .push("--bitrate")
                    .push(OPUS_BITRATE_KBPS.to_string());
                args.opt("--artist", &tags.performer)
                    .pair("--comment", &format!("tracknumber={}", tags.number))
                    .pair("--title", &tags.title)
                    .opt("--date", &tags.date)
                    .opt("--genre", &tags.genre)
                    .opt("--album", &tags.album)
                    .push(input)
                    .push(output);
            }
            Encoder::Vorbis => {
                args.push("-q").push(VORBIS_QUALITY.to_string());
                args.opt("-a", &tags.performer)
                    .pair("-N", &tags.number)
                    .pair("-t", &tags.title)
                    .opt("-d", &tags.date)
                    .opt("-G", &tags.genre)
                    .opt("-l", &tags.album)
                    .push("-o")
                    .push(output)
                    .push(input);
            }
            Encoder::Flac => {
                args.push("--best");
                args.vorbis_comment("ARTIST", &tags.performer)
                    .vorbis_comment("ALBUM", &tags.album)
                    .vorbis_comment("TRACKNUMBER", &Some(tags.number.clone()))
                    .vorbis_comment("TITLE", &Some(tags.title.clone()))
                    .vorbis_comment("DATE", &tags.date)
                    .vorbis_comment("GENRE", &tags.genre)
                    .push("-o")
                    .push(output)
                    .push(input);
            }
            Encoder::Ape => {
                args.push(input)
                    .push(output)
                    .push(format!("-c{APE_COMPRESSION}"));
            }
            Encoder::Tta => {
                // ttaenc writes <stem>.tta into the given directory
                let dir = output.parent().unwrap_or_else(|| Path::new("."));
                args.push("-e").push(input).push(dir);
            }
            Encoder::WavPack => {
                args.push(input).push(output);
            }
            Encoder::Musepack => {
                args.push("--quality")
                    .push(format!("{MUSEPACK_QUALITY:.1}"))
                    .push(input)
                    .push(output);
            }
        }

        args.0
    }
}

#[derive(Default)]
struct ArgList(Vec<OsString>);

impl ArgList {
    fn push(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    fn pair(&mut self, flag: &str, value: &str) -> &mut Self {
        self.push(flag).push(value)
    }

    fn opt(&mut self, flag: &str, value: &Option<String>) -> &mut Self {
        match value {
            Some(value) => self.pair(flag, value),
            None => self,
        }
    }

    fn vorbis_comment(&mut self, name: &str, value: &Option<String>) -> &mut Self {
        match value {
            Some(value) => self.push(format!("--tag={name}={value}")),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> TrackTags {
        TrackTags {
            performer: Some("Band".to_string()),
            number: "03".to_string(),
            title: "Song".to_string(),
            album: Some("Album".to_string()),
            date: None,
            genre: Some("Rock".to_string()),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn lame_args_skip_missing_tags() {
        let input = Path::new("03 - Song.wav");
        let output = Encoder::Mp3.output_path(input);
        assert_eq!(output, PathBuf::from("03 - Song.mp3"));

        let args = strings(Encoder::Mp3.args(input, &output, &tags()));
        assert_eq!(
            args,
            vec![
                "-h", "-V", "5", "--ta", "Band", "--tn", "03", "--tt", "Song", "--tg", "Rock",
                "--tl", "Album", "03 - Song.wav", "03 - Song.mp3",
            ]
        );
    }

    #[test]
    fn opus_args_carry_track_number_comment() {
        let input = Path::new("03 - Song.wav");
        let args = strings(Encoder::Opus.args(input, &Encoder::Opus.output_path(input), &tags()));

        assert_eq!(&args[..3], ["--vbr", "--bitrate", "112"]);
        assert!(args.windows(2).any(|w| w == ["--comment", "tracknumber=03"]));
        assert!(!args.iter().any(|a| a == "--date"));
        assert_eq!(args.last().map(String::as_str), Some("03 - Song.opus"));
    }

    #[test]
    fn flac_args_use_vorbis_comments() {
        let input = Path::new("out/03 - Song.wav");
        let args = strings(Encoder::Flac.args(input, &Encoder::Flac.output_path(input), &tags()));

        assert!(args.contains(&"--tag=ARTIST=Band".to_string()));
        assert!(args.contains(&"--tag=TRACKNUMBER=03".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--tag=DATE")));
        assert_eq!(
            &args[args.len() - 3..],
            ["-o", "out/03 - Song.flac", "out/03 - Song.wav"]
        );
    }

    #[test]
    fn tta_targets_output_directory() {
        let input = Path::new("out/03 - Song.wav");
        let args = strings(Encoder::Tta.args(input, &Encoder::Tta.output_path(input), &tags()));
        assert_eq!(args, vec!["-e", "out/03 - Song.wav", "out"]);
    }

    #[test]
    fn tags_come_from_track_and_disc_copy() {
        let mut track = Track {
            number: 7,
            title: "Seven".to_string(),
            performer: Some("Guest".to_string()),
            ..Default::default()
        };
        track.disc.title = Some("Album".to_string());
        track.disc.date = Some("2004".to_string());

        let tags = TrackTags::from(&track);
        assert_eq!(tags.number, "07");
        assert_eq!(tags.performer.as_deref(), Some("Guest"));
        assert_eq!(tags.album.as_deref(), Some("Album"));
        assert_eq!(tags.date.as_deref(), Some("2004"));
        assert_eq!(tags.genre, None);
    }
}
