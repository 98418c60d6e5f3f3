use crate::cd::Msf;
use crate::cue::error::CueResult;
use crate::cue::models::CueSheet;
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

pub mod error;
pub mod models;
pub mod render;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy)]
enum LineKind {
    Performer,
    Date,
    Genre,
    Title,
    File,
    Track,
    Index,
}

lazy_static! {
    // Matched in order against the trimmed line, first hit wins.
    static ref LINE_PATTERNS: Vec<(Regex, LineKind)> = vec![
        (Regex::new(r"^PERFORMER\s(.+)").unwrap(), LineKind::Performer),
        (Regex::new(r"^REM DATE\s(.+)").unwrap(), LineKind::Date),
        (Regex::new(r"^REM GENRE\s(.+)").unwrap(), LineKind::Genre),
        (Regex::new(r"^TITLE\s(.+)").unwrap(), LineKind::Title),
        (Regex::new(r"^FILE\s(.+)\sWAVE").unwrap(), LineKind::File),
        (Regex::new(r"^TRACK\s(\d{2})\sAUDIO").unwrap(), LineKind::Track),
        (
            Regex::new(r"^INDEX\s(\d{2})\s(\d{1,3}:\d{2}:\d{2})").unwrap(),
            LineKind::Index,
        ),
    ];
}

/// A recognized cue line with its (unquoted) arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueLine {
    Performer(String),
    Date(String),
    Genre(String),
    Title(String),
    File(String),
    Track(u8),
    Index { number: u8, position: Msf },
}

impl CueLine {
    pub fn classify(line: &str) -> Option<Self> {
        LINE_PATTERNS
            .iter()
            .find_map(|(regex, kind)| Self::build(*kind, &regex.captures(line)?))
    }

    fn build(kind: LineKind, caps: &Captures) -> Option<Self> {
        let arg = |i: usize| caps.get(i).map(|m| unquote(m.as_str()).to_string());

        Some(match kind {
            LineKind::Performer => CueLine::Performer(arg(1)?),
            LineKind::Date => CueLine::Date(arg(1)?),
            LineKind::Genre => CueLine::Genre(arg(1)?),
            LineKind::Title => CueLine::Title(arg(1)?),
            LineKind::File => CueLine::File(arg(1)?),
            LineKind::Track => CueLine::Track(arg(1)?.parse().ok()?),
            LineKind::Index => CueLine::Index {
                number: arg(1)?.parse().ok()?,
                position: arg(2)?.parse().ok()?,
            },
        })
    }
}

/// Strips one pair of surrounding double quotes.
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Mutable context while walking the lines of one sheet.
#[derive(Debug, Default)]
struct ParserState {
    open_track: Option<usize>,
    current_file: Option<String>,
}

impl ParserState {
    fn apply(&mut self, sheet: &mut CueSheet, line: CueLine, line_no: usize) {
        match line {
            CueLine::Performer(performer) => match self.open_track {
                Some(i) => sheet.tracks[i].performer = Some(performer),
                None => sheet.performer = Some(performer),
            },
            CueLine::Date(date) => sheet.date = Some(date),
            CueLine::Genre(genre) => sheet.genre = Some(genre),
            CueLine::Title(title) => match self.open_track {
                Some(i) => sheet.tracks[i].title = title,
                None => sheet.title = Some(title),
            },
            CueLine::File(file) => self.current_file = Some(file),
            CueLine::Track(number) => {
                self.open_track = Some(sheet.open_track(number, self.current_file.clone()));
            }
            CueLine::Index { number, position } => match self.open_track {
                Some(i) => {
                    sheet.tracks[i].indices.insert(number, position.to_sectors());
                }
                None => debug!("Ignoring INDEX {number:02} before any TRACK on line {line_no}"),
            },
        }
    }
}

pub struct CueParser {
    cue_path: PathBuf,
}

impl CueParser {
    pub fn new(cue_path: impl AsRef<Path>) -> Self {
        Self {
            cue_path: cue_path.as_ref().to_path_buf(),
        }
    }

    pub async fn parse(&self) -> CueResult<CueSheet> {
        let data = tokio::fs::read(&self.cue_path).await?;
        let sheet = Self::parse_str(&decode_text(&data));

        debug!(
            "Parsed {} track(s) from {:?}",
            sheet.tracks.len(),
            self.cue_path
        );

        Ok(sheet)
    }

    /// Parses cue text. Unrecognized lines are skipped.
    pub fn parse_str(text: &str) -> CueSheet {
        let mut sheet = CueSheet::default();
        let mut state = ParserState::default();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match CueLine::classify(line) {
                Some(parsed) => state.apply(&mut sheet, parsed, i + 1),
                None => trace!("Skipping line {}: {line}", i + 1),
            }
        }

        sheet.current_file = state.current_file;
        sheet
    }
}

/// UTF-8 when valid, Latin-1 otherwise.
fn decode_text(data: &[u8]) -> String {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => data.iter().map(|&b| char::from(b)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"REM GENRE "Progressive Rock"
REM DATE 1973
PERFORMER "Pink Floyd"
TITLE "The Dark Side of the Moon"
FILE "Pink Floyd - The Dark Side of the Moon.wav" WAVE
  TRACK 01 AUDIO
    TITLE "Speak to Me"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Breathe"
    PERFORMER "Roger Waters"
    INDEX 00 01:05:40
    INDEX 01 01:07:00
"#;

    #[test]
    fn parses_disc_and_track_fields() {
        let sheet = CueParser::parse_str(SHEET);

        assert_eq!(sheet.genre.as_deref(), Some("Progressive Rock"));
        assert_eq!(sheet.date.as_deref(), Some("1973"));
        assert_eq!(sheet.performer.as_deref(), Some("Pink Floyd"));
        assert_eq!(sheet.title.as_deref(), Some("The Dark Side of the Moon"));
        assert_eq!(
            sheet.current_file.as_deref(),
            Some("Pink Floyd - The Dark Side of the Moon.wav")
        );
        assert_eq!(sheet.tracks.len(), 2);

        let first = &sheet.tracks[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.title, "Speak to Me");
        assert_eq!(first.performer.as_deref(), Some("Pink Floyd"));
        assert_eq!(first.start(), Some(0));
        assert_eq!(first.disc.genre.as_deref(), Some("Progressive Rock"));

        let second = &sheet.tracks[1];
        assert_eq!(second.number, 2);
        assert_eq!(second.performer.as_deref(), Some("Roger Waters"));
        assert_eq!(second.pregap(), Some((60 + 5) * 75 + 40));
        assert_eq!(second.start(), Some((60 + 7) * 75));
        assert_eq!(second.file, first.file);
    }

    #[test]
    fn disc_fields_are_copied_when_track_opens() {
        let sheet = CueParser::parse_str(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nREM DATE 2001\nREM GENRE Jazz\n",
        );

        assert_eq!(sheet.date.as_deref(), Some("2001"));
        assert_eq!(sheet.tracks[0].disc.date, None);
        assert_eq!(sheet.tracks[0].disc.genre, None);
    }

    #[test]
    fn tracks_bind_to_current_file() {
        let sheet = CueParser::parse_str(
            "FILE \"one.wav\" WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nFILE \"two.wav\" WAVE\nTRACK 02 AUDIO\nINDEX 01 00:00:00\n",
        );

        assert_eq!(sheet.tracks[0].file.as_deref(), Some("one.wav"));
        assert_eq!(sheet.tracks[1].file.as_deref(), Some("two.wav"));
        assert_eq!(sheet.current_file.as_deref(), Some("two.wav"));
    }

    #[test]
    fn ignores_unsupported_and_malformed_lines() {
        let sheet = CueParser::parse_str(
            "CATALOG 0000000000000\nINDEX 01 00:00:00\nFILE \"data.bin\" BINARY\nTRACK 01 MODE1/2352\nFILE \"a.wav\" WAVE\nTRACK 1 AUDIO\nTRACK 02 AUDIO\nINDEX 01 garbage\nINDEX 01 00:02:00\nFLAGS DCP\n",
        );

        assert_eq!(sheet.tracks.len(), 1);
        let track = &sheet.tracks[0];
        assert_eq!(track.number, 2);
        assert_eq!(track.file.as_deref(), Some("a.wav"));
        assert_eq!(track.indices.len(), 1);
        assert_eq!(track.start(), Some(150));
    }

    #[test]
    fn track_without_file_has_no_source() {
        let sheet = CueParser::parse_str("TRACK 01 AUDIO\nINDEX 01 00:00:00\n");
        assert_eq!(sheet.tracks[0].file, None);
    }

    #[test]
    fn unquote_strips_symmetric_quotes_only() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("  \"a\"  "), "a");
        assert_eq!(unquote("\"a"), "\"a");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn classify_follows_priority_order() {
        assert_eq!(
            CueLine::classify("REM DATE 1999"),
            Some(CueLine::Date("1999".to_string()))
        );
        assert_eq!(
            CueLine::classify("INDEX 00 00:01:02"),
            Some(CueLine::Index {
                number: 0,
                position: Msf {
                    minutes: 0,
                    seconds: 1,
                    frames: 2
                }
            })
        );
        assert_eq!(CueLine::classify("REM COMMENT \"x\""), None);
    }

    #[test]
    fn decodes_latin1_and_strips_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFTITLE x"), "TITLE x");
        assert_eq!(decode_text(b"TITLE \xC9t\xE9"), "TITLE \u{c9}t\u{e9}");
        assert_eq!(decode_text("TITLE Été".as_bytes()), "TITLE Été");
    }

    #[tokio::test]
    async fn parses_cue_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("album.cue");
        tokio::fs::write(&path, SHEET).await.unwrap();

        let sheet = CueParser::new(&path).parse().await.unwrap();
        assert_eq!(sheet.tracks.len(), 2);
    }
}
