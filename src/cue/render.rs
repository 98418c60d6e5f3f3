use crate::cd::Msf;
use crate::cue::models::CueSheet;
use std::fmt;

pub const HEADER_COMMENT: &str = "REM COMMENT CUE JOIN";

impl fmt::Display for CueSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER_COMMENT}")?;
        if let Some(genre) = &self.genre {
            writeln!(f, "REM GENRE \"{genre}\"")?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "REM DATE {date}")?;
        }
        if let Some(performer) = &self.performer {
            writeln!(f, "PERFORMER \"{performer}\"")?;
        }
        if let Some(title) = &self.title {
            writeln!(f, "TITLE \"{title}\"")?;
        }

        let shared_file = self.shared_file();
        if let Some(file) = shared_file {
            writeln!(f, "FILE \"{file}\" WAVE")?;
        }

        for (position, track) in self.tracks.iter().enumerate() {
            if shared_file.is_none() {
                if let Some(file) = &track.file {
                    writeln!(f, "FILE \"{file}\" WAVE")?;
                }
            }

            writeln!(f, "  TRACK {:02} AUDIO", position + 1)?;
            writeln!(f, "    TITLE \"{}\"", track.title)?;
            if let Some(performer) = track
                .performer
                .as_ref()
                .filter(|performer| self.performer.as_ref() != Some(*performer))
            {
                writeln!(f, "    PERFORMER \"{performer}\"")?;
            }
            for (number, sectors) in &track.indices {
                writeln!(f, "    INDEX {number:02} {}", Msf::from_sectors(*sectors))?;
            }
        }

        Ok(())
    }
}

impl CueSheet {
    /// The one file every track lives in, if there is exactly one.
    ///
    /// A sheet without tracks falls back to `current_file`.
    pub fn shared_file(&self) -> Option<&str> {
        let Some(first) = self.tracks.first() else {
            return self.current_file.as_deref();
        };

        if self.tracks.iter().all(|track| track.file == first.file) {
            first.file.as_deref()
        } else {
            None
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}
