// src/cue/models
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    pub performer: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    /// Last `FILE ... WAVE` seen while parsing, or the merged WAV after a join.
    pub current_file: Option<String>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub number: u8,
    pub title: String,
    pub performer: Option<String>,
    pub file: Option<String>,
    /// Index point number to position in CD sectors.
    pub indices: BTreeMap<u8, u32>,
    pub disc: DiscInfo,
}

/// Disc-level fields copied into a track when it is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscInfo {
    pub performer: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
}

impl CueSheet {
    pub fn disc_info(&self) -> DiscInfo {
        DiscInfo {
            performer: self.performer.clone(),
            title: self.title.clone(),
            genre: self.genre.clone(),
            date: self.date.clone(),
        }
    }

    /// Opens a new track on `file`, inheriting the disc fields as they are now.
    pub fn open_track(&mut self, number: u8, file: Option<String>) -> usize {
        let disc = self.disc_info();
        self.tracks.push(Track {
            number,
            title: String::new(),
            performer: disc.performer.clone(),
            file,
            indices: BTreeMap::new(),
            disc,
        });
        self.tracks.len() - 1
    }
}

impl Track {
    pub const PREGAP_INDEX: u8 = 0;
    pub const START_INDEX: u8 = 1;

    pub fn start(&self) -> Option<u32> {
        self.indices.get(&Self::START_INDEX).copied()
    }

    pub fn pregap(&self) -> Option<u32> {
        self.indices.get(&Self::PREGAP_INDEX).copied()
    }

    /// `"NN - Title"`, the stem used for sliced files.
    pub fn display_name(&self) -> String {
        format!("{:02} - {}", self.number, self.title)
    }

    /// Moves every index point so that sector `from` lands on sector `to`.
    pub fn rebase_indices(&mut self, from: u32, to: u32) {
        for position in self.indices.values_mut() {
            *position = to.saturating_add(position.saturating_sub(from));
        }
    }
}
