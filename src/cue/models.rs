use std::fmt;

/// Red Book CD frame rate.
pub const FRAMES_PER_SECOND: u64 = 75;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSheet {
    pub catalog: Option<String>,
    pub cdtextfile: Option<String>,
    pub comments: Vec<Comment>,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub files: Vec<CueFile>,
}

impl CueSheet {
    pub fn tracks(&self) -> impl Iterator<Item = &CueTrack> {
        self.files.iter().flat_map(|file| file.tracks.iter())
    }

    /// Looks up the first comment with the given REM key, ignoring case.
    pub fn comment(&self, key: &str) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|comment| comment.key().eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    pub filename: String,
    pub file_type: FileType,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub comments: Vec<Comment>,
    pub tracks: Vec<CueTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTrack {
    pub number: u32,
    pub track_type: TrackType,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub isrc: Option<String>,
    pub flags: TrackFlags,
    pub comments: Vec<Comment>,
    pub indices: Vec<CueIndex>,
    pub pregap: Option<TimeCode>,
    pub postgap: Option<TimeCode>,
}

impl CueTrack {
    pub fn index(&self, number: u8) -> Option<&CueIndex> {
        self.indices.iter().find(|i| i.number == number)
    }

    /// The index marking where the track becomes audible: INDEX 01, else
    /// INDEX 00, else whichever index comes first.
    pub fn start_index(&self) -> Option<&CueIndex> {
        self.index(1)
            .or_else(|| self.index(0))
            .or_else(|| self.indices.first())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueIndex {
    pub number: u8,
    pub position: TimeCode,
}

/// A `MM:SS:FF` disc address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeCode {
    minutes: u32,
    seconds: u8,
    frames: u8,
}

impl TimeCode {
    /// Returns `None` when any field is out of range.
    pub fn new(minutes: u64, seconds: u8, frames: u8) -> Option<Self> {
        if seconds >= 60 || u64::from(frames) >= FRAMES_PER_SECOND {
            return None;
        }
        let minutes = u32::try_from(minutes).ok()?;

        Some(Self {
            minutes,
            seconds,
            frames,
        })
    }

    pub fn total_frames(&self) -> u64 {
        (u64::from(self.minutes) * 60 + u64::from(self.seconds)) * FRAMES_PER_SECOND
            + u64::from(self.frames)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.total_frames() as f64 / FRAMES_PER_SECOND as f64
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}

/// Raw REM payload, conventionally `KEY value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment(pub String);

impl Comment {
    pub fn key(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or("")
    }

    pub fn value(&self) -> &str {
        let rest = self.0.trim_start();
        let rest = rest[self.key().len()..].trim();
        rest.strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Audio,
    CdG,
    Mode1_2048,
    Mode1_2352,
    Mode2_2336,
    Mode2_2352,
    CdI2336,
    CdI2352,
}

impl TrackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Audio => "AUDIO",
            TrackType::CdG => "CDG",
            TrackType::Mode1_2048 => "MODE1/2048",
            TrackType::Mode1_2352 => "MODE1/2352",
            TrackType::Mode2_2336 => "MODE2/2336",
            TrackType::Mode2_2352 => "MODE2/2352",
            TrackType::CdI2336 => "CDI/2336",
            TrackType::CdI2352 => "CDI/2352",
        }
    }

    pub fn from_str_ignore_case(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "AUDIO" => Some(TrackType::Audio),
            "CDG" => Some(TrackType::CdG),
            "MODE1/2048" => Some(TrackType::Mode1_2048),
            "MODE1/2352" => Some(TrackType::Mode1_2352),
            "MODE2/2336" => Some(TrackType::Mode2_2336),
            "MODE2/2352" => Some(TrackType::Mode2_2352),
            "CDI/2336" => Some(TrackType::CdI2336),
            "CDI/2352" => Some(TrackType::CdI2352),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Binary,
    Motorola,
    Aiff,
    Wave,
    Mp3,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Binary => "BINARY",
            FileType::Motorola => "MOTOROLA",
            FileType::Aiff => "AIFF",
            FileType::Wave => "WAVE",
            FileType::Mp3 => "MP3",
        }
    }

    pub fn from_str_ignore_case(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "BINARY" => Some(FileType::Binary),
            "MOTOROLA" => Some(FileType::Motorola),
            "AIFF" => Some(FileType::Aiff),
            "WAVE" => Some(FileType::Wave),
            "MP3" => Some(FileType::Mp3),
            _ => None,
        }
    }
}

/// Set of subcode flags declared on a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrackFlags(pub u8);

impl TrackFlags {
    pub const DCP: u8 = 0x01;
    pub const FOUR_CHANNEL: u8 = 0x02;
    pub const PRE: u8 = 0x04;
    pub const SCMS: u8 = 0x08;

    const NAMES: [(u8, &'static str); 4] = [
        (Self::DCP, "DCP"),
        (Self::FOUR_CHANNEL, "4CH"),
        (Self::PRE, "PRE"),
        (Self::SCMS, "SCMS"),
    ];

    pub fn flag_from_str_ignore_case(value: &str) -> Option<u8> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(value))
            .map(|(flag, _)| *flag)
    }

    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn contains(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Names of the set flags in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timecode_converts_frames_to_fractional_seconds() {
        let tc = TimeCode::new(0, 1, 37).unwrap();
        assert_eq!(tc.as_secs_f64(), 112.0 / 75.0);
        assert_eq!(tc.total_frames(), 112);
    }

    #[test]
    fn timecode_converts_whole_minutes() {
        let tc = TimeCode::new(2, 0, 0).unwrap();
        assert_eq!(tc.as_secs_f64(), 120.0);
    }

    #[test]
    fn timecode_rejects_out_of_range_fields() {
        assert!(TimeCode::new(0, 60, 0).is_none());
        assert!(TimeCode::new(0, 0, 75).is_none());
        assert!(TimeCode::new(999, 59, 74).is_some());
        assert!(TimeCode::new(u64::from(u32::MAX) + 1, 0, 0).is_none());
    }

    #[test]
    fn timecode_displays_zero_padded() {
        assert_eq!(TimeCode::new(3, 7, 9).unwrap().to_string(), "03:07:09");
        assert_eq!(TimeCode::new(120, 0, 0).unwrap().to_string(), "120:00:00");
    }

    #[test]
    fn comment_splits_key_and_value() {
        let comment = Comment("GENRE \"Audio Book\"".to_string());
        assert_eq!(comment.key(), "GENRE");
        assert_eq!(comment.value(), "Audio Book");

        let bare = Comment("DATE 2004".to_string());
        assert_eq!(bare.value(), "2004");

        let key_only = Comment("COMMENT".to_string());
        assert_eq!(key_only.value(), "");
    }

    #[test]
    fn flags_are_a_set() {
        let mut flags = TrackFlags::default();
        flags.insert(TrackFlags::PRE);
        flags.insert(TrackFlags::PRE);
        flags.insert(TrackFlags::DCP);
        assert!(flags.contains(TrackFlags::PRE));
        assert!(!flags.contains(TrackFlags::SCMS));
        assert_eq!(flags.names().collect::<Vec<_>>(), vec!["DCP", "PRE"]);
    }

    #[test]
    fn flag_names_match_ignoring_case() {
        assert_eq!(
            TrackFlags::flag_from_str_ignore_case("4ch"),
            Some(TrackFlags::FOUR_CHANNEL)
        );
        assert_eq!(TrackFlags::flag_from_str_ignore_case("XYZ"), None);
    }

    #[test]
    fn start_index_prefers_index_one_then_zero() {
        let at = |m, s, f| TimeCode::new(m, s, f).unwrap();
        let mut track = CueTrack {
            number: 1,
            track_type: TrackType::Audio,
            title: None,
            performer: None,
            isrc: None,
            flags: TrackFlags::default(),
            comments: vec![],
            indices: vec![
                CueIndex {
                    number: 0,
                    position: at(0, 0, 0),
                },
                CueIndex {
                    number: 1,
                    position: at(0, 2, 0),
                },
            ],
            pregap: None,
            postgap: None,
        };
        assert_eq!(track.start_index().unwrap().number, 1);

        track.indices.remove(1);
        assert_eq!(track.start_index().unwrap().number, 0);

        track.indices = vec![CueIndex {
            number: 2,
            position: at(0, 5, 0),
        }];
        assert_eq!(track.start_index().unwrap().number, 2);
    }
}
