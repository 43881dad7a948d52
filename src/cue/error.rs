use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    LexError(#[from] LexError),

    #[error(transparent)]
    SyntaxError(#[from] SyntaxError),

    #[error(transparent)]
    SemanticError(#[from] SemanticError),
}

pub type CueResult<T> = Result<T, CueError>;

/// A malformed token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    /// Byte offset into the input.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),

    #[error("Unterminated quoted string")]
    UnterminatedString,

    #[error("Unexpected characters after closing quote: {0}")]
    TrailingAfterQuote(String),

    #[error("Quote inside an unquoted value: {0}")]
    MixedQuoting(String),

    #[error("Invalid catalog number, expected 13 digits: {0}")]
    InvalidCatalog(String),

    #[error("Invalid track number: {0}")]
    InvalidTrackNumber(String),

    #[error("Invalid index number: {0}")]
    InvalidIndexNumber(String),

    #[error("Invalid MSF format: {0}")]
    InvalidTimeCode(String),

    #[error("Unknown file type: {0}")]
    InvalidFileType(String),

    #[error("Unknown track type: {0}")]
    InvalidTrackType(String),

    #[error("Unknown track flag: {0}")]
    InvalidFlag(String),
}

/// The token stream does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected} but found {found} at line {line}, column {column}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub expected: &'static str,
    pub found: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Track {number:02} is declared twice (lines {first_line} and {second_line})")]
    DuplicateTrackNumber {
        number: u32,
        first_line: usize,
        second_line: usize,
    },

    #[error("Track {current:02} follows track {previous:02}, track numbers must increase")]
    TrackOutOfOrder { previous: u32, current: u32 },

    #[error("Track number {0} is outside of 1-99")]
    TrackNumberOutOfRange(u64),

    #[error("Track {0:02} has no INDEX line")]
    MissingIndex(u32),

    #[error("Track {track:02} has INDEX {current:02} after INDEX {previous:02}")]
    IndexOutOfOrder { track: u32, previous: u8, current: u8 },

    #[error("File {0} contains no tracks")]
    FileWithoutTracks(String),

    #[error("{field} given more than once in the same {scope} (line {line})")]
    DuplicateField {
        field: &'static str,
        scope: &'static str,
        line: usize,
    },

    #[error("{keyword} is not allowed inside a {scope} (line {line})")]
    MisplacedStatement {
        keyword: &'static str,
        scope: &'static str,
        line: usize,
    },

    #[error("Timecode {minutes}:{seconds:02}:{frames:02} is out of range (line {line})")]
    TimeCodeOutOfRange {
        minutes: u64,
        seconds: u8,
        frames: u8,
        line: usize,
    },

    #[error("No duration known for file {0}")]
    MissingDuration(String),

    #[error("Invalid duration {duration} for file {file}")]
    InvalidDuration { file: String, duration: f64 },

    #[error("Track {track:02} starts at {current}s which is not after the previous chapter start {previous}s")]
    NonIncreasingChapterStart {
        track: u32,
        previous: f64,
        current: f64,
    },

    #[error("Track {track:02} starts at {start}s, at or past the end of the stream ({end}s)")]
    ChapterPastEndOfStream { track: u32, start: f64, end: f64 },
}
