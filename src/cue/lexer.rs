use crate::cue::error::{LexError, LexErrorKind};
use crate::cue::models::{FileType, TrackFlags, TrackType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CATALOG_RE: Regex = Regex::new(r"^[0-9]{13}$").unwrap();
    static ref TRACK_NUMBER_RE: Regex = Regex::new(r"^(?:0[1-9]|[1-9][0-9]*)$").unwrap();
    static ref INDEX_NUMBER_RE: Regex = Regex::new(r"^[0-9]{1,2}$").unwrap();
    static ref TIMECODE_RE: Regex =
        Regex::new(r"^(?P<minutes>[0-9]+):(?P<seconds>[0-9]{1,2}):(?P<frames>[0-9]{1,2})$")
            .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Catalog,
    CdTextFile,
    Rem,
    Performer,
    Title,
    File,
    Track,
    Isrc,
    Flags,
    Index,
    Pregap,
    Postgap,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Catalog => "CATALOG",
            Keyword::CdTextFile => "CDTEXTFILE",
            Keyword::Rem => "REM",
            Keyword::Performer => "PERFORMER",
            Keyword::Title => "TITLE",
            Keyword::File => "FILE",
            Keyword::Track => "TRACK",
            Keyword::Isrc => "ISRC",
            Keyword::Flags => "FLAGS",
            Keyword::Index => "INDEX",
            Keyword::Pregap => "PREGAP",
            Keyword::Postgap => "POSTGAP",
        }
    }

    pub fn from_str_ignore_case(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "CATALOG" => Some(Keyword::Catalog),
            "CDTEXTFILE" => Some(Keyword::CdTextFile),
            "REM" => Some(Keyword::Rem),
            "PERFORMER" => Some(Keyword::Performer),
            "TITLE" => Some(Keyword::Title),
            "FILE" => Some(Keyword::File),
            "TRACK" => Some(Keyword::Track),
            "ISRC" => Some(Keyword::Isrc),
            "FLAGS" => Some(Keyword::Flags),
            "INDEX" => Some(Keyword::Index),
            "PREGAP" => Some(Keyword::Pregap),
            "POSTGAP" => Some(Keyword::Postgap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    /// Quoted, unquoted or rest-of-line string value.
    Text(String),
    Catalog(String),
    TrackNumber(u64),
    IndexNumber(u8),
    /// Shape-checked only, ranges are validated by the builder.
    TimeCode {
        minutes: u64,
        seconds: u8,
        frames: u8,
    },
    FileType(FileType),
    TrackType(TrackType),
    Flag(u8),
    LineEnd,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(keyword) => format!("keyword {}", keyword.as_str()),
            TokenKind::Text(text) => format!("text {text:?}"),
            TokenKind::Catalog(catalog) => format!("catalog {catalog}"),
            TokenKind::TrackNumber(number) => format!("track number {number}"),
            TokenKind::IndexNumber(number) => format!("index number {number}"),
            TokenKind::TimeCode {
                minutes,
                seconds,
                frames,
            } => format!("timecode {minutes:02}:{seconds:02}:{frames:02}"),
            TokenKind::FileType(file_type) => format!("file type {}", file_type.as_str()),
            TokenKind::TrackType(track_type) => format!("track type {}", track_type.as_str()),
            TokenKind::Flag(_) => "flag".to_string(),
            TokenKind::LineEnd => "end of line".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Splits CUE text into tokens. Blank lines produce nothing, every other
/// line ends with exactly one [`TokenKind::LineEnd`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let body = input.strip_prefix('\u{feff}').unwrap_or(input);
    let base = input.len() - body.len();
    let bytes = body.as_bytes();

    let mut tokens = Vec::new();
    let mut line = 1;
    let mut start = 0;
    let mut i = 0;

    while i <= bytes.len() {
        if i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
            i += 1;
            continue;
        }

        LineLexer::new(&body[start..i], base + start, line).lex(&mut tokens)?;

        if i + 1 < bytes.len() && bytes[i] == b'\r' && bytes[i + 1] == b'\n' {
            i += 1;
        }
        i += 1;
        start = i;
        line += 1;
    }

    Ok(tokens)
}

struct LineLexer<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
    pos: usize,
}

impl<'a> LineLexer<'a> {
    fn new(text: &'a str, offset: usize, line: usize) -> Self {
        Self {
            text,
            offset,
            line,
            pos: 0,
        }
    }

    fn lex(mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(());
        };

        let keyword = Keyword::from_str_ignore_case(word)
            .ok_or_else(|| self.error_at(start, LexErrorKind::UnknownKeyword(word.to_string())))?;
        tokens.push(self.token_at(start, TokenKind::Keyword(keyword)));

        match keyword {
            Keyword::Catalog => {
                self.catalog(tokens)?;
            }
            Keyword::Rem => {
                self.comment(tokens)?;
            }
            Keyword::CdTextFile | Keyword::Performer | Keyword::Title | Keyword::Isrc => {
                self.free_text(tokens)?;
            }
            Keyword::File => {
                if self.string(tokens)? {
                    self.file_type(tokens)?;
                }
            }
            Keyword::Track => {
                if self.track_number(tokens)? {
                    self.track_type(tokens)?;
                }
            }
            Keyword::Flags => while self.flag(tokens)? {},
            Keyword::Index => {
                if self.index_number(tokens)? {
                    self.timecode(tokens)?;
                }
            }
            Keyword::Pregap | Keyword::Postgap => {
                self.timecode(tokens)?;
            }
        }

        // Leftovers are handed to the parser, which rejects them.
        while self.string(tokens)? {}

        tokens.push(self.token_at(self.text.len(), TokenKind::LineEnd));
        Ok(())
    }

    fn catalog(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        if !CATALOG_RE.is_match(word) {
            return Err(self.error_at(start, LexErrorKind::InvalidCatalog(word.to_string())));
        }

        tokens.push(self.token_at(start, TokenKind::Catalog(word.to_string())));
        Ok(true)
    }

    fn track_number(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        if !TRACK_NUMBER_RE.is_match(word) {
            return Err(self.error_at(start, LexErrorKind::InvalidTrackNumber(word.to_string())));
        }
        // Too many digits for u64 saturates, the builder rejects it as out of range.
        let number = word.parse::<u64>().unwrap_or(u64::MAX);

        tokens.push(self.token_at(start, TokenKind::TrackNumber(number)));
        Ok(true)
    }

    fn index_number(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        let number = INDEX_NUMBER_RE
            .is_match(word)
            .then(|| word.parse::<u8>().ok())
            .flatten()
            .ok_or_else(|| {
                self.error_at(start, LexErrorKind::InvalidIndexNumber(word.to_string()))
            })?;

        tokens.push(self.token_at(start, TokenKind::IndexNumber(number)));
        Ok(true)
    }

    fn timecode(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        let invalid = || self.error_at(start, LexErrorKind::InvalidTimeCode(word.to_string()));
        let captures = TIMECODE_RE.captures(word).ok_or_else(invalid)?;
        let minutes = captures["minutes"].parse::<u64>().unwrap_or(u64::MAX);
        let seconds = captures["seconds"].parse().map_err(|_| invalid())?;
        let frames = captures["frames"].parse().map_err(|_| invalid())?;

        tokens.push(self.token_at(
            start,
            TokenKind::TimeCode {
                minutes,
                seconds,
                frames,
            },
        ));
        Ok(true)
    }

    fn file_type(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        let file_type = FileType::from_str_ignore_case(word).ok_or_else(|| {
            self.error_at(start, LexErrorKind::InvalidFileType(word.to_string()))
        })?;

        tokens.push(self.token_at(start, TokenKind::FileType(file_type)));
        Ok(true)
    }

    fn track_type(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        let track_type = TrackType::from_str_ignore_case(word).ok_or_else(|| {
            self.error_at(start, LexErrorKind::InvalidTrackType(word.to_string()))
        })?;

        tokens.push(self.token_at(start, TokenKind::TrackType(track_type)));
        Ok(true)
    }

    fn flag(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let Some((start, word)) = self.next_word() else {
            return Ok(false);
        };

        let flag = TrackFlags::flag_from_str_ignore_case(word)
            .ok_or_else(|| self.error_at(start, LexErrorKind::InvalidFlag(word.to_string())))?;

        tokens.push(self.token_at(start, TokenKind::Flag(flag)));
        Ok(true)
    }

    /// A quoted string or a single unquoted word.
    fn string(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        self.skip_whitespace();
        if self.at_end() {
            return Ok(false);
        }

        let start = self.pos;
        let value = if self.peek() == Some('"') {
            self.quoted()?
        } else {
            let (_, word) = self.word();
            if word.contains('"') {
                return Err(self.error_at(start, LexErrorKind::MixedQuoting(word.to_string())));
            }
            word.to_string()
        };

        tokens.push(self.token_at(start, TokenKind::Text(value)));
        Ok(true)
    }

    /// A quoted string or everything up to the end of the line.
    fn free_text(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        self.skip_whitespace();
        if self.at_end() {
            return Ok(false);
        }

        let start = self.pos;
        let value = if self.peek() == Some('"') {
            self.quoted()?
        } else {
            let rest = self.text[start..].trim_end();
            self.pos = self.text.len();
            rest.to_string()
        };

        tokens.push(self.token_at(start, TokenKind::Text(value)));
        Ok(true)
    }

    /// A REM payload. A quoted key may be followed by a value, giving two
    /// text tokens.
    fn comment(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        self.skip_whitespace();
        if self.peek() != Some('"') {
            return self.free_text(tokens);
        }

        self.string(tokens)?;
        self.free_text(tokens)?;
        Ok(true)
    }

    fn quoted(&mut self) -> Result<String, LexError> {
        let text = self.text;
        let start = self.pos;
        let mut chars = text[start + 1..].char_indices();
        let mut value = String::new();

        loop {
            match chars.next() {
                None => return Err(self.error_at(start, LexErrorKind::UnterminatedString)),
                Some((i, '"')) => {
                    self.pos = start + 1 + i + 1;
                    break;
                }
                Some((_, '\\')) => match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    // Unknown escapes stay verbatim so Windows paths survive.
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error_at(start, LexErrorKind::UnterminatedString)),
                },
                Some((_, c)) => value.push(c),
            }
        }

        match self.peek() {
            Some(c) if !c.is_whitespace() => {
                let (at, tail) = self.word();
                Err(self.error_at(at, LexErrorKind::TrailingAfterQuote(tail.to_string())))
            }
            _ => Ok(value),
        }
    }

    fn next_word(&mut self) -> Option<(usize, &'a str)> {
        self.skip_whitespace();
        if self.at_end() {
            return None;
        }
        Some(self.word())
    }

    fn word(&mut self) -> (usize, &'a str) {
        let text = self.text;
        let start = self.pos;
        let end = text[start..]
            .find(char::is_whitespace)
            .map(|i| start + i)
            .unwrap_or(text.len());
        self.pos = end;
        (start, &text[start..end])
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn column(&self, pos: usize) -> usize {
        self.text[..pos].chars().count() + 1
    }

    fn token_at(&self, pos: usize, kind: TokenKind) -> Token {
        Token {
            kind,
            offset: self.offset + pos,
            line: self.line,
            column: self.column(pos),
        }
    }

    fn error_at(&self, pos: usize, kind: LexErrorKind) -> LexError {
        LexError {
            offset: self.offset + pos,
            line: self.line,
            column: self.column(pos),
            kind,
        }
    }
}
