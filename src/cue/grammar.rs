//! Recursive descent over the token stream.
//!
//! ```text
//! sheet := (catalog | cdtextfile | rem | performer | title)* file+
//! file  := file_line (rem | performer | title | track)+
//! track := track_line (title | performer | flags | isrc | rem | index | postgap | pregap)*
//! ```
//!
//! Every line starts with a keyword, so the keyword alone picks the
//! production and no backtracking is needed. Cross-field rules are left to
//! the builder.

use crate::cue::error::SyntaxError;
use crate::cue::lexer::{Keyword, Token, TokenKind};
use crate::cue::models::{FileType, TrackType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTimeCode {
    pub minutes: u64,
    pub seconds: u8,
    pub frames: u8,
}

/// A single-line production together with where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<T> {
    pub line: usize,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Catalog(String),
    CdTextFile(String),
    Rem(String),
    Performer(String),
    Title(String),
    Isrc(String),
    Flags(Vec<u8>),
    Index { number: u8, position: RawTimeCode },
    Pregap(RawTimeCode),
    Postgap(RawTimeCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNode {
    pub statements: Vec<Line<Statement>>,
    pub files: Vec<FileNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub line: usize,
    pub name: String,
    pub file_type: FileType,
    pub items: Vec<FileItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileItem {
    Statement(Line<Statement>),
    Track(TrackNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackNode {
    pub line: usize,
    pub number: u64,
    pub track_type: TrackType,
    pub statements: Vec<Line<Statement>>,
}

pub fn parse(tokens: &[Token]) -> Result<SheetNode, SyntaxError> {
    Parser { tokens, pos: 0 }.sheet()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn sheet(&mut self) -> Result<SheetNode, SyntaxError> {
        let mut statements = Vec::new();

        loop {
            match self.peek_keyword() {
                Some(
                    Keyword::Catalog
                    | Keyword::CdTextFile
                    | Keyword::Rem
                    | Keyword::Performer
                    | Keyword::Title,
                ) => statements.push(self.statement()?),
                Some(Keyword::File) => break,
                _ => {
                    return Err(
                        self.unexpected("CATALOG, CDTEXTFILE, REM, PERFORMER, TITLE or FILE")
                    );
                }
            }
        }

        let mut files = Vec::new();
        while self.peek_keyword() == Some(Keyword::File) {
            files.push(self.file()?);
        }

        if self.pos < self.tokens.len() {
            return Err(self.unexpected("FILE or end of input"));
        }

        Ok(SheetNode { statements, files })
    }

    fn file(&mut self) -> Result<FileNode, SyntaxError> {
        let line = self.expect_keyword(Keyword::File)?;
        let name = self.expect("file name", |kind| match kind {
            TokenKind::Text(text) => Some(text.clone()),
            _ => None,
        })?;
        let file_type = self.expect("file type", |kind| match kind {
            TokenKind::FileType(file_type) => Some(*file_type),
            _ => None,
        })?;
        self.expect_line_end()?;

        let mut items = Vec::new();
        loop {
            match self.peek_keyword() {
                Some(Keyword::Rem | Keyword::Performer | Keyword::Title) => {
                    items.push(FileItem::Statement(self.statement()?))
                }
                Some(Keyword::Track) => items.push(FileItem::Track(self.track()?)),
                _ => break,
            }
        }

        if items.is_empty() {
            return Err(self.unexpected("REM, PERFORMER, TITLE or TRACK"));
        }

        Ok(FileNode {
            line,
            name,
            file_type,
            items,
        })
    }

    fn track(&mut self) -> Result<TrackNode, SyntaxError> {
        let line = self.expect_keyword(Keyword::Track)?;
        let number = self.expect("track number", |kind| match kind {
            TokenKind::TrackNumber(number) => Some(*number),
            _ => None,
        })?;
        let track_type = self.expect("track type", |kind| match kind {
            TokenKind::TrackType(track_type) => Some(*track_type),
            _ => None,
        })?;
        self.expect_line_end()?;

        let mut statements = Vec::new();
        while let Some(
            Keyword::Title
            | Keyword::Performer
            | Keyword::Flags
            | Keyword::Isrc
            | Keyword::Rem
            | Keyword::Index
            | Keyword::Postgap
            | Keyword::Pregap,
        ) = self.peek_keyword()
        {
            statements.push(self.statement()?);
        }

        Ok(TrackNode {
            line,
            number,
            track_type,
            statements,
        })
    }

    fn statement(&mut self) -> Result<Line<Statement>, SyntaxError> {
        let Some(keyword) = self.peek_keyword() else {
            return Err(self.unexpected("keyword"));
        };
        let line = self.expect_keyword(keyword)?;

        let value = match keyword {
            Keyword::Catalog => Statement::Catalog(self.expect("catalog number", |kind| {
                match kind {
                    TokenKind::Catalog(catalog) => Some(catalog.clone()),
                    _ => None,
                }
            })?),
            Keyword::CdTextFile => Statement::CdTextFile(self.expect_text("CD-Text file name")?),
            Keyword::Rem => {
                let payload = self.expect_text("comment")?;
                match self.peek_kind() {
                    // Quoted key followed by its value.
                    Some(TokenKind::Text(_)) => {
                        let value = self.expect_text("comment value")?;
                        Statement::Rem(format!("{payload} {value}"))
                    }
                    _ => Statement::Rem(payload),
                }
            }
            Keyword::Performer => Statement::Performer(self.expect_text("performer")?),
            Keyword::Title => Statement::Title(self.expect_text("title")?),
            Keyword::Isrc => Statement::Isrc(self.expect_text("ISRC code")?),
            Keyword::Flags => {
                let mut flags = vec![self.expect_flag()?];
                while let Some(TokenKind::Flag(_)) = self.peek_kind() {
                    flags.push(self.expect_flag()?);
                }
                Statement::Flags(flags)
            }
            Keyword::Index => {
                let number = self.expect("index number", |kind| match kind {
                    TokenKind::IndexNumber(number) => Some(*number),
                    _ => None,
                })?;
                let position = self.expect_timecode()?;
                Statement::Index { number, position }
            }
            Keyword::Pregap => Statement::Pregap(self.expect_timecode()?),
            Keyword::Postgap => Statement::Postgap(self.expect_timecode()?),
            Keyword::File | Keyword::Track => {
                self.pos -= 1;
                return Err(self.unexpected("statement"));
            }
        };

        self.expect_line_end()?;
        Ok(Line { line, value })
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<usize, SyntaxError> {
        let expected = keyword.as_str();
        let line = self.tokens.get(self.pos).map(|token| token.line);
        self.expect(expected, |kind| (*kind == TokenKind::Keyword(keyword)).then_some(()))?;
        Ok(line.unwrap_or_default())
    }

    fn expect_text(&mut self, expected: &'static str) -> Result<String, SyntaxError> {
        self.expect(expected, |kind| match kind {
            TokenKind::Text(text) => Some(text.clone()),
            _ => None,
        })
    }

    fn expect_flag(&mut self) -> Result<u8, SyntaxError> {
        self.expect("track flag", |kind| match kind {
            TokenKind::Flag(flag) => Some(*flag),
            _ => None,
        })
    }

    fn expect_timecode(&mut self) -> Result<RawTimeCode, SyntaxError> {
        self.expect("timecode", |kind| match kind {
            TokenKind::TimeCode {
                minutes,
                seconds,
                frames,
            } => Some(RawTimeCode {
                minutes: *minutes,
                seconds: *seconds,
                frames: *frames,
            }),
            _ => None,
        })
    }

    fn expect_line_end(&mut self) -> Result<(), SyntaxError> {
        self.expect("end of line", |kind| {
            (*kind == TokenKind::LineEnd).then_some(())
        })
    }

    fn expect<T>(
        &mut self,
        expected: &'static str,
        pick: impl FnOnce(&TokenKind) -> Option<T>,
    ) -> Result<T, SyntaxError> {
        match self.tokens.get(self.pos).and_then(|token| pick(&token.kind)) {
            Some(value) => {
                self.pos += 1;
                Ok(value)
            }
            None => Err(self.unexpected(expected)),
        }
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|token| &token.kind)
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(keyword)) => Some(*keyword),
            _ => None,
        }
    }

    fn unexpected(&self, expected: &'static str) -> SyntaxError {
        match self.tokens.get(self.pos) {
            Some(token) => SyntaxError {
                line: token.line,
                column: token.column,
                expected,
                found: token.kind.describe(),
            },
            None => SyntaxError {
                line: self.tokens.last().map(|token| token.line + 1).unwrap_or(1),
                column: 1,
                expected,
                found: "end of input".to_string(),
            },
        }
    }
}
