use crate::cue::error::CueResult;
use crate::cue::models::CueSheet;
use log::debug;
use std::path::{Path, PathBuf};

pub mod builder;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod models;
pub mod writer;

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
        // Non UTF-8 bytes become replacement characters.
        let text = String::from_utf8_lossy(&data);

        debug!("Parsing CUE sheet: {:?}", self.cue_path);
        parse_cue_str(&text)
    }
}

/// Runs lexer, grammar and builder over CUE text.
pub fn parse_cue_str(input: &str) -> CueResult<CueSheet> {
    let tokens = lexer::tokenize(input)?;
    let tree = grammar::parse(&tokens)?;
    let sheet = builder::build(tree)?;

    debug!(
        "CUE sheet has {} file(s) and {} track(s)",
        sheet.files.len(),
        sheet.tracks().count()
    );

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::error::{CueError, LexErrorKind, SemanticError};
    use std::io::Write;

    #[tokio::test]
    async fn parses_sheet_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{feff}\r\nTITLE \"Book\"\r\nFILE \"book.m4b\" MP3\r\n  TRACK 01 AUDIO\r\n    INDEX 01 00:00:00\r\n"
        )
        .unwrap();

        let sheet = CueParser::new(file.path()).parse().await.unwrap();
        assert_eq!(sheet.title.as_deref(), Some("Book"));
        assert_eq!(sheet.files[0].filename, "book.m4b");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CueParser::new(dir.path().join("absent.cue"))
            .parse()
            .await
            .unwrap_err();
        assert!(matches!(err, CueError::IoError(_)));
    }

    #[test]
    fn errors_from_each_stage_are_distinguishable() {
        assert!(matches!(
            parse_cue_str("INDEX 01 0:0"),
            Err(CueError::LexError(e)) if e.kind == LexErrorKind::InvalidTimeCode("0:0".to_string())
        ));
        assert!(matches!(
            parse_cue_str("TITLE x\n"),
            Err(CueError::SyntaxError(_))
        ));
        assert!(matches!(
            parse_cue_str("FILE a.wav WAVE\nTRACK 01 AUDIO\n"),
            Err(CueError::SemanticError(SemanticError::MissingIndex(1)))
        ));
    }
}
