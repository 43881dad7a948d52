use crate::cue::models::{Comment, CueFile, CueSheet, CueTrack};
use std::fmt::{self, Display, Formatter, Write};

impl Display for CueSheet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for comment in &self.comments {
            write_comment(f, "", comment)?;
        }
        if let Some(catalog) = &self.catalog {
            writeln!(f, "CATALOG {catalog}")?;
        }
        if let Some(cdtextfile) = &self.cdtextfile {
            writeln!(f, "CDTEXTFILE {}", Quoted(cdtextfile))?;
        }
        if let Some(performer) = &self.performer {
            writeln!(f, "PERFORMER {}", Quoted(performer))?;
        }
        if let Some(title) = &self.title {
            writeln!(f, "TITLE {}", Quoted(title))?;
        }
        for file in &self.files {
            write!(f, "{file}")?;
        }
        Ok(())
    }
}

impl Display for CueFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FILE {} {}",
            Quoted(&self.filename),
            self.file_type.as_str()
        )?;
        if let Some(title) = &self.title {
            writeln!(f, "  TITLE {}", Quoted(title))?;
        }
        if let Some(performer) = &self.performer {
            writeln!(f, "  PERFORMER {}", Quoted(performer))?;
        }
        for comment in &self.comments {
            write_comment(f, "  ", comment)?;
        }
        for track in &self.tracks {
            write!(f, "{track}")?;
        }
        Ok(())
    }
}

impl Display for CueTrack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  TRACK {:02} {}",
            self.number,
            self.track_type.as_str()
        )?;
        if let Some(title) = &self.title {
            writeln!(f, "    TITLE {}", Quoted(title))?;
        }
        if let Some(performer) = &self.performer {
            writeln!(f, "    PERFORMER {}", Quoted(performer))?;
        }
        for comment in &self.comments {
            write_comment(f, "    ", comment)?;
        }
        if let Some(isrc) = &self.isrc {
            writeln!(f, "    ISRC {}", FreeText(isrc))?;
        }
        if !self.flags.is_empty() {
            let names: Vec<&str> = self.flags.names().collect();
            writeln!(f, "    FLAGS {}", names.join(" "))?;
        }
        if let Some(pregap) = &self.pregap {
            writeln!(f, "    PREGAP {pregap}")?;
        }
        for index in &self.indices {
            writeln!(f, "    INDEX {:02} {}", index.number, index.position)?;
        }
        if let Some(postgap) = &self.postgap {
            writeln!(f, "    POSTGAP {postgap}")?;
        }
        Ok(())
    }
}

fn write_comment(f: &mut Formatter<'_>, indent: &str, comment: &Comment) -> fmt::Result {
    writeln!(f, "{indent}REM {}", FreeText(&comment.0))
}

/// Always double-quoted.
struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

/// Bare when reading it back as rest-of-line gives the same text, quoted otherwise.
struct FreeText<'a>(&'a str);

impl Display for FreeText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let value = self.0;
        let bare = !value.is_empty()
            && !value.starts_with('"')
            && value.trim() == value
            && !value.contains(['\n', '\r']);

        if bare {
            f.write_str(value)
        } else {
            write!(f, "{}", Quoted(value))
        }
    }
}
