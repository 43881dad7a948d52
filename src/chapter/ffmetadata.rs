//! `;FFMETADATA1` rendering for ffmpeg's `-map_metadata`/`-map_chapters`.

use crate::chapter::Chapter;
use crate::cue::models::CueSheet;
use std::fmt::Write;

pub const HEADER: &str = ";FFMETADATA1";

/// Global tags taken from REM lines: (REM key, ffmpeg tag).
const REM_TAGS: [(&str, &str); 4] = [
    ("GENRE", "genre"),
    ("DATE", "date"),
    ("COMMENT", "comment"),
    ("PUBLISHER", "publisher"),
];

/// Renders the sheet's global tags followed by one `[CHAPTER]` block per chapter.
pub fn render(sheet: &CueSheet, chapters: &[Chapter]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    if let Some(title) = &sheet.title {
        push_tag(&mut out, "title", title);
        push_tag(&mut out, "album", title);
    }
    if let Some(performer) = &sheet.performer {
        push_tag(&mut out, "artist", performer);
    }
    for (key, tag) in REM_TAGS {
        if let Some(comment) = sheet.comment(key) {
            push_tag(&mut out, tag, comment.value());
        }
    }

    out.push_str(&render_chapters(chapters));
    out
}

/// Only the `[CHAPTER]` blocks, in milliseconds.
pub fn render_chapters(chapters: &[Chapter]) -> String {
    let mut out = String::new();

    for chapter in chapters {
        out.push_str("[CHAPTER]\nTIMEBASE=1/1000\n");
        // Writing into a String cannot fail.
        let _ = writeln!(out, "START={}", to_millis(chapter.start));
        let _ = writeln!(out, "END={}", to_millis(chapter.end));
        push_tag(&mut out, "title", &chapter.title);
    }

    out
}

fn to_millis(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

fn push_tag(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push('=');
    out.push_str(&escape(value));
    out.push('\n');
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::resolve_chapters;
    use crate::cue::parse_cue_str;
    use std::collections::HashMap;

    #[test]
    fn renders_global_tags_and_chapters() {
        let sheet = parse_cue_str(
            "REM GENRE Audiobook\n\
             REM DATE 1937\n\
             PERFORMER \"J. R. R. Tolkien\"\n\
             TITLE \"The Hobbit\"\n\
             FILE \"hobbit.wav\" WAVE\n\
             TRACK 01 AUDIO\n\
             TITLE \"An Unexpected Party\"\n\
             INDEX 01 00:00:00\n\
             TRACK 02 AUDIO\n\
             INDEX 01 00:01:37\n",
        )
        .unwrap();
        let durations = HashMap::from([("hobbit.wav".to_string(), 10.5)]);
        let chapters = resolve_chapters(&sheet, &durations).unwrap();

        assert_eq!(
            render(&sheet, &chapters),
            ";FFMETADATA1\n\
             title=The Hobbit\n\
             album=The Hobbit\n\
             artist=J. R. R. Tolkien\n\
             genre=Audiobook\n\
             date=1937\n\
             [CHAPTER]\n\
             TIMEBASE=1/1000\n\
             START=0\n\
             END=1493\n\
             title=An Unexpected Party\n\
             [CHAPTER]\n\
             TIMEBASE=1/1000\n\
             START=1493\n\
             END=10500\n\
             title=Track 2\n"
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape("a=b;c#d\\e\nf"), "a\\=b\\;c\\#d\\\\e\\\nf");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn no_chapters_render_nothing() {
        assert_eq!(render_chapters(&[]), "");
    }
}
