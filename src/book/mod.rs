use crate::book::error::{BookError, BookResult};
use crate::chapter::{Chapter, ffmetadata, resolve_chapters};
use crate::cue::models::CueSheet;
use crate::cue::{CueParser, parse_cue_str};
use crate::probe::error::ProbeError;
use crate::probe::{Ffprobe, FormatInfo, probe_durations};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub mod error;

#[derive(Debug, Clone, Default)]
pub struct ChapterOptions {
    /// Durations given up front, keyed by the file name used in the sheet.
    pub durations: HashMap<String, f64>,
    /// Ask ffprobe for every duration not given up front.
    pub probe: bool,
    pub output: Option<PathBuf>,
    pub force: bool,
}

/// Parses and validates a sheet, logging a short summary.
pub async fn check_cue(cue_path: &Path) -> BookResult<CueSheet> {
    let sheet = CueParser::new(cue_path).parse().await?;

    info!(
        "{:?} is valid: {} file(s), {} track(s)",
        cue_path,
        sheet.files.len(),
        sheet.tracks().count()
    );
    for file in &sheet.files {
        debug!(
            "  {} ({}): {} track(s)",
            file.filename,
            file.file_type.as_str(),
            file.tracks.len()
        );
    }

    Ok(sheet)
}

/// Resolves the chapters of a sheet and writes them as FFMETADATA, to
/// `options.output` or stdout.
pub async fn write_chapters(
    pb: MultiProgress,
    cue_path: &Path,
    options: ChapterOptions,
) -> BookResult<Vec<Chapter>> {
    ensure_writable(options.output.as_deref(), options.force).await?;

    let sheet = CueParser::new(cue_path).parse().await?;

    let durations = if options.probe {
        let base_dir = cue_path.parent().unwrap_or(Path::new("."));
        let progress = pb.add(ProgressBar::new(0));
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Probing durations");

        let probed = probe_durations(
            &Ffprobe::from_env(),
            &sheet,
            base_dir,
            options.durations,
            Some(&progress),
        )
        .await;
        pb.remove(&progress);
        probed?
    } else {
        options.durations
    };

    let chapters = resolve_chapters(&sheet, &durations)?;
    info!("Resolved {} chapter(s) from {:?}", chapters.len(), cue_path);

    write_ffmetadata(&sheet, &chapters, options.output.as_deref()).await?;
    Ok(chapters)
}

/// Like [`write_chapters`], for a sheet stored in the `CUESHEET` tag of
/// `audio_path`.
pub async fn write_embedded_chapters(
    audio_path: &Path,
    output: Option<&Path>,
    force: bool,
) -> BookResult<Vec<Chapter>> {
    ensure_writable(output, force).await?;

    let format = Ffprobe::from_env().format(audio_path).await?;
    let (sheet, durations) = embedded_sheet(audio_path, &format)?;

    let chapters = resolve_chapters(&sheet, &durations)?;
    info!(
        "Resolved {} chapter(s) from the CUE sheet embedded in {:?}",
        chapters.len(),
        audio_path
    );

    write_ffmetadata(&sheet, &chapters, output).await?;
    Ok(chapters)
}

/// Parses the sheet embedded in an audio file. It must describe that one
/// file, so its duration is the file's own.
pub fn embedded_sheet(
    audio_path: &Path,
    format: &FormatInfo,
) -> BookResult<(CueSheet, HashMap<String, f64>)> {
    let text = format
        .cue_sheet()
        .ok_or_else(|| BookError::NoEmbeddedCueSheet(audio_path.to_path_buf()))?;
    let sheet = parse_cue_str(text)?;

    let [file] = sheet.files.as_slice() else {
        return Err(BookError::EmbeddedSheetSpansFiles {
            path: audio_path.to_path_buf(),
            files: sheet.files.len(),
        });
    };

    let duration = format
        .duration()
        .ok_or_else(|| ProbeError::NoDuration(audio_path.to_path_buf()))?;
    debug!("Embedded sheet names {:?}, {duration:.3}s long", file.filename);

    let durations = HashMap::from([(file.filename.clone(), duration)]);
    Ok((sheet, durations))
}

/// Re-serializes a sheet in canonical form.
pub async fn normalize_cue(cue_path: &Path, output: Option<&Path>, force: bool) -> BookResult<()> {
    ensure_writable(output, force).await?;

    let sheet = CueParser::new(cue_path).parse().await?;
    write_output(output, &sheet.to_string()).await
}

async fn ensure_writable(output: Option<&Path>, force: bool) -> BookResult<()> {
    let Some(output) = output else {
        return Ok(());
    };

    if fs::try_exists(output).await? {
        if !force {
            return Err(BookError::OutputAlreadyExists(output.to_path_buf()));
        }
        warn!("Overwriting {output:?}");
    }

    Ok(())
}

async fn write_ffmetadata(
    sheet: &CueSheet,
    chapters: &[Chapter],
    output: Option<&Path>,
) -> BookResult<()> {
    write_output(output, &ffmetadata::render(sheet, chapters)).await
}

async fn write_output(output: Option<&Path>, content: &str) -> BookResult<()> {
    match output {
        Some(path) => {
            fs::write(path, content).await?;
            debug!("Wrote {path:?}");
        }
        None => print!("{content}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "TITLE \"Book\"\n\
                         FILE \"one.mp3\" MP3\n\
                         TRACK 01 AUDIO\n\
                         TITLE \"Start\"\n\
                         INDEX 01 00:00:00\n\
                         FILE \"two.mp3\" MP3\n\
                         TRACK 02 AUDIO\n\
                         INDEX 01 00:00:00\n";

    async fn sheet_in(dir: &Path) -> PathBuf {
        let path = dir.join("book.cue");
        fs::write(&path, SHEET).await.unwrap();
        path
    }

    #[tokio::test]
    async fn writes_chapters_with_given_durations() {
        let dir = tempfile::tempdir().unwrap();
        let cue_path = sheet_in(dir.path()).await;
        let output = dir.path().join("chapters.ffmeta");

        let chapters = write_chapters(
            MultiProgress::new(),
            &cue_path,
            ChapterOptions {
                durations: HashMap::from([
                    ("one.mp3".to_string(), 300.0),
                    ("two.mp3".to_string(), 200.0),
                ]),
                output: Some(output.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(chapters.len(), 2);
        let written = fs::read_to_string(&output).await.unwrap();
        assert!(written.starts_with(";FFMETADATA1\ntitle=Book\n"));
        assert!(written.contains("START=300000\nEND=500000\ntitle=Track 2\n"));
    }

    #[tokio::test]
    async fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let cue_path = sheet_in(dir.path()).await;
        let output = dir.path().join("existing.cue");
        fs::write(&output, "keep me").await.unwrap();

        let err = normalize_cue(&cue_path, Some(output.as_path()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::OutputAlreadyExists(_)));
        assert_eq!(fs::read_to_string(&output).await.unwrap(), "keep me");

        normalize_cue(&cue_path, Some(output.as_path()), true).await.unwrap();
        let normalized = fs::read_to_string(&output).await.unwrap();
        assert!(normalized.starts_with("TITLE \"Book\"\nFILE \"one.mp3\" MP3\n"));
    }

    #[tokio::test]
    async fn missing_duration_fails_the_book() {
        let dir = tempfile::tempdir().unwrap();
        let cue_path = sheet_in(dir.path()).await;

        let err = write_chapters(
            MultiProgress::new(),
            &cue_path,
            ChapterOptions {
                durations: HashMap::from([("one.mp3".to_string(), 300.0)]),
                output: Some(dir.path().join("out.ffmeta")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BookError::SemanticError(_)));
        assert!(!dir.path().join("out.ffmeta").exists());
    }

    const EMBEDDED: &[u8] = br#"{"format": {"filename": "book.flac", "duration": "600.000000", "tags": {"TITLE": "Book", "cuesheet": "TITLE \"Book\"\nFILE \"book.flac\" WAVE\n  TRACK 01 AUDIO\n    TITLE \"One\"\n    INDEX 01 00:00:00\n  TRACK 02 AUDIO\n    INDEX 01 05:00:00\n"}}}"#;

    #[test]
    fn embedded_sheet_uses_the_file_duration() {
        let format = crate::probe::parse_ffprobe_json(EMBEDDED).unwrap();
        let (sheet, durations) = embedded_sheet(Path::new("book.flac"), &format).unwrap();

        assert_eq!(durations, HashMap::from([("book.flac".to_string(), 600.0)]));

        let chapters = resolve_chapters(&sheet, &durations).unwrap();
        assert_eq!(
            chapters,
            vec![
                Chapter {
                    title: "One".to_string(),
                    start: 0.0,
                    end: 300.0
                },
                Chapter {
                    title: "Track 2".to_string(),
                    start: 300.0,
                    end: 600.0
                },
            ]
        );
    }

    #[test]
    fn embedded_sheet_must_exist_and_describe_one_file() {
        let format =
            crate::probe::parse_ffprobe_json(br#"{"format": {"duration": "1.0"}}"#).unwrap();
        assert!(matches!(
            embedded_sheet(Path::new("a.flac"), &format),
            Err(BookError::NoEmbeddedCueSheet(_))
        ));

        let format = crate::probe::parse_ffprobe_json(
            br#"{"format": {"duration": "9.0", "tags": {"CUESHEET": "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nFILE b.wav WAVE\nTRACK 02 AUDIO\nINDEX 01 00:00:00\n"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            embedded_sheet(Path::new("a.flac"), &format),
            Err(BookError::EmbeddedSheetSpansFiles { files: 2, .. })
        ));

        let format = crate::probe::parse_ffprobe_json(
            br#"{"format": {"tags": {"CUESHEET": "FILE a.wav WAVE\nTRACK 01 AUDIO\n"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            embedded_sheet(Path::new("a.flac"), &format),
            Err(BookError::CueError(_))
        ));
    }

    #[tokio::test]
    async fn check_reports_invalid_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let cue_path = dir.path().join("bad.cue");
        fs::write(&cue_path, "TRACK 01 AUDIO\n").await.unwrap();

        assert!(matches!(
            check_cue(&cue_path).await,
            Err(BookError::CueError(_))
        ));
    }
}
