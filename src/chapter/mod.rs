use crate::cue::error::SemanticError;
use crate::cue::models::CueSheet;
use log::debug;
use std::collections::HashMap;
use std::hash::BuildHasher;

pub mod ffmetadata;

/// Supplies the measured length of each audio file a sheet references.
pub trait DurationSource {
    /// Length in seconds, `None` if the file is unknown.
    fn duration_of(&self, file_name: &str) -> Option<f64>;
}

impl<S: BuildHasher> DurationSource for HashMap<String, f64, S> {
    fn duration_of(&self, file_name: &str) -> Option<f64> {
        self.get(file_name).copied()
    }
}

/// A span of the merged output stream, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub title: String,
    pub start: f64,
    /// Exclusive.
    pub end: f64,
}

/// Lays the files of `sheet` end to end and turns every track into a chapter.
///
/// A track starts at its INDEX 01 (falling back to INDEX 00, then to its
/// first index) plus its PREGAP, relative to the start of its file. Each file
/// moves the timeline forward by its full measured duration, so audio after
/// the last index of a file still belongs to that file's last chapter.
pub fn resolve_chapters(
    sheet: &CueSheet,
    durations: &impl DurationSource,
) -> Result<Vec<Chapter>, SemanticError> {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut file_offset = 0.0;
    let mut last_track = 0;

    for file in &sheet.files {
        let file_duration = durations
            .duration_of(&file.filename)
            .ok_or_else(|| SemanticError::MissingDuration(file.filename.clone()))?;

        if !file_duration.is_finite() || file_duration < 0.0 {
            return Err(SemanticError::InvalidDuration {
                file: file.filename.clone(),
                duration: file_duration,
            });
        }

        for track in &file.tracks {
            let index = track
                .start_index()
                .ok_or(SemanticError::MissingIndex(track.number))?;
            let pregap = track.pregap.map_or(0.0, |gap| gap.as_secs_f64());
            let start = file_offset + index.position.as_secs_f64() + pregap;

            if let Some(previous) = chapters.last_mut() {
                if start <= previous.start {
                    return Err(SemanticError::NonIncreasingChapterStart {
                        track: track.number,
                        previous: previous.start,
                        current: start,
                    });
                }
                previous.end = start;
            }

            chapters.push(Chapter {
                title: track
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Track {}", track.number)),
                start,
                end: start,
            });
            last_track = track.number;
        }

        file_offset += file_duration;
    }

    if let Some(last) = chapters.last_mut() {
        if file_offset <= last.start {
            return Err(SemanticError::ChapterPastEndOfStream {
                track: last_track,
                start: last.start,
                end: file_offset,
            });
        }
        last.end = file_offset;
    }

    debug!(
        "Resolved {} chapter(s) over {:.3}s of audio",
        chapters.len(),
        file_offset
    );

    Ok(chapters)
}
