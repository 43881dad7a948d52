use crate::cue::models::CueSheet;
use crate::probe::error::{ProbeError, ProbeResult};
use futures::future::try_join_all;
use indicatif::ProgressBar;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub mod error;

pub const DEFAULT_FFPROBE: &str = "ffprobe";
pub const FFPROBE_ENV: &str = "FFPROBE";
const CUESHEET_TAG: &str = "CUESHEET";

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FormatInfo,
}

/// The `format` section of an ffprobe report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatInfo {
    // ffprobe prints numbers as strings.
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl FormatInfo {
    pub fn duration(&self) -> Option<f64> {
        self.duration
            .as_deref()
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
    }

    /// CUE sheet stored in the `CUESHEET` tag. Taggers disagree on its case.
    pub fn cue_sheet(&self) -> Option<&str> {
        self.tags
            .get(CUESHEET_TAG)
            .or_else(|| {
                self.tags
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(CUESHEET_TAG))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
            .filter(|sheet| !sheet.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: PathBuf,
}

impl Ffprobe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Uses `$FFPROBE` when set, `ffprobe` from `PATH` otherwise.
    pub fn from_env() -> Self {
        let program = std::env::var_os(FFPROBE_ENV)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| OsString::from(DEFAULT_FFPROBE));
        Self::new(program)
    }

    pub async fn format(&self, path: &Path) -> ProbeResult<FormatInfo> {
        let output = Command::new(&self.program)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(path.as_os_str())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound(self.program.clone())
                } else {
                    ProbeError::IoError(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::FfprobeFailed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ffprobe_json(&output.stdout)
    }

    pub async fn duration(&self, path: &Path) -> ProbeResult<f64> {
        let duration = self
            .format(path)
            .await?
            .duration()
            .ok_or_else(|| ProbeError::NoDuration(path.to_path_buf()))?;
        debug!("Probed {path:?}: {duration:.3}s");

        Ok(duration)
    }
}

/// Reads the `format` section of `ffprobe -print_format json -show_format` output.
pub fn parse_ffprobe_json(json: &[u8]) -> ProbeResult<FormatInfo> {
    let output: FfprobeOutput = serde_json::from_slice(json)?;
    Ok(output.format)
}

/// Fills in durations for every file of `sheet` not already in `known`.
///
/// File names are resolved against `base_dir`, the directory of the CUE
/// sheet. Probes run concurrently, `progress` is advanced once per probe.
pub async fn probe_durations(
    ffprobe: &Ffprobe,
    sheet: &CueSheet,
    base_dir: &Path,
    mut known: HashMap<String, f64>,
    progress: Option<&ProgressBar>,
) -> ProbeResult<HashMap<String, f64>> {
    let mut missing: Vec<&str> = Vec::new();
    for file in &sheet.files {
        let name = file.filename.as_str();
        if !known.contains_key(name) && !missing.contains(&name) {
            missing.push(name);
        }
    }

    if let Some(pb) = progress {
        pb.set_length(missing.len() as u64);
    }

    let probes = missing.iter().map(|name| async move {
        let duration = ffprobe.duration(&base_dir.join(name)).await?;
        if let Some(pb) = progress {
            pb.inc(1);
        }
        Ok::<_, ProbeError>((name.to_string(), duration))
    });

    known.extend(try_join_all(probes).await?);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(known)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::parse_cue_str;

    #[test]
    fn reads_duration_from_json() {
        let json = br#"{"format": {"filename": "a.mp3", "duration": "3723.480000", "bit_rate": "64000"}}"#;
        let format = parse_ffprobe_json(json).unwrap();
        assert_eq!(format.duration(), Some(3723.48));
        assert_eq!(format.cue_sheet(), None);
    }

    #[test]
    fn missing_or_bad_duration_reads_as_none() {
        for json in [
            br#"{"format": {}}"#.as_slice(),
            br#"{"format": {"duration": "N/A"}}"#.as_slice(),
            br#"{"format": {"duration": "-4"}}"#.as_slice(),
        ] {
            assert_eq!(parse_ffprobe_json(json).unwrap().duration(), None);
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_ffprobe_json(b"not json"),
            Err(ProbeError::JsonError(_))
        ));
    }

    #[test]
    fn embedded_cue_sheet_is_found_in_any_case() {
        let json = br#"{"format": {"duration": "60.0", "tags": {"title": "Book", "cuesheet": "FILE a.flac WAVE\n"}}}"#;
        assert_eq!(
            parse_ffprobe_json(json).unwrap().cue_sheet(),
            Some("FILE a.flac WAVE
")
        );

        let json = br#"{"format": {"tags": {"CueSheet": "FILE b.flac WAVE"}}}"#;
        assert_eq!(
            parse_ffprobe_json(json).unwrap().cue_sheet(),
            Some("FILE b.flac WAVE")
        );

        let json = br#"{"format": {"tags": {"cuesheet": "lower", "CUESHEET": "upper"}}}"#;
        assert_eq!(parse_ffprobe_json(json).unwrap().cue_sheet(), Some("upper"));

        let json = br#"{"format": {"tags": {"CUESHEET": "  "}}}"#;
        assert_eq!(parse_ffprobe_json(json).unwrap().cue_sheet(), None);
    }

    #[tokio::test]
    async fn known_durations_skip_probing() {
        let sheet = parse_cue_str(
            "FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\nFILE b.wav WAVE\nTRACK 02 AUDIO\nINDEX 01 00:00:00\n",
        )
        .unwrap();
        let known = HashMap::from([("a.wav".to_string(), 1.0), ("b.wav".to_string(), 2.0)]);

        // The program does not exist, so any probe would fail.
        let ffprobe = Ffprobe::new("/nonexistent/ffprobe");
        let durations = probe_durations(&ffprobe, &sheet, Path::new("."), known, None)
            .await
            .unwrap();

        assert_eq!(durations.len(), 2);
        assert_eq!(durations["b.wav"], 2.0);
    }

    #[tokio::test]
    async fn absent_ffprobe_is_reported() {
        let sheet =
            parse_cue_str("FILE a.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\n").unwrap();
        let ffprobe = Ffprobe::new("/nonexistent/ffprobe");

        let err = probe_durations(&ffprobe, &sheet, Path::new("."), HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::FfprobeNotFound(_)));
    }
}
