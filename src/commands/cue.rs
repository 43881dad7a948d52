use clap::Parser;
use std::path::PathBuf;

/// Parses and validates a CUE sheet without writing anything.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct CheckCommand {
    /// CUE sheet to validate
    #[arg(value_name = "INPUT_CUE")]
    pub input_cue: PathBuf,
}

/// Resolves the chapters of a CUE sheet and writes them as FFMETADATA.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    long_about = "Resolves the chapters of a CUE sheet and writes them as FFMETADATA\n\nEvery FILE referenced by the sheet needs a duration, either given with --duration or measured with --probe (uses ffprobe, override the executable with the FFPROBE environment variable)\n\nWith --embedded the input is an audio file whose CUESHEET tag holds the sheet, its duration is read with ffprobe"
)]
pub struct ChaptersCommand {
    /// CUE sheet describing the book, or an audio file with --embedded
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Read the CUE sheet embedded in the input audio file
    #[arg(long, short = 'e', default_value_t = false, conflicts_with_all = ["duration", "probe"])]
    pub embedded: bool,

    /// Duration of a referenced file as NAME=SECONDS, may be repeated
    #[arg(long, short = 'd', value_name = "NAME=SECONDS", value_parser = parse_duration_arg)]
    pub duration: Vec<(String, f64)>,

    /// Measure durations that were not given with ffprobe
    #[arg(long, short = 'p', default_value_t = false)]
    pub probe: bool,

    /// Output FFMETADATA file, defaults to stdout
    #[arg(long, short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

/// Rewrites a CUE sheet in canonical form.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct NormalizeCommand {
    /// CUE sheet to rewrite
    #[arg(value_name = "INPUT_CUE")]
    pub input_cue: PathBuf,

    /// Output CUE file, defaults to stdout
    #[arg(long, short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

fn parse_duration_arg(value: &str) -> Result<(String, f64), String> {
    let (name, secs) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=SECONDS, got {value}"))?;

    let secs: f64 = secs
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: {secs}"))?;

    if name.is_empty() || !secs.is_finite() || secs < 0.0 {
        return Err(format!("expected NAME=SECONDS, got {value}"));
    }

    Ok((name.to_string(), secs))
}
