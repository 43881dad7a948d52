use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("ffprobe executable not found: {0:?}, install ffmpeg or set FFPROBE")]
    FfprobeNotFound(PathBuf),

    #[error("ffprobe failed on {path:?}: {stderr}")]
    FfprobeFailed { path: PathBuf, stderr: String },

    #[error("ffprobe reported no usable duration for {0:?}")]
    NoDuration(PathBuf),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
