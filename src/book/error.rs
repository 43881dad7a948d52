use crate::cue::error::{CueError, SemanticError};
use crate::probe::error::ProbeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    SemanticError(#[from] SemanticError),

    #[error(transparent)]
    ProbeError(#[from] ProbeError),

    #[error("Output file {0:?} already exists, use --force to overwrite")]
    OutputAlreadyExists(PathBuf),

    #[error("{0:?} has no embedded CUE sheet")]
    NoEmbeddedCueSheet(PathBuf),

    #[error("CUE sheet embedded in {path:?} describes {files} files, expected one")]
    EmbeddedSheetSpansFiles { path: PathBuf, files: usize },
}

pub type BookResult<T> = Result<T, BookError>;
