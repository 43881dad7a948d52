use crate::commands::cue::{ChaptersCommand, CheckCommand, NormalizeCommand};
use clap::{Parser, Subcommand};

pub mod cue;

/// CLI for validating audiobook CUE sheets and turning them into chapters.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Check(CheckCommand),
    Chapters(ChaptersCommand),
    Normalize(NormalizeCommand),
}
