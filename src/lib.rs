pub mod book;
pub mod chapter;
pub mod cue;
pub mod probe;
