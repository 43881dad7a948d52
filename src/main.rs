use crate::commands::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use cuebook::book::{
    ChapterOptions, check_cue, normalize_cue, write_chapters, write_embedded_chapters,
};
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(cmd) => {
            check_cue(&cmd.input_cue).await?;
        }
        Commands::Chapters(cmd) if cmd.embedded => {
            write_embedded_chapters(&cmd.input, cmd.output.as_deref(), cmd.force).await?;
        }
        Commands::Chapters(cmd) => {
            let options = ChapterOptions {
                durations: cmd.duration.into_iter().collect(),
                probe: cmd.probe,
                output: cmd.output,
                force: cmd.force,
            };
            write_chapters(pb.clone(), &cmd.input, options).await?;
        }
        Commands::Normalize(cmd) => {
            normalize_cue(&cmd.input_cue, cmd.output.as_deref(), cmd.force).await?
        }
    }

    Ok(())
}
