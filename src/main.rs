use crate::commands::{Cli, Commands};
use crate::join::join_cue_sheets_in_dir;
use crate::split::split_cue_sheets;
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

mod cd;
mod commands;
mod cue;
mod encode;
mod error;
mod join;
mod split;
mod util;
mod wave;

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
        Commands::Split(cmd) => split_cue_sheets(pb.clone(), cmd).await?,
        Commands::Join(cmd) => join_cue_sheets_in_dir(pb.clone(), cmd).await?,
    }

    Ok(())
}
