use crate::commands::join::JoinCommand;
use crate::commands::split::SplitCommand;
use clap::{Parser, Subcommand};

pub mod join;
pub mod split;

/// CLI for splitting CD images along their cue sheets and joining them back.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Split(SplitCommand),
    Join(JoinCommand),
}
