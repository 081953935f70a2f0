use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Settings file (created with defaults when missing)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Log every layer and file step
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Original .map files -> editable .json documents
    MapToJson {
        /// Overwrite existing .json files
        #[arg(long)]
        force: bool,
        /// Map names without extension (default: every .map file)
        names: Vec<String>,
    },
    /// Editable .json documents -> final .map files
    JsonToMap {
        /// Map names without extension (default: every .json file)
        names: Vec<String>,
    },
}
