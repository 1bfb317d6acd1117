use clap::{Args, Parser, Subcommand};
use harness_core::DailyContextVersion;
use harness_core::config::constants::defaults;
use std::path::PathBuf;

/// Main CLI structure for fc-harness
#[derive(Parser, Debug)]
#[command(
    name = "fc-harness",
    version,
    about = "Evaluate LLM function calling over scripted multi-turn scenarios"
)]
pub struct Cli {
    /// Path to a harness.toml; defaults to the usual lookup locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every scenario in a dataset and write result records
    Run(RunArgs),
    /// Write a default configuration file
    Init {
        /// Where to write the file
        #[arg(long, default_value = defaults::CONFIG_FILE_NAME)]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the DailyContext tool declarations as JSON
    Tools {
        /// DailyContext function set (v1 or v2)
        #[arg(long, default_value = "v1")]
        daily_context: DailyContextVersion,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// JSON-lines dataset of test entries
    pub dataset: PathBuf,

    /// Model name (e.g. gemini-2.5-pro-FC); overrides the config file
    #[arg(long)]
    pub model: Option<String>,

    /// Directory that receives the result file
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Episodes evaluated concurrently; overrides the config file
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Queries allowed per user round; overrides the config file
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Only run the first N entries
    #[arg(long)]
    pub limit: Option<usize>,

    /// Hand `future_id`s to the model instead of resolving lookups in the driver
    #[arg(long)]
    pub future_ids: bool,

    /// DailyContext function set (v1 or v2)
    #[arg(long, default_value = "v1")]
    pub daily_context: DailyContextVersion,
}
