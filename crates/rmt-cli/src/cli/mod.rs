//! CLI for RMT resumable multipart transfers.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rmt_core::config;
use rmt_core::TransferKind;
use std::path::PathBuf;

use commands::{parse_size, run_abort, run_status, run_transfer};

/// Top-level CLI for RMT.
#[derive(Debug, Parser)]
#[command(name = "rmt")]
#[command(about = "RMT: resumable multipart object transfers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by `upload` and `download`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TransferArgs {
    /// Bytes per part (suffixes K, M, G, KiB, MiB, GiB). Defaults to the config value.
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub part_size: Option<u64>,
    /// Checkpoint file. Defaults to `<file>.cpt` (or under `checkpoint_dir` from config).
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,
    /// Parts transferred concurrently. Defaults to the config value.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,
    /// Root directory of the object store. Defaults to `store_root` from config.
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload a file as `bucket/object`, resuming from its checkpoint if one exists.
    Upload {
        /// Local file to upload.
        file: PathBuf,
        /// Destination as `bucket/object`.
        target: String,
        #[command(flatten)]
        args: TransferArgs,
    },

    /// Download `bucket/object` into a file, resuming from its checkpoint if one exists.
    Download {
        /// Source as `bucket/object`.
        target: String,
        /// Local destination file.
        file: PathBuf,
        #[command(flatten)]
        args: TransferArgs,
    },

    /// Show what a checkpoint records.
    Status {
        /// Checkpoint file.
        checkpoint: PathBuf,
    },

    /// Abort the transfer a checkpoint belongs to and delete the checkpoint.
    Abort {
        /// Checkpoint file.
        checkpoint: PathBuf,
        /// Root directory of the object store. Defaults to `store_root` from config.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload { file, target, args } => {
                run_transfer(&cfg, TransferKind::Upload, &file, &target, &args).await?
            }
            CliCommand::Download { target, file, args } => {
                run_transfer(&cfg, TransferKind::Download, &file, &target, &args).await?
            }
            CliCommand::Status { checkpoint } => run_status(&checkpoint)?,
            CliCommand::Abort { checkpoint, store } => run_abort(&cfg, &checkpoint, store.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
