mod analysis;
mod config;
mod driver;
mod engine;
mod manager;
mod model;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Estimate the distribution of the proportion of a population never
/// hearing a rumour (Maki and Thompson, 1973).
#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Simulation directory containing `config.toml`.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a new run and perform a batch of trials.
    Create,

    /// Perform another batch of trials on an existing run.
    Resume {
        #[arg(long)]
        run_idx: usize,
    },

    /// Summarize the outcomes of every run.
    Analyze,

    /// Write the current density of a run as a plain text table.
    Export {
        #[arg(long)]
        run_idx: usize,
    },

    /// Remove every run.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create => mgr.create_run()?,
        Command::Resume { run_idx } => mgr.resume_run(run_idx)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Export { run_idx } => mgr.export_run(run_idx)?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
