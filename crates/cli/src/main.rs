//! `switchyard` command-line shell
//!
//! Exposes the planner's `core show translation` command over a registry
//! populated with the simulation transcoder set, so the cost matrix and
//! path listings can be inspected without a running host.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::process::ExitCode;
use switchyard_translate::cli::{show_translation, CliStatus, USAGE};
use switchyard_translate::sim;
use tracing::debug;

#[derive(Parser)]
#[command(name = "switchyard", version, about = "Switchyard telephony toolkit CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Core planner commands
    Core {
        #[command(subcommand)]
        command: CoreCommand,
    },
}

#[derive(Subcommand)]
enum CoreCommand {
    /// Display planner state
    Show {
        #[command(subcommand)]
        command: ShowCommand,
    },
}

#[derive(Subcommand)]
enum ShowCommand {
    /// Display the translation matrix and per-codec paths
    Translation {
        /// `recalc [seconds]` or `paths <codec>`
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = switchyard_translate::global();
    let ids = sim::register_standard_set(registry)?;
    debug!(translators = ids.len(), "registered simulation transcoders");

    let Command::Core { command } = cli.command;
    let CoreCommand::Show { command } = command;
    let ShowCommand::Translation { args } = command;

    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let status = show_translation(registry, &words, &mut out)?;

    Ok(match status {
        CliStatus::Success => ExitCode::SUCCESS,
        CliStatus::Failure => ExitCode::FAILURE,
        CliStatus::ShowUsage => {
            let mut err = std::io::stderr().lock();
            write!(err, "{}", USAGE)?;
            ExitCode::from(2)
        }
    })
}
