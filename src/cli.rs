use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::commands::check::{self, CheckOptions};
use crate::commands::convert::{self, ConvertOptions};
use crate::commands::import::{self, ImportOptions};
use crate::commands::repair::{self, RepairOptions};
use crate::commands::{CommandReport, status};
use crate::ledger::config::{ParseMode, load_config};
use crate::ledger::import::ImportPlan;
use crate::ledger::paths::resolve_paths;

#[derive(Debug, Parser)]
#[command(name = "trackledger")]
#[command(about = "Maintain the track ledger and derive the JSON catalog from it")]
#[command(version)]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Ledger file (defaults to r2_downloads_list.txt under TRACKLEDGER_HOME)
    #[arg(long, global = true, value_name = "PATH")]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Append new tracks from the scraped JSON source as one category block
    Import(ImportArgs),
    /// Regenerate the JSON catalog from the ledger
    Convert(ConvertArgs),
    /// Split `artist - title` titles filed under genre-label artists
    Repair(RepairArgs),
    /// Compare header and category counts with the parsed records
    Check(CheckArgs),
    /// Show resolved paths and configuration
    Status,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Import source (JSON array of title/artist/previewLink/downloadLink)
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,
    /// Category name for the appended block
    #[arg(long)]
    category: Option<String>,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Catalog output (defaults to public/r2_tracks.json)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Read records by line position without validating field prefixes
    #[arg(long)]
    positional: bool,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct RepairArgs {
    /// Artist value to treat as a misfiled genre label (repeatable)
    #[arg(long = "bad-artist", value_name = "NAME")]
    bad_artists: Vec<String>,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long)]
    positional: bool,
}

fn parse_mode_flag(positional: bool) -> Option<ParseMode> {
    positional.then_some(ParseMode::Positional)
}

fn prompt_confirm(plan: &ImportPlan) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(
        stderr,
        "Proceed with adding {} tracks to `{}`? (y/n): ",
        plan.fresh.len(),
        plan.category
    )?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

/// Runs the selected command; `Ok(false)` means the report carries issues.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();

    let mut paths = resolve_paths()?;
    if let Some(ledger) = cli.ledger {
        paths.ledger_file = ledger;
    }
    let config = load_config(&paths.home)?;
    tracing::debug!(?paths, "resolved paths");

    let report = match cli.command {
        Command::Import(args) => import::run(
            &paths,
            &config,
            &ImportOptions {
                source: args.source,
                category: args.category,
                assume_yes: args.yes,
                dry_run: args.dry_run,
            },
            prompt_confirm,
        )?,
        Command::Convert(args) => convert::run(
            &paths,
            &config,
            &ConvertOptions {
                output: args.output,
                parse_mode: parse_mode_flag(args.positional),
                dry_run: args.dry_run,
            },
        )?,
        Command::Repair(args) => repair::run(
            &paths,
            &config,
            &RepairOptions {
                bad_artists: args.bad_artists,
                dry_run: args.dry_run,
            },
        )?,
        Command::Check(args) => check::run(
            &paths,
            &config,
            &CheckOptions {
                parse_mode: parse_mode_flag(args.positional),
            },
        )?,
        Command::Status => status::run(&paths, &config)?,
    };

    print_report(&report, cli.json)?;
    Ok(report.ok)
}
