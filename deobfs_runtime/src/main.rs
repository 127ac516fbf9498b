use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use deobfs_runtime::config::{load_config, Config};
use deobfs_runtime::drift::verify_determinism;
use deobfs_runtime::filter::filter_proto_files;
use deobfs_runtime::logging::{init_logging, LOG_LEVELS};
use deobfs_runtime::pipeline;

/// Recover original protobuf message names from an obfuscated schema.
#[derive(Parser, Debug)]
#[command(name = "deobfs", version, about)]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log: String,

    /// YAML config file (default: ./deobfs.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Load the source directory directly, without filtering
    #[arg(long, global = true)]
    skip_filter: bool,

    /// Also write matches.json
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Filter, match and write reports
    Run,
    /// Only filter decompiled files into the filtered directory
    Filter,
    /// Match and report without filtering
    Match,
    /// Match twice and compare digests
    CheckDeterminism,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if !init_logging(&cli.log) {
        eprintln!("deobfs: a log subscriber is already installed");
    }

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    if !LOG_LEVELS.contains(&cli.log.as_str()) {
        info!(requested = %cli.log, "unknown log level, using info");
    }

    let mut config: Config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if cli.skip_filter {
        config.skip_filter = true;
    }
    if cli.json {
        config.json_report = true;
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let result = pipeline::run(&config).context("matching run failed")?;
            print_summary(&result);
        }
        Command::Match => {
            let result = pipeline::match_and_report(&config).context("matching run failed")?;
            print_summary(&result);
        }
        Command::Filter => {
            let summary = filter_proto_files(&config.filter_config()).context("filtering failed")?;
            println!(
                "Copied {} of {} proto files into {}",
                summary.copied,
                summary.scanned,
                config.filtered_dir.display()
            );
        }
        Command::CheckDeterminism => {
            let (obfuscated, reference) =
                pipeline::load_schemas(&config).context("loading schemas")?;
            let hash = verify_determinism(&obfuscated, &reference)?;
            println!("Deterministic: {}", hash);
        }
    }

    Ok(())
}

fn print_summary(result: &pipeline::RunOutcome) {
    let outcome = &result.outcome;
    println!(
        "Enum matches: {}, structure matches: {}, unmatched: {} ({:.1}% matched)",
        outcome.enum_matches.len(),
        outcome.structure_matches.len(),
        outcome.unmatched_obfuscated.len(),
        outcome.progress_percent
    );
    println!("Digest: {}", result.digest);
    for path in &result.reports {
        println!("  {}", path.display());
    }
}
