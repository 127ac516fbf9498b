//! Run orchestrator: filter, load, match, report.
//!
//! All matching logic lives in the engine; this module only wires the
//! runtime collaborators around one `MatchEngine::run` call.

use std::path::PathBuf;

use tracing::{error, info};

use deobfs_engine::domain::{Descriptor, MessageMatch};
use deobfs_engine::engine::{MatchEngine, MatchOutcome};
use deobfs_engine::hashing::canonical_hash;

use crate::config::Config;
use crate::error::RuntimeResult;
use crate::filter::{filter_proto_files, FilterSummary};
use crate::loader::load_descriptor;
use crate::report::{render_json_report, render_match_report, render_unmatched_report, write_report};

pub const ENUM_REPORT: &str = "enum_matches.txt";
pub const STRUCTURE_REPORT: &str = "structure_matches.txt";
pub const UNMATCHED_REPORT: &str = "unmatched.txt";
pub const JSON_REPORT: &str = "matches.json";

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub outcome: MatchOutcome,
    /// Canonical hash over every match of the run.
    pub digest: String,
    /// `None` when filtering was skipped or failed.
    pub filter: Option<FilterSummary>,
    pub reports: Vec<PathBuf>,
}

/// Full run. A failing filter step is logged and the run goes on with
/// whatever the filtered directory already holds.
pub fn run(config: &Config) -> RuntimeResult<RunOutcome> {
    let filter = if config.skip_filter {
        None
    } else {
        match filter_proto_files(&config.filter_config()) {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!(error = %e, "error filtering proto files");
                None
            }
        }
    };

    let mut result = match_and_report(config)?;
    result.filter = filter;
    Ok(result)
}

/// Load both schemas as configured.
pub fn load_schemas(config: &Config) -> RuntimeResult<(Descriptor, Descriptor)> {
    info!("loading and parsing proto files");
    let obfuscated = load_descriptor(config.obfuscated_dir(), &config.file_filter)?;
    let reference = load_descriptor(&config.reference_dir, &config.file_filter)?;
    Ok((obfuscated, reference))
}

/// Load, match and write reports, without the filter step.
pub fn match_and_report(config: &Config) -> RuntimeResult<RunOutcome> {
    let (obfuscated, reference) = load_schemas(config)?;

    let engine = MatchEngine::new();
    let outcome = engine.run(&obfuscated, &reference);
    let all: Vec<MessageMatch> = outcome.all_matches().cloned().collect();
    let digest = canonical_hash(&all);

    let mut reports = Vec::new();
    let mut emit = |name: &str, text: String| -> RuntimeResult<()> {
        let path = config.report_dir.join(name);
        write_report(&path, &text)?;
        reports.push(path);
        Ok(())
    };

    emit(
        ENUM_REPORT,
        render_match_report("Enum-Based Message Matches Report", &outcome.enum_matches),
    )?;
    emit(
        STRUCTURE_REPORT,
        render_match_report("Structure-Based Message Matches Report", &outcome.structure_matches),
    )?;
    emit(UNMATCHED_REPORT, render_unmatched_report(&outcome))?;
    if config.json_report {
        emit(JSON_REPORT, render_json_report(&outcome)?)?;
    }

    info!(
        matches = all.len(),
        digest = %digest,
        report_dir = %config.report_dir.display(),
        "run complete"
    );

    Ok(RunOutcome {
        outcome,
        digest,
        filter: None,
        reports,
    })
}
