//! Plain-text and JSON match reports.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use deobfs_engine::domain::MessageMatch;
use deobfs_engine::engine::MatchOutcome;
use deobfs_engine::hashing::canonical_hash;

use crate::error::{RuntimeError, RuntimeResult};

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn underline(out: &mut String, text: &str, ch: char) {
    out.push_str(text);
    out.push('\n');
    out.extend(std::iter::repeat(ch).take(text.chars().count()));
    out.push('\n');
}

/// Matches grouped by original file, each group sorted by obfuscated name.
pub fn render_match_report(title: &str, matches: &[MessageMatch]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&MessageMatch>> = BTreeMap::new();
    for m in matches {
        by_file.entry(m.original_file.as_str()).or_default().push(m);
    }

    let mut out = String::new();
    underline(&mut out, title, '=');

    for (file, group) in by_file.iter_mut() {
        group.sort_by(|a, b| a.obfuscated_msg.cmp(&b.obfuscated_msg));

        out.push('\n');
        underline(&mut out, &format!("File: {}", file), '-');
        for m in group.iter() {
            out.push_str(&format!(
                "{} ({}) -> {} (confidence: {:.0}%)\n",
                m.obfuscated_msg,
                basename(&m.obfuscated_file),
                m.original_msg,
                m.confidence
            ));
            for em in &m.enum_matches {
                out.push_str(&format!(
                    "    {} -> {} ({:.0}%) [{}]\n",
                    em.obfuscated_enum,
                    em.original_enum,
                    em.confidence,
                    em.values.join(", ")
                ));
            }
        }
    }

    out.push_str(&format!(
        "\nTotal matches: {} across {} files\n",
        matches.len(),
        by_file.len()
    ));
    out.push_str(&format!("Digest: {}\n", canonical_hash(matches)));
    out
}

/// Messages neither stage resolved, sorted by name.
pub fn render_unmatched_report(outcome: &MatchOutcome) -> String {
    let mut out = String::new();
    underline(&mut out, "Unmatched Messages Report", '=');

    for (heading, names) in [
        ("Obfuscated", &outcome.unmatched_obfuscated),
        ("Reference", &outcome.unmatched_reference),
    ] {
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();
        out.push('\n');
        underline(&mut out, &format!("{} ({})", heading, sorted.len()), '-');
        for name in sorted {
            out.push_str(name);
            out.push('\n');
        }
    }

    out.push_str(&format!("\nMatching progress: {:.1}%\n", outcome.progress_percent));
    out
}

/// Pretty JSON of the whole outcome.
pub fn render_json_report(outcome: &MatchOutcome) -> RuntimeResult<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Write `text` to `path`, creating parent directories.
pub fn write_report(path: &Path, text: &str) -> RuntimeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RuntimeError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| RuntimeError::io(path, e))?;
    info!(path = %path.display(), bytes = text.len(), "report written");
    Ok(())
}
