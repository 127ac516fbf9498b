//! Pre-filtering of decompiled `.proto` files.
//!
//! Decompilers dump every assembly; only files mentioning one of the
//! namespaces of interest are copied to the working directory, stripped of
//! comments and blank lines and normalized to a single proto3 header.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{RuntimeError, RuntimeResult};

const SYNTAX_HEADER: &str = "syntax = \"proto3\";\n\n";

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// A file is kept if any of its lines contains one of these.
    pub namespace_markers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub scanned: usize,
    pub copied: usize,
    /// Files that could not be read or written.
    pub skipped: usize,
}

/// Copy matching `.proto` files from `source_dir` into `output_dir`,
/// flattened by file name.
pub fn filter_proto_files(config: &FilterConfig) -> RuntimeResult<FilterSummary> {
    let source = &config.source_dir;
    if !source.is_dir() {
        return Err(RuntimeError::MissingSourceDir(source.clone()));
    }
    let mut entries = fs::read_dir(source).map_err(|e| RuntimeError::io(source, e))?;
    if entries.next().is_none() {
        return Err(RuntimeError::EmptySourceDir(source.clone()));
    }
    fs::create_dir_all(&config.output_dir).map_err(|e| RuntimeError::io(&config.output_dir, e))?;

    let mut summary = FilterSummary::default();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "error accessing path");
                summary.skipped += 1;
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "proto") {
            continue;
        }
        summary.scanned += 1;

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "error reading file");
                summary.skipped += 1;
                continue;
            }
        };
        if !mentions_any(&text, &config.namespace_markers) {
            continue;
        }

        let destination = config.output_dir.join(entry.file_name());
        match write_filtered(&text, &destination) {
            Ok(()) => {
                debug!(file = %path.display(), "copied");
                summary.copied += 1;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "error copying file");
                summary.skipped += 1;
            }
        }
    }

    info!(
        source = %source.display(),
        output = %config.output_dir.display(),
        scanned = summary.scanned,
        copied = summary.copied,
        skipped = summary.skipped,
        "filtered proto files"
    );
    Ok(summary)
}

fn mentions_any(text: &str, markers: &[String]) -> bool {
    text.lines()
        .any(|line| markers.iter().any(|m| line.contains(m.as_str())))
}

/// Drop blank and `//` lines, replace any `syntax` line with the proto3
/// header and make sure the header precedes the first content line.
pub fn strip_proto_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + SYNTAX_HEADER.len());
    let mut header_written = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if !header_written {
            out.push_str(SYNTAX_HEADER);
            header_written = true;
        }
        if trimmed.starts_with("syntax") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

fn write_filtered(text: &str, destination: &Path) -> std::io::Result<()> {
    fs::write(destination, strip_proto_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_proto_text() {
        let input = "// header comment\n\nsyntax = \"proto2\";\npackage a;\n  // inner\nmessage M {\n  int32 x = 1;\n}\n";
        assert_eq!(
            strip_proto_text(input),
            "syntax = \"proto3\";\n\npackage a;\nmessage M {\n  int32 x = 1;\n}\n"
        );
    }

    #[test]
    fn test_header_added_when_missing() {
        assert_eq!(strip_proto_text("message M {}\n"), "syntax = \"proto3\";\n\nmessage M {}\n");
    }

    #[test]
    fn test_empty_file_stays_empty() {
        assert_eq!(strip_proto_text("\n// only a comment\n"), "");
    }

    #[test]
    fn test_mentions_any() {
        let markers = vec!["Ankama.Dofus.Protocol.Game".to_string()];
        assert!(mentions_any("option csharp_namespace = \"Ankama.Dofus.Protocol.Game\";", &markers));
        assert!(!mentions_any("package other;", &markers));
        assert!(!mentions_any("anything", &[]));
    }
}
