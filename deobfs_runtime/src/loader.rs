//! Schema loading: turns a directory of `.proto`, descriptor JSON or binary
//! descriptor-set files into one merged, validated `Descriptor`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use prost::Message;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use deobfs_engine::domain::Descriptor;
use deobfs_engine::invariants::{find_duplicate_field_numbers, try_validate_descriptor};
use deobfs_engine::walk::count_messages;

use crate::error::{RuntimeError, RuntimeResult};
use crate::parser::parse_proto;
use crate::proto_bridge::set_to_domain;
use crate::proto_types::FileDescriptorSet;

/// Input formats the loader understands, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    ProtoText,
    DescriptorJson,
    DescriptorSet,
}

impl SchemaFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "proto" => Some(SchemaFormat::ProtoText),
            "json" => Some(SchemaFormat::DescriptorJson),
            "pb" | "desc" => Some(SchemaFormat::DescriptorSet),
            _ => None,
        }
    }
}

/// Load every schema file under `dir`, in file-name order.
///
/// A non-empty `file_filter` restricts loading to those file names.
/// Top-level messages are stamped with their path relative to `dir`.
pub fn load_descriptor(dir: &Path, file_filter: &[String]) -> RuntimeResult<Descriptor> {
    if !dir.is_dir() {
        return Err(RuntimeError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "schema directory not found"),
        ));
    }

    let allowed: BTreeSet<&str> = file_filter.iter().map(String::as_str).collect();
    let mut merged = Descriptor::default();
    let mut files = 0usize;

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            RuntimeError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(format) = SchemaFormat::from_path(path) else {
            continue;
        };
        let file_name = entry.file_name().to_string_lossy();
        if !allowed.is_empty() && !allowed.contains(&*file_name) {
            debug!(file = %file_name, "skipped by file filter");
            continue;
        }

        let rel = path
            .strip_prefix(dir)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| file_name.to_string());

        for (source, descriptor) in load_file(path, &rel, format)? {
            debug!(
                file = %source,
                messages = descriptor.messages.len(),
                "loaded schema file"
            );
            merged.merge(descriptor);
        }
        files += 1;
    }

    try_validate_descriptor(&merged).map_err(|source| RuntimeError::InvalidDescriptor {
        dir: dir.to_path_buf(),
        source,
    })?;
    for dup in find_duplicate_field_numbers(&merged) {
        warn!(
            message = %dup.message,
            number = dup.number,
            first = %dup.first,
            second = %dup.second,
            "field number reused within message"
        );
    }

    info!(
        dir = %dir.display(),
        files,
        top_level_messages = merged.messages.len(),
        total_messages = count_messages(&merged.messages),
        "schema loaded"
    );
    Ok(merged)
}

/// Parse one file. Descriptor sets may hold several files; each comes back
/// stamped with its own name.
fn load_file(path: &Path, rel: &str, format: SchemaFormat) -> RuntimeResult<Vec<(String, Descriptor)>> {
    match format {
        SchemaFormat::ProtoText => {
            let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
            let mut descriptor = parse_proto(&text).map_err(|source| RuntimeError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            descriptor.stamp_source_file(rel);
            Ok(vec![(rel.to_string(), descriptor)])
        }
        SchemaFormat::DescriptorJson => {
            let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
            let mut descriptor: Descriptor =
                serde_json::from_str(&text).map_err(|source| RuntimeError::DescriptorJson {
                    path: path.to_path_buf(),
                    source,
                })?;
            descriptor.source_files.clear();
            descriptor.stamp_source_file(rel);
            Ok(vec![(rel.to_string(), descriptor)])
        }
        SchemaFormat::DescriptorSet => {
            let bytes = fs::read(path).map_err(|e| RuntimeError::io(path, e))?;
            let set = FileDescriptorSet::decode(bytes.as_slice()).map_err(|source| {
                RuntimeError::Decode {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Ok(set_to_domain(&set)
                .into_iter()
                .map(|(name, mut descriptor)| {
                    let source = if name.is_empty() { rel.to_string() } else { name };
                    descriptor.stamp_source_file(&source);
                    (source, descriptor)
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("a/b.proto")), Some(SchemaFormat::ProtoText));
        assert_eq!(SchemaFormat::from_path(Path::new("b.JSON")), Some(SchemaFormat::DescriptorJson));
        assert_eq!(SchemaFormat::from_path(Path::new("set.desc")), Some(SchemaFormat::DescriptorSet));
        assert_eq!(SchemaFormat::from_path(Path::new("set.pb")), Some(SchemaFormat::DescriptorSet));
        assert_eq!(SchemaFormat::from_path(Path::new("README")), None);
        assert_eq!(SchemaFormat::from_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let err = load_descriptor(Path::new("/definitely/not/here"), &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::Io { .. }));
    }
}
