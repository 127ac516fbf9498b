//! Deobfs engine: canonical hashing of match lists.
//!
//! Deterministic canonical serialization + SHA-256, used as a report digest
//! and for determinism checks.
//!
//! Rules:
//!   - `engine_version` first
//!   - matches sorted by (obfuscated_msg, original_msg, obfuscated_file)
//!   - enum matches kept in stored order
//!   - confidences as fixed two-decimal strings, no floats
//!   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{EnumMatch, MessageMatch};
use crate::ENGINE_VERSION;

/// Canonical serialization of a match list to UTF-8 JSON bytes.
pub fn canonical_serialize(matches: &[MessageMatch]) -> Vec<u8> {
    build_canonical_value(matches).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn canonical_hash(matches: &[MessageMatch]) -> String {
    let digest = Sha256::digest(canonical_serialize(matches));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn fixed(confidence: f64) -> Value {
    Value::String(format!("{:.2}", confidence))
}

fn enum_match_value(em: &EnumMatch) -> Value {
    let mut map = Map::new();
    map.insert("obfuscated_enum".to_string(), Value::String(em.obfuscated_enum.clone()));
    map.insert("original_enum".to_string(), Value::String(em.original_enum.clone()));
    map.insert(
        "values".to_string(),
        Value::Array(em.values.iter().cloned().map(Value::String).collect()),
    );
    map.insert("confidence".to_string(), fixed(em.confidence));
    Value::Object(map)
}

/// Field order: obfuscated_msg, obfuscated_file, original_msg,
/// original_file, confidence, enum_matches.
fn build_canonical_value(matches: &[MessageMatch]) -> Value {
    let mut sorted: Vec<&MessageMatch> = matches.iter().collect();
    sorted.sort_by(|a, b| {
        a.obfuscated_msg
            .cmp(&b.obfuscated_msg)
            .then_with(|| a.original_msg.cmp(&b.original_msg))
            .then_with(|| a.obfuscated_file.cmp(&b.obfuscated_file))
    });

    let mut list = Vec::with_capacity(sorted.len());
    for m in sorted {
        let mut map = Map::new();
        map.insert("obfuscated_msg".to_string(), Value::String(m.obfuscated_msg.clone()));
        map.insert("obfuscated_file".to_string(), Value::String(m.obfuscated_file.clone()));
        map.insert("original_msg".to_string(), Value::String(m.original_msg.clone()));
        map.insert("original_file".to_string(), Value::String(m.original_file.clone()));
        map.insert("confidence".to_string(), fixed(m.confidence));
        map.insert(
            "enum_matches".to_string(),
            Value::Array(m.enum_matches.iter().map(enum_match_value).collect()),
        );
        list.push(Value::Object(map));
    }

    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number(u64::from(ENGINE_VERSION).into()),
    );
    root.insert("matches".to_string(), Value::Array(list));
    Value::Object(root)
}
