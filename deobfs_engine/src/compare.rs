//! Deobfs engine: comparison rules.
//!
//! Pure functions. Degenerate inputs score `(false, 0)`, they never fail.
//! Names of fields and messages are never consulted; only enum value names
//! take part, since obfuscators leave those intact.

use std::collections::HashMap;

use crate::domain::{EnumType, Field, MessageType};
use crate::scoring::{count_similarity, ratio, ScoreCard, MATCH_THRESHOLD, PERFECT_CONFIDENCE};

/// The only field types that carry structural signal.
pub const PRIMITIVE_TYPES: [&str; 4] = ["int32", "int64", "string", "bool"];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Compare two enums by their `name -> number` pairs.
///
/// A match requires every value of the smaller enum to appear with the same
/// number in the larger one. The decision is symmetric; the score divides by
/// the larger size, so a strict superset matches below 100.
pub fn compare_enums(a: &EnumType, b: &EnumType) -> (bool, f64) {
    let a_map: HashMap<&str, i32> = a.values.iter().map(|v| (v.name.as_str(), v.number)).collect();
    let b_map: HashMap<&str, i32> = b.values.iter().map(|v| (v.name.as_str(), v.number)).collect();

    let matching = a_map
        .iter()
        .filter(|(name, number)| b_map.get(*name) == Some(*number))
        .count();

    let smaller = a_map.len().min(b_map.len());
    if matching != smaller {
        return (false, 0.0);
    }

    let larger = a_map.len().max(b_map.len());
    (true, ratio(matching, larger) * PERFECT_CONFIDENCE)
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

pub fn is_primitive(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

/// Same label and same primitive type. Message and enum typed fields never
/// compare equal, not even to themselves.
pub fn compare_fields(a: &Field, b: &Field) -> bool {
    a.label == b.label && is_primitive(&a.type_name) && a.type_name == b.type_name
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Structural similarity of two messages as `(confidence >= 80, confidence)`.
///
/// Checks, each scored in [0, 1] and averaged:
///   1. field count similarity
///   2. positional field agreement over the shared prefix
///   3. oneof count similarity, plus one score per aligned oneof slot
///      (only when either side declares a oneof)
///   4. nested type count similarity (only when either side nests types)
pub fn compare_message_structures(a: &MessageType, b: &MessageType) -> (bool, f64) {
    if a.fields.is_empty() || b.fields.is_empty() {
        return (false, 0.0);
    }

    let mut card = ScoreCard::new();

    card.record(count_similarity(a.fields.len(), b.fields.len()));

    let shared = a.fields.len().min(b.fields.len());
    let positional = a
        .fields
        .iter()
        .zip(&b.fields)
        .filter(|(fa, fb)| compare_fields(fa, fb))
        .count();
    card.record(ratio(positional, shared));

    if !a.oneof_decls.is_empty() || !b.oneof_decls.is_empty() {
        card.record(count_similarity(a.oneof_decls.len(), b.oneof_decls.len()));

        for slot in 0..a.oneof_decls.len().min(b.oneof_decls.len()) {
            card.record(compare_oneof_fields(&a.oneof_fields(slot), &b.oneof_fields(slot)));
        }
    }

    if !a.nested_types.is_empty() || !b.nested_types.is_empty() {
        card.record(count_similarity(a.nested_types.len(), b.nested_types.len()));
    }

    let confidence = card.confidence();
    (confidence >= MATCH_THRESHOLD, confidence)
}

/// Exactly 100% structural confidence.
pub fn is_perfect_structure_match(a: &MessageType, b: &MessageType) -> bool {
    let (is_match, confidence) = compare_message_structures(a, b);
    is_match && confidence == PERFECT_CONFIDENCE
}

/// Share of `a`'s fields that find an equal field anywhere in `b`, over the
/// larger slot. Empty slots score 0.
fn compare_oneof_fields(a: &[&Field], b: &[&Field]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matching = a
        .iter()
        .filter(|fa| b.iter().any(|fb| compare_fields(fa, fb)))
        .count();
    ratio(matching, a.len().max(b.len()))
}
