//! Deobfs engine: stage 1, enum fingerprint matching.
//!
//! Obfuscators rename messages and fields but leave enum value names and
//! numbers alone, so the set of enums a message carries is a strong
//! fingerprint.
//!
//! Policy: reference candidates are scanned in declaration order and the
//! first one that satisfies every obfuscated enum wins. No global
//! assignment; if two reference messages share an enum shape, order decides.

use tracing::{debug, info};

use crate::compare::compare_enums;
use crate::domain::{Descriptor, EnumMatch, EnumType, MessageMatch, MessageType};
use crate::progress::MatchProgress;
use crate::scoring::average_confidence;
use crate::walk::{collect_enums, format_enum_paths, format_enum_values};

type EnumIndex<'a> = Vec<(String, &'a EnumType)>;

/// Match top-level messages of `obfuscated` against `reference` by the enums
/// they (transitively) declare.
pub fn find_enum_based_matches(
    obfuscated: &Descriptor,
    reference: &Descriptor,
    progress: &MatchProgress,
) -> Vec<MessageMatch> {
    let candidates: Vec<(&MessageType, EnumIndex)> = reference
        .messages
        .iter()
        .map(|m| (m, collect_enums(m)))
        .collect();

    let mut matches = Vec::new();
    let mut with_enums = 0usize;
    let mut unmatched: Vec<(&MessageType, EnumIndex)> = Vec::new();

    for obs_msg in &obfuscated.messages {
        let obs_enums = collect_enums(obs_msg);
        if obs_enums.is_empty() {
            continue;
        }
        with_enums += 1;

        let found = candidates.iter().find_map(|(candidate, cand_enums)| {
            match_all_enums(&obs_enums, cand_enums).map(|enum_matches| (*candidate, enum_matches))
        });

        match found {
            Some((candidate, enum_matches)) => {
                let confidence = average_confidence(enum_matches.iter().map(|m| m.confidence));
                debug!(
                    obfuscated = %obs_msg.name,
                    original = %candidate.name,
                    confidence,
                    "found top-level message match"
                );
                for em in &enum_matches {
                    debug!(
                        obfuscated_enum = %em.obfuscated_enum,
                        original_enum = %em.original_enum,
                        values = %em.values.join(", "),
                        "matching enum"
                    );
                }
                let mut message_match = MessageMatch::between(obs_msg, candidate, confidence);
                message_match.enum_matches = enum_matches;
                matches.push(message_match);
            }
            None => unmatched.push((obs_msg, obs_enums)),
        }
    }

    progress.add_matches(matches.len());

    info!(
        obfuscated_with_enums = with_enums,
        enum_matches_found = matches.len(),
        matching_progress = %format!("{:.1}%", progress.progress()),
        "enum matching summary"
    );

    for (msg, enums) in &unmatched {
        debug!(name = %msg.name, enums = %format_enum_paths(enums), "unmatched message");
    }

    matches
}

/// Pair every obfuscated enum with its best candidate enum, or `None` as
/// soon as one obfuscated enum finds nothing.
///
/// Best means highest confidence, first seen on ties. A zero-confidence
/// match (an empty enum) carries no fingerprint and is not accepted.
fn match_all_enums(obs_enums: &EnumIndex, cand_enums: &EnumIndex) -> Option<Vec<EnumMatch>> {
    let mut enum_matches = Vec::with_capacity(obs_enums.len());

    for (obs_path, obs_enum) in obs_enums {
        let mut best: Option<(&str, f64)> = None;
        let mut best_confidence = 0.0;

        for (cand_path, cand_enum) in cand_enums {
            let (is_match, confidence) = compare_enums(obs_enum, cand_enum);
            if is_match && confidence > best_confidence {
                best = Some((cand_path.as_str(), confidence));
                best_confidence = confidence;
            }
        }

        let (original_enum, confidence) = best?;
        enum_matches.push(EnumMatch {
            obfuscated_enum: obs_path.clone(),
            original_enum: original_enum.to_string(),
            values: format_enum_values(&obs_enum.values),
            confidence,
        });
    }

    if enum_matches.is_empty() {
        return None;
    }
    Some(enum_matches)
}
