//! Deobfs engine: stage 2, strict structure matching.
//!
//! Fixed-point peeling over index sets. Each pass walks the pending
//! obfuscated messages; a message with exactly one perfect (100%) candidate
//! among the open reference messages is matched and both sides leave their
//! pools at once. Zero or several perfect candidates defer the message to the
//! next pass. The loop stops after a pass that matches nothing; leftovers are
//! reported, never forced.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::compare::{compare_message_structures, is_perfect_structure_match};
use crate::domain::{Descriptor, MessageMatch};
use crate::progress::MatchProgress;

/// Outcome of one peeling run.
#[derive(Debug, Clone, Default)]
pub struct PeelResult {
    /// Matches in discovery order.
    pub matches: Vec<MessageMatch>,
    /// Passes executed, the final unproductive one included.
    pub passes: usize,
    /// Indices into `obfuscated.messages` left unresolved.
    pub unmatched_obfuscated: Vec<usize>,
    /// Indices into `reference.messages` left unresolved.
    pub unmatched_reference: Vec<usize>,
}

/// Resolve top-level messages not named in `already_matched`.
pub fn find_strict_structure_matches(
    obfuscated: &Descriptor,
    reference: &Descriptor,
    already_matched: &[MessageMatch],
    progress: &MatchProgress,
) -> Vec<MessageMatch> {
    peel_unique_matches(obfuscated, reference, already_matched, progress).matches
}

/// Same as [`find_strict_structure_matches`], keeping pass count and
/// leftovers.
pub fn peel_unique_matches(
    obfuscated: &Descriptor,
    reference: &Descriptor,
    already_matched: &[MessageMatch],
    progress: &MatchProgress,
) -> PeelResult {
    let taken_obfuscated: HashSet<&str> =
        already_matched.iter().map(|m| m.obfuscated_msg.as_str()).collect();
    let taken_reference: HashSet<&str> =
        already_matched.iter().map(|m| m.original_msg.as_str()).collect();

    let mut pending: Vec<usize> = (0..obfuscated.messages.len())
        .filter(|&i| !taken_obfuscated.contains(obfuscated.messages[i].name.as_str()))
        .collect();
    let mut open: BTreeSet<usize> = (0..reference.messages.len())
        .filter(|&i| !taken_reference.contains(reference.messages[i].name.as_str()))
        .collect();

    let starting_unmatched = pending.len();
    let mut matches = Vec::new();
    let mut passes = 0usize;

    loop {
        passes += 1;
        let matched_before = matches.len();
        let mut deferred = Vec::with_capacity(pending.len());

        for &oi in &pending {
            let obs_msg = &obfuscated.messages[oi];
            let candidates: Vec<usize> = open
                .iter()
                .copied()
                .filter(|&ri| is_perfect_structure_match(obs_msg, &reference.messages[ri]))
                .collect();

            if candidates.len() != 1 {
                deferred.push(oi);
                continue;
            }

            let ri = candidates[0];
            open.remove(&ri);
            let original = &reference.messages[ri];
            let (_, confidence) = compare_message_structures(obs_msg, original);

            debug!(
                obfuscated = %obs_msg.name,
                original = %original.name,
                confidence,
                pass = passes,
                "structure-based match"
            );
            matches.push(MessageMatch::between(obs_msg, original, confidence));
        }

        pending = deferred;
        if matches.len() == matched_before {
            break;
        }
    }

    progress.add_matches(matches.len());

    info!(
        initial_unmatched_obfuscated = starting_unmatched,
        strict_matches_found = matches.len(),
        passes_needed = passes,
        matching_progress = %format!("{:.1}%", progress.progress()),
        "strict structure matching summary"
    );

    PeelResult {
        matches,
        passes,
        unmatched_obfuscated: pending,
        unmatched_reference: open.into_iter().collect(),
    }
}
