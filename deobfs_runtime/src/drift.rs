//! Drift detection: determinism verification and outcome comparison.

use std::collections::BTreeMap;

use thiserror::Error;

use deobfs_engine::domain::{Descriptor, MessageMatch};
use deobfs_engine::engine::{MatchEngine, MatchOutcome};
use deobfs_engine::hashing::canonical_hash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftError {
    #[error("two runs over the same input produced different matches: {first} vs {second}")]
    NonDeterministic { first: String, second: String },
}

fn run_hash(obfuscated: &Descriptor, reference: &Descriptor) -> String {
    let outcome = MatchEngine::new().run(obfuscated, reference);
    let all: Vec<MessageMatch> = outcome.all_matches().cloned().collect();
    canonical_hash(&all)
}

/// Run the engine twice on the same input. Returns the shared hash.
pub fn verify_determinism(obfuscated: &Descriptor, reference: &Descriptor) -> Result<String, DriftError> {
    let first = run_hash(obfuscated, reference);
    let second = run_hash(obfuscated, reference);

    if first != second {
        return Err(DriftError::NonDeterministic { first, second });
    }
    Ok(first)
}

/// One obfuscated message whose original changed between outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub obfuscated_msg: String,
    pub before: String,
    pub after: String,
}

/// Pair-level difference between two outcomes, keyed by obfuscated name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchDrift {
    pub match_count_a: usize,
    pub match_count_b: usize,
    /// `(obfuscated, original)` pairs only in b.
    pub added: Vec<(String, String)>,
    /// `(obfuscated, original)` pairs only in a.
    pub removed: Vec<(String, String)>,
    pub reassigned: Vec<Reassignment>,
}

impl MatchDrift {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.reassigned.is_empty()
    }
}

fn pairs(outcome: &MatchOutcome) -> BTreeMap<&str, &str> {
    outcome
        .all_matches()
        .map(|m| (m.obfuscated_msg.as_str(), m.original_msg.as_str()))
        .collect()
}

pub fn compare_outcomes(a: &MatchOutcome, b: &MatchOutcome) -> MatchDrift {
    let pairs_a = pairs(a);
    let pairs_b = pairs(b);

    let mut drift = MatchDrift {
        match_count_a: a.total_matches(),
        match_count_b: b.total_matches(),
        ..Default::default()
    };

    for (obs, orig_a) in &pairs_a {
        match pairs_b.get(obs) {
            None => drift.removed.push((obs.to_string(), orig_a.to_string())),
            Some(orig_b) if orig_b != orig_a => drift.reassigned.push(Reassignment {
                obfuscated_msg: obs.to_string(),
                before: orig_a.to_string(),
                after: orig_b.to_string(),
            }),
            Some(_) => {}
        }
    }
    for (obs, orig_b) in &pairs_b {
        if !pairs_a.contains_key(obs) {
            drift.added.push((obs.to_string(), orig_b.to_string()));
        }
    }

    drift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(obs: &str, orig: &str) -> MessageMatch {
        MessageMatch {
            obfuscated_msg: obs.into(),
            obfuscated_file: String::new(),
            original_msg: orig.into(),
            original_file: String::new(),
            confidence: 100.0,
            enum_matches: Vec::new(),
        }
    }

    #[test]
    fn test_compare_outcomes() {
        let a = MatchOutcome {
            enum_matches: vec![m("Aa", "One")],
            structure_matches: vec![m("Bb", "Two"), m("Cc", "Three")],
            ..Default::default()
        };
        let b = MatchOutcome {
            enum_matches: vec![m("Aa", "One")],
            structure_matches: vec![m("Bb", "Four"), m("Dd", "Five")],
            ..Default::default()
        };

        let drift = compare_outcomes(&a, &b);
        assert_eq!(drift.match_count_a, 3);
        assert_eq!(drift.match_count_b, 3);
        assert_eq!(drift.added, vec![("Dd".to_string(), "Five".to_string())]);
        assert_eq!(drift.removed, vec![("Cc".to_string(), "Three".to_string())]);
        assert_eq!(
            drift.reassigned,
            vec![Reassignment {
                obfuscated_msg: "Bb".into(),
                before: "Two".into(),
                after: "Four".into(),
            }]
        );
        assert!(!drift.is_empty());
        assert!(compare_outcomes(&a, &a).is_empty());
    }

    #[test]
    fn test_verify_determinism_on_empty_input() {
        let empty = Descriptor::default();
        let hash = verify_determinism(&empty, &empty).unwrap();
        assert_eq!(hash, canonical_hash(&[]));
    }
}
