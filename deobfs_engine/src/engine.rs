//! Deobfs engine: run orchestration.
//!
//! One `MatchEngine::run` call is one matching run: fresh progress, enum
//! stage, then structure stage seeded with the enum stage's matches.
//! Descriptors are read-only for the whole run.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::domain::{Descriptor, MessageMatch};
use crate::enum_matcher::find_enum_based_matches;
use crate::progress::MatchProgress;
use crate::structure_matcher::peel_unique_matches;

/// Everything one run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchOutcome {
    pub enum_matches: Vec<MessageMatch>,
    pub structure_matches: Vec<MessageMatch>,
    /// Top-level obfuscated messages neither stage resolved, in declaration order.
    pub unmatched_obfuscated: Vec<String>,
    /// Top-level reference messages nobody claimed, in declaration order.
    pub unmatched_reference: Vec<String>,
    pub structure_passes: usize,
    pub progress_percent: f64,
}

impl MatchOutcome {
    /// Enum matches followed by structure matches.
    pub fn all_matches(&self) -> impl Iterator<Item = &MessageMatch> {
        self.enum_matches.iter().chain(self.structure_matches.iter())
    }

    pub fn total_matches(&self) -> usize {
        self.enum_matches.len() + self.structure_matches.len()
    }
}

/// Stateless apart from the per-run progress counters.
#[derive(Debug, Default)]
pub struct MatchEngine {
    progress: MatchProgress,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress of the latest (or current) run.
    pub fn progress(&self) -> &MatchProgress {
        &self.progress
    }

    /// Run both stages over the top-level messages of the two descriptors.
    pub fn run(&self, obfuscated: &Descriptor, reference: &Descriptor) -> MatchOutcome {
        self.progress.init(obfuscated.messages.len());

        info!(
            obfuscated_messages = obfuscated.messages.len(),
            reference_messages = reference.messages.len(),
            "starting matching run"
        );

        let enum_matches = find_enum_based_matches(obfuscated, reference, &self.progress);
        let peel = peel_unique_matches(obfuscated, reference, &enum_matches, &self.progress);

        let claimed_obfuscated: HashSet<&str> = enum_matches
            .iter()
            .chain(peel.matches.iter())
            .map(|m| m.obfuscated_msg.as_str())
            .collect();
        let claimed_reference: HashSet<&str> = enum_matches
            .iter()
            .chain(peel.matches.iter())
            .map(|m| m.original_msg.as_str())
            .collect();

        let unmatched_obfuscated = unclaimed_names(obfuscated, &claimed_obfuscated);
        let unmatched_reference = unclaimed_names(reference, &claimed_reference);

        let outcome = MatchOutcome {
            enum_matches,
            structure_matches: peel.matches,
            unmatched_obfuscated,
            unmatched_reference,
            structure_passes: peel.passes,
            progress_percent: self.progress.progress(),
        };

        info!(
            enum_matches = outcome.enum_matches.len(),
            structure_matches = outcome.structure_matches.len(),
            unmatched_obfuscated = outcome.unmatched_obfuscated.len(),
            matching_progress = %format!("{:.1}%", outcome.progress_percent),
            "matching run complete"
        );

        outcome
    }
}

fn unclaimed_names(descriptor: &Descriptor, claimed: &HashSet<&str>) -> Vec<String> {
    descriptor
        .messages
        .iter()
        .filter(|m| !claimed.contains(m.name.as_str()))
        .map(|m| m.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnumType, EnumValue, Field, FieldLabel, MessageType};

    fn scalar_message(name: &str, types: &[&str]) -> MessageType {
        MessageType {
            name: name.into(),
            fields: types
                .iter()
                .enumerate()
                .map(|(i, t)| Field {
                    name: format!("f{}", i),
                    number: i as i32 + 1,
                    label: FieldLabel::None,
                    type_name: t.to_string(),
                    oneof_index: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_enum_matched_messages_skip_structure_stage() {
        let mut obs = scalar_message("Iqe", &["int32"]);
        obs.enum_types.push(EnumType {
            name: "ipz".into(),
            values: vec![EnumValue { name: "A".into(), number: 0 }],
        });
        let mut orig = scalar_message("CraftResult", &["int32"]);
        orig.enum_types = obs.enum_types.clone();

        let obfuscated = Descriptor {
            messages: vec![obs, scalar_message("Kpo", &["string", "bool"])],
            ..Default::default()
        };
        let reference = Descriptor {
            messages: vec![
                orig,
                scalar_message("Login", &["string", "bool"]),
                scalar_message("Orphan", &["int64"]),
            ],
            ..Default::default()
        };

        let engine = MatchEngine::new();
        let outcome = engine.run(&obfuscated, &reference);

        assert_eq!(outcome.enum_matches.len(), 1);
        assert_eq!(outcome.structure_matches.len(), 1);
        assert_eq!(outcome.structure_matches[0].original_msg, "Login");
        assert!(outcome.unmatched_obfuscated.is_empty());
        assert_eq!(outcome.unmatched_reference, vec!["Orphan"]);
        assert_eq!(outcome.total_matches(), 2);
        assert_eq!(outcome.progress_percent, 100.0);
        assert_eq!(engine.progress().matched(), 2);
    }

    #[test]
    fn test_runs_do_not_share_progress() {
        let obfuscated = Descriptor {
            messages: vec![scalar_message("A", &["int32"])],
            ..Default::default()
        };
        let reference = obfuscated.clone();
        let engine = MatchEngine::new();
        engine.run(&obfuscated, &reference);
        let second = engine.run(&obfuscated, &reference);
        assert_eq!(second.progress_percent, 100.0);
        assert_eq!(engine.progress().matched(), 1);
    }
}
