//! End-to-end matching scenarios over hand-built descriptors.

use deobfs_engine::compare::compare_enums;
use deobfs_engine::enum_matcher::find_enum_based_matches;
use deobfs_engine::hashing::canonical_hash;
use deobfs_engine::structure_matcher::{find_strict_structure_matches, peel_unique_matches};
use deobfs_engine::{
    Descriptor, EnumType, EnumValue, Field, FieldLabel, MatchEngine, MatchProgress, MessageType,
};

fn enum_of(name: &str, pairs: &[(&str, i32)]) -> EnumType {
    EnumType {
        name: name.to_string(),
        values: pairs
            .iter()
            .map(|(n, v)| EnumValue { name: n.to_string(), number: *v })
            .collect(),
    }
}

fn field(type_name: &str, number: i32) -> Field {
    Field {
        name: format!("field_{}", number),
        number,
        label: FieldLabel::None,
        type_name: type_name.to_string(),
        oneof_index: None,
    }
}

fn message(name: &str, file: &str, types: &[&str]) -> MessageType {
    MessageType {
        name: name.to_string(),
        fields: types
            .iter()
            .enumerate()
            .map(|(i, t)| field(t, i as i32 + 1))
            .collect(),
        source_file: file.to_string(),
        ..Default::default()
    }
}

fn descriptor(messages: Vec<MessageType>) -> Descriptor {
    Descriptor { messages, ..Default::default() }
}

// ─────────────────────────────────────────────────────────────
// Scenario 1: nested enum fingerprint
// ─────────────────────────────────────────────────────────────

#[test]
fn nested_enum_identifies_message() {
    let mut iqe = message("Iqe", "iqe.proto", &[]);
    iqe.nested_types.push(MessageType {
        name: "jrk".to_string(),
        enum_types: vec![enum_of("ipz", &[("A", 0), ("B", 1)])],
        ..Default::default()
    });
    let mut craft = message("CraftResult", "craft.proto", &[]);
    craft.enum_types.push(enum_of("Result", &[("A", 0), ("B", 1)]));

    let obfuscated = descriptor(vec![iqe]);
    let reference = descriptor(vec![message("Noise", "noise.proto", &["int32"]), craft]);

    let progress = MatchProgress::new();
    progress.init(obfuscated.messages.len());
    let matches = find_enum_based_matches(&obfuscated, &reference, &progress);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].obfuscated_msg, "Iqe");
    assert_eq!(matches[0].original_msg, "CraftResult");
    assert_eq!(matches[0].confidence, 100.0);
    assert_eq!(matches[0].enum_matches[0].obfuscated_enum, "Iqe.jrk.ipz");
    assert_eq!(matches[0].enum_matches[0].original_enum, "CraftResult.Result");
}

// ─────────────────────────────────────────────────────────────
// Scenario 2: unique perfect structure
// ─────────────────────────────────────────────────────────────

#[test]
fn unique_perfect_structure_matches_only_identical_shape() {
    let obfuscated = descriptor(vec![message("Xyz", "x.proto", &["string", "int32"])]);
    let reference = descriptor(vec![
        message("Login", "login.proto", &["string", "int32"]),
        message("Logout", "logout.proto", &["string", "bool"]),
    ]);

    let progress = MatchProgress::new();
    let matches = find_strict_structure_matches(&obfuscated, &reference, &[], &progress);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].original_msg, "Login");
    assert_eq!(matches[0].original_file, "login.proto");
    assert_eq!(matches[0].confidence, 100.0);
}

// ─────────────────────────────────────────────────────────────
// Scenario 3: identical reference shapes stay ambiguous
// ─────────────────────────────────────────────────────────────

#[test]
fn identical_reference_shapes_are_never_forced() {
    let obfuscated = descriptor(vec![message("Abc", "a.proto", &["string", "int64"])]);
    let reference = descriptor(vec![
        message("Ping", "ping.proto", &["string", "int64"]),
        message("Pong", "pong.proto", &["string", "int64"]),
    ]);

    let progress = MatchProgress::new();
    let result = peel_unique_matches(&obfuscated, &reference, &[], &progress);

    assert!(result.matches.is_empty());
    assert_eq!(result.unmatched_obfuscated, vec![0]);
    assert_eq!(result.unmatched_reference, vec![0, 1]);
}

// ─────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────

#[test]
fn enum_decision_is_symmetric_but_score_uses_larger_size() {
    let cases = [
        (enum_of("a", &[("A", 0)]), enum_of("b", &[("A", 0), ("B", 1), ("C", 2)])),
        (enum_of("a", &[("A", 0), ("B", 1)]), enum_of("b", &[("A", 0), ("B", 5)])),
        (enum_of("a", &[("X", 1)]), enum_of("b", &[("Y", 1)])),
        (enum_of("a", &[("A", 0), ("B", 1)]), enum_of("b", &[("B", 1), ("A", 0)])),
    ];
    for (a, b) in &cases {
        let (ab, score_ab) = compare_enums(a, b);
        let (ba, score_ba) = compare_enums(b, a);
        assert_eq!(ab, ba, "decision must not depend on argument order");
        assert_eq!(score_ab, score_ba);
    }
    let (is_match, score) = compare_enums(&cases[0].0, &cases[0].1);
    assert!(is_match);
    assert!((score - 100.0 / 3.0).abs() < 1e-9);
}

fn mixed_schema() -> (Descriptor, Descriptor) {
    let obfuscated = descriptor(vec![
        message("Aaa", "o1.proto", &["string", "int32"]),
        message("Bbb", "o1.proto", &["bool"]),
        message("Ccc", "o2.proto", &["int64", "int64"]),
        message("Ddd", "o2.proto", &["bool"]),
        message("Eee", "o2.proto", &["string", "string", "bool"]),
    ]);
    let reference = descriptor(vec![
        message("Chat", "r1.proto", &["string", "int32"]),
        message("Flag", "r1.proto", &["bool"]),
        message("Toggle", "r1.proto", &["bool"]),
        message("Range", "r2.proto", &["int64", "int64"]),
        message("Profile", "r2.proto", &["string", "string", "bool"]),
    ]);
    (obfuscated, reference)
}

#[test]
fn structure_matcher_is_idempotent() {
    let (obfuscated, reference) = mixed_schema();
    let progress = MatchProgress::new();
    let first = find_strict_structure_matches(&obfuscated, &reference, &[], &progress);
    assert_eq!(first.len(), 3);

    let second = find_strict_structure_matches(&obfuscated, &reference, &first, &progress);
    assert!(second.is_empty());
}

#[test]
fn structure_matcher_converges_within_bound() {
    let (obfuscated, reference) = mixed_schema();
    let progress = MatchProgress::new();
    let result = peel_unique_matches(&obfuscated, &reference, &[], &progress);
    let n = obfuscated.messages.len();
    assert!(result.passes <= n + 1, "passes {} exceed bound {}", result.passes, n + 1);
    // "Bbb" and "Ddd" both see "Flag" and "Toggle".
    assert_eq!(result.unmatched_obfuscated, vec![1, 3]);
}

#[test]
fn enum_matcher_is_greedy_in_reference_order() {
    let mut obs = message("Qqq", "o.proto", &[]);
    obs.enum_types.push(enum_of("k", &[("ON", 1), ("OFF", 2)]));
    let mut first = message("PowerState", "r.proto", &[]);
    first.enum_types.push(enum_of("State", &[("ON", 1), ("OFF", 2)]));
    let mut second = message("LightState", "r.proto", &[]);
    second.enum_types.push(enum_of("State", &[("ON", 1), ("OFF", 2)]));

    let obfuscated = descriptor(vec![obs]);
    let forward = descriptor(vec![first.clone(), second.clone()]);
    let backward = descriptor(vec![second, first]);

    let progress = MatchProgress::new();
    let a = find_enum_based_matches(&obfuscated, &forward, &progress);
    let b = find_enum_based_matches(&obfuscated, &forward, &progress);
    let c = find_enum_based_matches(&obfuscated, &backward, &progress);

    assert_eq!(a, b);
    assert_eq!(a[0].original_msg, "PowerState");
    assert_eq!(c[0].original_msg, "LightState");
}

#[test]
fn engine_runs_are_deterministic() {
    let (obfuscated, reference) = mixed_schema();
    let engine = MatchEngine::new();
    let first = engine.run(&obfuscated, &reference);
    let second = engine.run(&obfuscated, &reference);

    let h1 = canonical_hash(&first.all_matches().cloned().collect::<Vec<_>>());
    let h2 = canonical_hash(&second.all_matches().cloned().collect::<Vec<_>>());
    assert_eq!(h1, h2);
    assert_eq!(first.unmatched_reference, vec!["Flag", "Toggle"]);
    assert!((first.progress_percent - 60.0).abs() < 1e-9);
}
