//! Deobfs engine: descriptor tree traversal.
//!
//! Paths are dot joined and rooted at the top-level message name:
//! `Top.Nested.EnumName`. Traversal order is deterministic: a message's own
//! enums first, then each nested message depth-first, all in declaration
//! order.

use crate::domain::{EnumType, EnumValue, MessageType};

/// Every enum reachable from `msg`, keyed by dotted path.
pub fn collect_enums(msg: &MessageType) -> Vec<(String, &EnumType)> {
    let mut out = Vec::new();
    collect_into(msg, &msg.name, &mut out);
    out
}

fn collect_into<'a>(msg: &'a MessageType, path: &str, out: &mut Vec<(String, &'a EnumType)>) {
    for enum_type in &msg.enum_types {
        out.push((format!("{}.{}", path, enum_type.name), enum_type));
    }
    for nested in &msg.nested_types {
        let nested_path = format!("{}.{}", path, nested.name);
        collect_into(nested, &nested_path, out);
    }
}

/// True if `msg` or any of its descendants declares an enum.
pub fn has_enums(msg: &MessageType) -> bool {
    !msg.enum_types.is_empty() || msg.nested_types.iter().any(has_enums)
}

/// Number of messages in the forest, nested ones included.
pub fn count_messages(messages: &[MessageType]) -> usize {
    messages
        .iter()
        .map(|m| 1 + count_messages(&m.nested_types))
        .sum()
}

/// `NAME=number` strings in declaration order.
pub fn format_enum_values(values: &[EnumValue]) -> Vec<String> {
    values
        .iter()
        .map(|v| format!("{}={}", v.name, v.number))
        .collect()
}

/// `path: [A=0, B=1] | path2: [...]`, for log lines.
pub fn format_enum_paths(enums: &[(String, &EnumType)]) -> String {
    enums
        .iter()
        .map(|(path, e)| format!("{}: [{}]", path, format_enum_values(&e.values).join(", ")))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_type(name: &str) -> EnumType {
        EnumType {
            name: name.to_string(),
            values: vec![EnumValue { name: "A".into(), number: 0 }],
        }
    }

    fn tree() -> MessageType {
        MessageType {
            name: "Top".into(),
            enum_types: vec![enum_type("Own")],
            nested_types: vec![
                MessageType {
                    name: "Mid".into(),
                    nested_types: vec![MessageType {
                        name: "Leaf".into(),
                        enum_types: vec![enum_type("Deep")],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                MessageType {
                    name: "Side".into(),
                    enum_types: vec![enum_type("Other")],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_enums_paths_and_order() {
        let msg = tree();
        let paths: Vec<String> = collect_enums(&msg).into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["Top.Own", "Top.Mid.Leaf.Deep", "Top.Side.Other"]);
    }

    #[test]
    fn test_has_enums_sees_deep_nesting() {
        let mut msg = tree();
        assert!(has_enums(&msg));
        msg.enum_types.clear();
        msg.nested_types.truncate(1);
        assert!(has_enums(&msg));
        msg.nested_types.clear();
        assert!(!has_enums(&msg));
    }

    #[test]
    fn test_count_messages() {
        assert_eq!(count_messages(&[tree()]), 4);
        assert_eq!(count_messages(&[]), 0);
    }

    #[test]
    fn test_format_enum_paths() {
        let msg = tree();
        let enums = collect_enums(&msg);
        let text = format_enum_paths(&enums[..1]);
        assert_eq!(text, "Top.Own: [A=0]");
    }
}
