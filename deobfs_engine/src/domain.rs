//! Deobfs engine: core domain types.
//!
//! Pure data. The descriptor tree is owned top-down; nested messages are
//! addressed by dotted paths built during traversal, never by back pointers.
//!
//! Serde names follow the JSON rendering of `descriptor.proto`
//! (`messageType`, `nestedType`, `oneofDecl`, ...), so descriptor dumps can be
//! loaded directly.

use serde::{Deserialize, Serialize};

// ── Descriptor model ───────────────────────────────────────────────

/// One `NAME = number` pair of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(rename = "value", default)]
    pub values: Vec<EnumValue>,
}

/// Field cardinality as written in the schema source.
///
/// proto2 `required` carries no information the matcher uses and is folded
/// into `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLabel {
    #[default]
    #[serde(alias = "", alias = "required", alias = "LABEL_REQUIRED")]
    None,
    #[serde(alias = "LABEL_OPTIONAL")]
    Optional,
    #[serde(alias = "LABEL_REPEATED")]
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub number: i32,
    #[serde(default)]
    pub label: FieldLabel,
    /// Primitive keyword (`int32`, `string`, ...) or a type reference.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Index into the owning message's `oneof_decls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof_index: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OneofDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageType {
    pub name: String,
    #[serde(rename = "field", default)]
    pub fields: Vec<Field>,
    #[serde(rename = "nestedType", default)]
    pub nested_types: Vec<MessageType>,
    #[serde(rename = "enumType", default)]
    pub enum_types: Vec<EnumType>,
    #[serde(rename = "oneofDecl", default)]
    pub oneof_decls: Vec<OneofDecl>,
    /// Path of the file the top-level message was loaded from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_file: String,
}

impl MessageType {
    /// Fields that belong to oneof slot `index`, in declaration order.
    pub fn oneof_fields(&self, index: usize) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.oneof_index.map_or(false, |i| i >= 0 && i as usize == index))
            .collect()
    }
}

/// One schema variant: every top-level message and file-scope enum of the
/// loaded files, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub syntax: String,
    #[serde(rename = "messageType", default)]
    pub messages: Vec<MessageType>,
    #[serde(rename = "enumType", default)]
    pub enums: Vec<EnumType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_files: Vec<String>,
}

impl Descriptor {
    /// Append another descriptor's contents, keeping order.
    pub fn merge(&mut self, other: Descriptor) {
        if !other.package.is_empty() {
            self.package = other.package;
        }
        if !other.syntax.is_empty() {
            self.syntax = other.syntax;
        }
        self.messages.extend(other.messages);
        self.enums.extend(other.enums);
        self.source_files.extend(other.source_files);
    }

    /// Stamp every top-level message with `path` and record it as a source.
    pub fn stamp_source_file(&mut self, path: &str) {
        for msg in &mut self.messages {
            msg.source_file = path.to_string();
        }
        self.source_files.push(path.to_string());
    }
}

// ── Match records ──────────────────────────────────────────────────

/// Correspondence between two enums, addressed by dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMatch {
    pub obfuscated_enum: String,
    pub original_enum: String,
    /// `NAME=number` pairs of the obfuscated enum, for diagnostics.
    pub values: Vec<String>,
    pub confidence: f64,
}

/// A resolved top-level message. Final once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMatch {
    pub obfuscated_msg: String,
    pub obfuscated_file: String,
    pub original_msg: String,
    pub original_file: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_matches: Vec<EnumMatch>,
}

impl MessageMatch {
    pub fn between(obfuscated: &MessageType, original: &MessageType, confidence: f64) -> Self {
        Self {
            obfuscated_msg: obfuscated.name.clone(),
            obfuscated_file: obfuscated.source_file.clone(),
            original_msg: original.name.clone(),
            original_file: original.source_file.clone(),
            confidence,
            enum_matches: Vec::new(),
        }
    }
}
