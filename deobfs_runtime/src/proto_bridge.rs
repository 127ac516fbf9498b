//! Descriptor-set → domain conversion bridge.
//!
//! Converts the prost descriptor types (proto_types.rs) into the engine's
//! `Descriptor`. The result must look like what the text parser produces
//! for the same `.proto` source, so both inputs compare on equal terms.

use std::collections::BTreeMap;

use deobfs_engine::domain::{
    Descriptor, EnumType, EnumValue, Field, FieldLabel, MessageType, OneofDecl,
};

use crate::proto_types::*;

/// Convert one file of a descriptor set.
pub fn file_to_domain(file: &FileDescriptorProto) -> Descriptor {
    let syntax = match file.syntax() {
        "" => "proto2",
        other => other,
    };
    let proto3 = syntax == "proto3";

    Descriptor {
        package: file.package().to_string(),
        syntax: syntax.to_string(),
        messages: file
            .message_type
            .iter()
            .map(|m| message_to_domain(m, proto3))
            .collect(),
        enums: file.enum_type.iter().map(enum_to_domain).collect(),
        source_files: Vec::new(),
    }
}

/// Convert every file of a set, paired with its `name` for source stamping.
pub fn set_to_domain(set: &FileDescriptorSet) -> Vec<(String, Descriptor)> {
    set.file
        .iter()
        .map(|f| (f.name().to_string(), file_to_domain(f)))
        .collect()
}

fn message_to_domain(msg: &DescriptorProto, proto3: bool) -> MessageType {
    let remap = oneof_remap(msg);

    let oneof_decls = msg
        .oneof_decl
        .iter()
        .enumerate()
        .filter(|(i, _)| remap.contains_key(&(*i as i32)))
        .map(|(_, o)| OneofDecl { name: o.name().to_string() })
        .collect();

    MessageType {
        name: msg.name().to_string(),
        fields: msg
            .field
            .iter()
            .map(|f| field_to_domain(f, proto3, &remap))
            .collect(),
        nested_types: msg
            .nested_type
            .iter()
            .map(|n| message_to_domain(n, proto3))
            .collect(),
        enum_types: msg.enum_type.iter().map(enum_to_domain).collect(),
        oneof_decls,
        source_file: String::new(),
    }
}

/// Old oneof index → new index, for real oneofs only. A oneof whose members
/// are all `proto3_optional` is synthetic and disappears.
fn oneof_remap(msg: &DescriptorProto) -> BTreeMap<i32, i32> {
    let mut remap = BTreeMap::new();
    for index in 0..msg.oneof_decl.len() as i32 {
        let mut members = msg.field.iter().filter(|f| f.oneof_index == Some(index)).peekable();
        let synthetic = members.peek().is_some() && members.all(|f| f.proto3_optional());
        if !synthetic {
            let next = remap.len() as i32;
            remap.insert(index, next);
        }
    }
    remap
}

fn field_to_domain(field: &FieldDescriptorProto, proto3: bool, remap: &BTreeMap<i32, i32>) -> Field {
    let label = match field.label.and_then(|l| FieldLabelProto::try_from(l).ok()) {
        Some(FieldLabelProto::Repeated) => FieldLabel::Repeated,
        Some(FieldLabelProto::Optional) if !proto3 || field.proto3_optional() => FieldLabel::Optional,
        _ => FieldLabel::None,
    };

    let keyword = field
        .r#type
        .and_then(|t| FieldTypeProto::try_from(t).ok())
        .and_then(FieldTypeProto::keyword);
    let type_name = match keyword {
        Some(kw) => kw.to_string(),
        None => field.type_name().trim_start_matches('.').to_string(),
    };

    Field {
        name: field.name().to_string(),
        number: field.number(),
        label,
        type_name,
        oneof_index: field.oneof_index.and_then(|i| remap.get(&i).copied()),
    }
}

fn enum_to_domain(e: &EnumDescriptorProto) -> EnumType {
    EnumType {
        name: e.name().to_string(),
        values: e
            .value
            .iter()
            .map(|v| EnumValue {
                name: v.name().to_string(),
                number: v.number(),
            })
            .collect(),
    }
}
