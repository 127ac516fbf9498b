//! Hand-written protobuf types mirroring the part of
//! `google/protobuf/descriptor.proto` the loader needs.
//!
//! Uses prost derive macros for decoding without prost-build.
//! Field numbers match descriptor.proto exactly; everything not listed is
//! skipped as unknown on decode.

use prost::Message;

// ── File level ─────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[prost(string, optional, tag = "12")]
    pub syntax: Option<String>,
}

// ── Messages ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct DescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
    #[prost(message, repeated, tag = "3")]
    pub nested_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "4")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[prost(message, repeated, tag = "8")]
    pub oneof_decl: Vec<OneofDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FieldDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub number: Option<i32>,
    #[prost(enumeration = "FieldLabelProto", optional, tag = "4")]
    pub label: Option<i32>,
    #[prost(enumeration = "FieldTypeProto", optional, tag = "5")]
    pub r#type: Option<i32>,
    #[prost(string, optional, tag = "6")]
    pub type_name: Option<String>,
    #[prost(int32, optional, tag = "9")]
    pub oneof_index: Option<i32>,
    #[prost(bool, optional, tag = "17")]
    pub proto3_optional: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum FieldLabelProto {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum FieldTypeProto {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl FieldTypeProto {
    /// `.proto` keyword for scalar types; `None` for message, enum and group,
    /// which are named by `type_name`.
    pub fn keyword(self) -> Option<&'static str> {
        let kw = match self {
            FieldTypeProto::Double => "double",
            FieldTypeProto::Float => "float",
            FieldTypeProto::Int64 => "int64",
            FieldTypeProto::Uint64 => "uint64",
            FieldTypeProto::Int32 => "int32",
            FieldTypeProto::Fixed64 => "fixed64",
            FieldTypeProto::Fixed32 => "fixed32",
            FieldTypeProto::Bool => "bool",
            FieldTypeProto::String => "string",
            FieldTypeProto::Bytes => "bytes",
            FieldTypeProto::Uint32 => "uint32",
            FieldTypeProto::Sfixed32 => "sfixed32",
            FieldTypeProto::Sfixed64 => "sfixed64",
            FieldTypeProto::Sint32 => "sint32",
            FieldTypeProto::Sint64 => "sint64",
            FieldTypeProto::Group | FieldTypeProto::Message | FieldTypeProto::Enum => return None,
        };
        Some(kw)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct OneofDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
}

// ── Enums ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct EnumDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub value: Vec<EnumValueDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EnumValueDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "2")]
    pub number: Option<i32>,
}
