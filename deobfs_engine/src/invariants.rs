//! Deobfs engine: descriptor invariant checks.
//!
//! Run by the loader before matching; the matcher itself assumes a
//! descriptor that passed these checks. Returns the first violation found,
//! walking messages depth-first in declaration order.
//!
//! Reused field numbers are not a violation: they are collected for the
//! loader to warn about and the message still takes part in matching.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Descriptor, MessageType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error(
        "[INVARIANT:oneof_index] field {field:?} of {message} references oneof #{index} \
         but {declared} oneof(s) are declared"
    )]
    DanglingOneofIndex {
        message: String,
        field: String,
        index: i32,
        declared: usize,
    },
}

/// A field number used twice within one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFieldNumber {
    /// Dotted path of the message.
    pub message: String,
    pub number: i32,
    pub first: String,
    pub second: String,
}

/// Check every message of `descriptor`, nested ones included.
pub fn try_validate_descriptor(descriptor: &Descriptor) -> Result<(), InvariantViolation> {
    for msg in &descriptor.messages {
        try_validate_message(msg, &msg.name)?;
    }
    Ok(())
}

fn try_validate_message(msg: &MessageType, path: &str) -> Result<(), InvariantViolation> {
    try_check_oneof_indices(msg, path)?;
    for nested in &msg.nested_types {
        try_validate_message(nested, &format!("{}.{}", path, nested.name))?;
    }
    Ok(())
}

fn try_check_oneof_indices(msg: &MessageType, path: &str) -> Result<(), InvariantViolation> {
    for field in &msg.fields {
        if let Some(index) = field.oneof_index {
            if index < 0 || index as usize >= msg.oneof_decls.len() {
                return Err(InvariantViolation::DanglingOneofIndex {
                    message: path.to_string(),
                    field: field.name.clone(),
                    index,
                    declared: msg.oneof_decls.len(),
                });
            }
        }
    }
    Ok(())
}

/// Every reused field number, nested messages included, in walk order.
pub fn find_duplicate_field_numbers(descriptor: &Descriptor) -> Vec<DuplicateFieldNumber> {
    let mut found = Vec::new();
    for msg in &descriptor.messages {
        collect_duplicates(msg, &msg.name, &mut found);
    }
    found
}

fn collect_duplicates(msg: &MessageType, path: &str, found: &mut Vec<DuplicateFieldNumber>) {
    let mut seen: HashMap<i32, &str> = HashMap::new();
    for field in &msg.fields {
        if let Some(first) = seen.get(&field.number) {
            found.push(DuplicateFieldNumber {
                message: path.to_string(),
                number: field.number,
                first: first.to_string(),
                second: field.name.clone(),
            });
        } else {
            seen.insert(field.number, &field.name);
        }
    }
    for nested in &msg.nested_types {
        collect_duplicates(nested, &format!("{}.{}", path, nested.name), found);
    }
}
