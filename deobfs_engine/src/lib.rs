#![forbid(unsafe_code)]

//! Deobfs engine: recovers the original names of obfuscated protobuf
//! messages by matching them against a reference schema on enum
//! fingerprints and field structure.
//!
//! Pure and synchronous. No I/O; parsing and reporting live in
//! `deobfs_runtime`.

/// Bumped whenever a change alters which matches a run produces.
pub const ENGINE_VERSION: u32 = 1;

pub mod scoring;
pub mod domain;
pub mod walk;
pub mod compare;
pub mod progress;
pub mod enum_matcher;
pub mod structure_matcher;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use domain::{Descriptor, EnumMatch, EnumType, EnumValue, Field, FieldLabel, MessageMatch, MessageType, OneofDecl};
pub use engine::{MatchEngine, MatchOutcome};
pub use progress::MatchProgress;
