#![forbid(unsafe_code)]

//! Deobfs runtime.
//!
//! Wraps the matching engine with schema loading (text `.proto`, descriptor
//! JSON, binary descriptor sets), namespace filtering, configuration,
//! reporting and determinism checks.
//!
//! No matching logic lives here; it is all delegated to `deobfs_engine`.

pub mod error;
pub mod parser;
pub mod proto_types;
pub mod proto_bridge;
pub mod loader;
pub mod filter;
pub mod report;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod drift;

pub use error::{RuntimeError, RuntimeResult};
