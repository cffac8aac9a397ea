//! Shared data models for the zmingz mirror pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Media kinds (image / video)
//! - Output slots and their numbering
//! - Run identifiers and per-job states

pub mod job;
pub mod media;
pub mod slot;

// Re-export common types
pub use job::{JobState, RunId};
pub use media::{MediaKind, MediaKindParseError};
pub use slot::{Slot, SlotError};
