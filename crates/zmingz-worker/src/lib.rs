//! Concurrent mirror pipeline.
//!
//! This crate provides:
//! - The mirror job (one engine invocation, one result)
//! - Weak-observer completion delivery
//! - The two-slot pipeline orchestrator
//! - Structured job logging and worker configuration

pub mod config;
pub mod delivery;
pub mod error;
pub mod job;
pub mod logging;
pub mod pipeline;

pub use config::WorkerConfig;
pub use delivery::{CompletionObserver, CompletionSink};
pub use error::{WorkerError, WorkerResult};
pub use job::{MirrorJob, MirrorJobResult, MirrorOutcome};
pub use logging::JobLogger;
pub use pipeline::{DispatchHandle, MirrorPipeline};
