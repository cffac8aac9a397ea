#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for mirror transforms.
//!
//! This crate provides:
//! - The two mirror filter-graph expressions
//! - Type-safe FFmpeg command building
//! - A pluggable transform engine with an FFmpeg process implementation
//! - Return-code classification into success / cancelled / failed
//! - Cache directory, input staging and output path allocation

pub mod adapter;
pub mod command;
pub mod engine;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod request;

pub use adapter::{
    EngineOutcome, TransformAdapter, RETURN_CODE_CANCEL, RETURN_CODE_ENGINE_UNAVAILABLE,
    RETURN_CODE_SUCCESS,
};
pub use command::{check_ffmpeg, FfmpegCommand};
pub use engine::{FfmpegEngine, TransformEngine};
pub use error::{MediaError, MediaResult};
pub use filters::{FilterExpression, VARIANT_A, VARIANT_B};
pub use fs_utils::{file_extension, media_cache_dir, stage_input, OutputAllocator};
pub use request::MirrorJobRequest;
