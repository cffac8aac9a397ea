//! Transform engine adapter.
//!
//! Turns a [`MirrorJobRequest`] into one engine invocation and classifies the
//! engine's return code. The adapter never returns an error: anything that
//! goes wrong is folded into an [`EngineOutcome`].

use std::sync::Arc;

use tracing::{debug, error};

use crate::engine::TransformEngine;
use crate::request::MirrorJobRequest;

/// Return code FFmpeg reports on success.
pub const RETURN_CODE_SUCCESS: i32 = 0;

/// Return code FFmpeg reports when interrupted.
pub const RETURN_CODE_CANCEL: i32 = 255;

/// Reported when the engine could not be started at all.
pub const RETURN_CODE_ENGINE_UNAVAILABLE: i32 = -1;

/// Terminal classification of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOutcome {
    Success,
    Cancelled,
    Failed(i32),
}

impl EngineOutcome {
    pub fn from_return_code(code: i32) -> Self {
        match code {
            RETURN_CODE_SUCCESS => EngineOutcome::Success,
            RETURN_CODE_CANCEL => EngineOutcome::Cancelled,
            other => EngineOutcome::Failed(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EngineOutcome::Success)
    }
}

/// Runs mirror requests against a [`TransformEngine`].
#[derive(Clone)]
pub struct TransformAdapter {
    engine: Arc<dyn TransformEngine>,
}

impl TransformAdapter {
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self { engine }
    }

    /// Apply the request's filter to its input, overwriting its output.
    ///
    /// On anything but `Success` the output file must not be used.
    pub async fn run(&self, request: &MirrorJobRequest) -> EngineOutcome {
        let command = request.to_command();

        match self.engine.execute(&command).await {
            Ok(code) => {
                let outcome = EngineOutcome::from_return_code(code);
                debug!(
                    slot = %request.slot(),
                    return_code = code,
                    ?outcome,
                    "Transform engine finished"
                );
                outcome
            }
            Err(e) => {
                error!(
                    slot = %request.slot(),
                    "Transform engine could not be started: {}", e
                );
                EngineOutcome::Failed(RETURN_CODE_ENGINE_UNAVAILABLE)
            }
        }
    }
}
