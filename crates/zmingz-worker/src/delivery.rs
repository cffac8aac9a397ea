//! Completion delivery.
//!
//! The pipeline never owns the caller. It keeps a `Weak` reference to the
//! registered observer and checks liveness right before each delivery; if
//! the caller has been torn down the result is dropped.

use std::sync::{Arc, Weak};

use tracing::debug;

use crate::job::MirrorJobResult;

/// Receives mirror job results. Called from a runtime worker thread.
pub trait CompletionObserver: Send + Sync {
    fn on_complete(&self, result: MirrorJobResult);
}

impl<F> CompletionObserver for F
where
    F: Fn(MirrorJobResult) + Send + Sync,
{
    fn on_complete(&self, result: MirrorJobResult) {
        self(result)
    }
}

/// Non-owning handle to a [`CompletionObserver`].
#[derive(Clone)]
pub struct CompletionSink {
    target: Weak<dyn CompletionObserver>,
}

impl CompletionSink {
    pub fn new<O: CompletionObserver + 'static>(observer: &Arc<O>) -> Self {
        let target: Weak<O> = Arc::downgrade(observer);
        Self { target }
    }

    /// Whether the observer is still alive.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Hand `result` to the observer if it still exists.
    ///
    /// Returns `false` when the observer was gone and the result was dropped.
    pub fn deliver(self, result: MirrorJobResult) -> bool {
        match self.target.upgrade() {
            Some(observer) => {
                observer.on_complete(result);
                true
            }
            None => {
                debug!(
                    slot = %result.slot,
                    "Completion observer dropped, discarding result"
                );
                false
            }
        }
    }
}
