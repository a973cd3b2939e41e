//! Errors surfaced by [`TypedEventEmitter::emit`](crate::TypedEventEmitter::emit).
//!
//! The emitter itself never fails: unknown events and mismatched callbacks are
//! rejected by the compiler, and emitting to an event nobody listens to is a
//! no-op. The only runtime failure is a subscriber reporting one, which stops
//! delivery for that call and is handed back to the caller as an [`EmitError`].

use thiserror::Error;

/// Boxed error type that subscriber callbacks report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single `emit` call.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A subscriber returned an error. Subscribers after it were not invoked.
    #[error("subscriber #{position} of event '{event}' failed: {source}")]
    Subscriber {
        /// Name of the event being emitted.
        event: &'static str,
        /// Zero-based position of the failing subscriber in delivery order.
        position: usize,
        /// Error returned by the subscriber.
        #[source]
        source: BoxError,
    },
}

impl EmitError {
    /// Name of the event whose delivery failed.
    pub fn event(&self) -> &'static str {
        match self {
            EmitError::Subscriber { event, .. } => event,
        }
    }

    /// Position of the subscriber that failed.
    pub fn position(&self) -> usize {
        match self {
            EmitError::Subscriber { position, .. } => *position,
        }
    }
}
