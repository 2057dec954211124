//! Span helpers for cache operations.

use tracing::{debug_span, field, Span};

/// Span covering one orchestrator operation on an encoded key.
pub fn operation_span(operation: &'static str, key: &str) -> Span {
    debug_span!("cash", op = operation, key = %key)
}

/// Span covering one call into a single tier.
///
/// The `error` field starts empty and is filled by [`record_error`].
pub fn tier_span(tier: &str, operation: &'static str) -> Span {
    debug_span!("tier", name = %tier, op = operation, error = field::Empty)
}

/// Record `error` on a span created by [`tier_span`].
pub fn record_error(span: &Span, error: &dyn std::error::Error) {
    span.record("error", field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}
