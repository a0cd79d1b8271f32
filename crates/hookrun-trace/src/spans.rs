//! Span creation for pipeline operations.

use std::fmt::Display;
use tracing::{Level, Span, span};

/// Span for one delivery of a dispatch message to the worker.
pub fn execution_span(execution_id: impl Display, trigger_id: impl Display) -> Span {
    span!(
        Level::INFO,
        "execution.process",
        hookrun.execution.id = %execution_id,
        hookrun.trigger.id = %trigger_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_is_disabled_without_subscriber() {
        let span = execution_span("exe_1", "trg_1");
        assert!(span.is_disabled());
    }
}
