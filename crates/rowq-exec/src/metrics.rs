//! Metrics hooks.
//!
//! Counters are emitted as trace events; wire a subscriber in the binary
//! layer to collect them.

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::span!(tracing::Level::TRACE, "rowq", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%event, %k, %v, "metric");
    }
}
