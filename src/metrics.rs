//! Metric helpers for `fieldwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to a no-op, so call sites never need
//! feature guards.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::hooks::Direction;

/// Name of the counter tracking completed messages.
pub const MESSAGES_PROCESSED: &str = "fieldwire_messages_processed_total";
/// Name of the counter tracking protocol errors.
pub const PROTOCOL_ERRORS: &str = "fieldwire_protocol_errors_total";
/// Name of the counter tracking parse calls that suspended for more bytes.
pub const PARSE_SUSPENSIONS: &str = "fieldwire_parse_suspensions_total";

/// Record a completed message for the given direction.
pub fn inc_messages(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_PROCESSED, "direction" => direction.label()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a protocol error.
pub fn inc_protocol_errors() {
    #[cfg(feature = "metrics")]
    counter!(PROTOCOL_ERRORS).increment(1);
}

/// Record a parse call that returned without a message, awaiting bytes.
pub fn inc_parse_suspensions() {
    #[cfg(feature = "metrics")]
    counter!(PARSE_SUSPENSIONS).increment(1);
}
