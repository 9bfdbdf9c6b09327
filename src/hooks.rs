//! Callbacks invoked by the message formatter at fixed points.
//!
//! [`MessageHooks`] is the public interface applications implement; the
//! formatter stores one implementation behind `Arc` and calls it on both the
//! format and parse paths. All methods default to no-ops so implementations
//! override only what they need.

use std::sync::Arc;

use crate::{message::Message, security::SecuritySchema};

/// Whether a hook fires while writing or while reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The message is being written to the wire.
    Format,
    /// The message is being assembled from the wire.
    Parse,
}

impl Direction {
    /// Lowercase label used in log and metric output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Parse => "parse",
        }
    }
}

/// Observation points around message processing.
pub trait MessageHooks: Send + Sync {
    /// Called once per message after the header is handled and before any
    /// numbered field is processed.
    ///
    /// On the format path the full outgoing message is visible; on the parse
    /// path only the header has been assembled so far. A resumed parse does
    /// not re-fire the hook.
    fn before_fields(&self, _message: &Message, _direction: Direction) {}
}

/// Hook that logs message boundaries with sensitive fields masked.
///
/// # Examples
///
/// ```
/// use fieldwire::{
///     hooks::LoggingHooks,
///     security::{Obfuscation, SecuritySchema},
/// };
///
/// let schema = SecuritySchema::new()
///     .obfuscated(fieldwire::message::FieldNumber::new(2), Obfuscation::CardNumber);
/// let hooks = LoggingHooks::new(schema);
/// # let _ = hooks;
/// ```
pub struct LoggingHooks {
    schema: SecuritySchema,
}

impl LoggingHooks {
    /// Create a logging hook masking fields per `schema`.
    #[must_use]
    pub const fn new(schema: SecuritySchema) -> Self { Self { schema } }
}

impl MessageHooks for LoggingHooks {
    fn before_fields(&self, message: &Message, direction: Direction) {
        log::debug!(
            "{} message:\n{}",
            direction.label(),
            self.schema.describe(message)
        );
    }
}

/// Shared handle the formatter stores.
pub(crate) type SharedHooks = Arc<dyn MessageHooks>;
