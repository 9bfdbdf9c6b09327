//! Resumable cursors over wire buffers.
//!
//! A context pairs one growable byte buffer with the transient state a
//! suspended operation needs to pick up exactly where it stopped. Parsing
//! and formatting each get their own context type; neither is shared across
//! streams.

pub mod formatter;
pub mod parser;

pub use formatter::FormatterContext;
pub use parser::{ParsePhase, ParserContext};

#[cfg(test)]
mod tests;
