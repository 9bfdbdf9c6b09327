#![doc(html_root_url = "https://docs.rs/fieldwire/latest")]
//! Public API for the `fieldwire` library.
//!
//! This crate provides building blocks for bitmap-governed field formats in
//! the ISO 8583 family: per-field wire codecs, a registry that formats and
//! parses whole messages, resumable parsing over partial input, and
//! sensitive-field redaction for logs and wire dumps.

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
/// Error types re-exported at the root; nearly every fallible call in the
/// crate returns one of these.
pub use error::{CodecError, ConfigError, ProtocolError, Result};
pub mod formatter;
pub mod hooks;
pub mod length;
pub mod message;
pub mod metrics;
pub mod security;
pub mod transport;

pub use context::{FormatterContext, ParsePhase, ParserContext};
pub use formatter::{FieldFormatter, MessageFormatter, MessageFormatterBuilder};
pub use hooks::{Direction, LoggingHooks, MessageHooks};
pub use message::{FieldNumber, Message};
pub use transport::MessageCodec;
