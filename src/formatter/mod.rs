//! Field and message formatting: the strategies that put typed fields on the
//! wire and the orchestrator that drives whole messages through them.
//!
//! A [`FieldFormatter`] combines a length manager and a data encoding for one
//! field number. The [`MessageFormatter`] holds the per-number registry plus
//! the bitmap, packet-header, hook, and security machinery, and exposes the
//! resumable [`parse`](MessageFormatter::parse) /
//! [`format`](MessageFormatter::format) pair.

pub mod announcing;
pub mod builder;
pub mod field;
pub mod message;
pub mod padding;

pub use announcing::AnnouncingFormatter;
pub use builder::MessageFormatterBuilder;
pub use field::{Compression, FieldFormatter};
pub use message::MessageFormatter;
pub use padding::Padding;
