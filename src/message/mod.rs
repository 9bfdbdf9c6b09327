//! Message data model: numbered fields, typed values, and presence bitmaps.
//!
//! These are the domain types shared by the formatting and parsing layers.
//! A [`Message`] maps [`FieldNumber`]s to [`Field`]s; a [`Bitmap`] declares
//! which numbers are present when the message travels on the wire.

pub mod bitmap;
pub mod field;
pub mod model;
pub mod number;

pub use bitmap::Bitmap;
pub use field::{Field, FieldValue};
pub use model::Message;
pub use number::FieldNumber;
