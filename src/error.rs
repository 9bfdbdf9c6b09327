//! Error types for the message codec.
//!
//! This module provides a structured error taxonomy that distinguishes
//! configuration errors (malformed field tables, rejected at build time) from
//! protocol errors (malformed wire data or unformattable messages, raised
//! while formatting or parsing).
//!
//! # Error Categories
//!
//! - [`ConfigError`]: Registration-time problems (invalid length bounds, duplicate field
//!   registrations, malformed packet-header hex). These surface once, during formatter
//!   construction, and are never retried.
//! - [`ProtocolError`]: Wire-level violations (non-digit length bytes, out-of-range lengths,
//!   unattributable present fields). These terminate the message in flight; buffered bytes up to
//!   the failure point stay in the context for diagnostics.
//! - [`CodecError`]: Top-level enum wrapping both categories plus I/O errors from transport
//!   adapters.
//!
//! Insufficient data is deliberately *not* an error anywhere in this crate: a
//! parse that runs out of bytes returns `Ok(None)` and is retried once more
//! bytes have been fed to the context.

use std::io;

use thiserror::Error;

use crate::message::FieldNumber;

/// Construction-time configuration errors.
///
/// These indicate a malformed field table or formatter setup and are raised
/// by builders before any wire data is processed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Variable length bounds are inverted.
    #[error("invalid length bounds: minimum {min} exceeds maximum {max}")]
    InvalidLengthBounds {
        /// Declared minimum payload length.
        min: usize,
        /// Declared maximum payload length.
        max: usize,
    },

    /// The declared maximum cannot be represented by the length encoder.
    #[error("length bound {max} exceeds {digits}-digit encoder capacity {capacity}")]
    LengthCapacityExceeded {
        /// Declared maximum payload length.
        max: usize,
        /// Decimal digit capacity of the selected encoder.
        digits: u8,
        /// Largest value the encoder can carry.
        capacity: usize,
    },

    /// Length encoders support one to four decimal digits.
    #[error("unsupported length encoder width: {digits} digits")]
    UnsupportedDigits {
        /// Requested decimal digit count.
        digits: u8,
    },

    /// A formatter was already registered for this field number.
    #[error("duplicate formatter registration for field {number}")]
    DuplicateFormatter {
        /// Field number registered twice.
        number: FieldNumber,
    },

    /// A bitmap range must satisfy `lower <= upper`.
    #[error("invalid bitmap range: {lower}..={upper}")]
    InvalidBitmapRange {
        /// First field number the bitmap covers.
        lower: FieldNumber,
        /// Last field number the bitmap covers.
        upper: FieldNumber,
    },

    /// Bitmaps travel as raw bytes or hex text, never as packed decimal.
    #[error("bitmap fields cannot use BCD wire encoding")]
    BitmapEncoding,

    /// Compressed payloads are opaque bytes; packed decimal cannot carry them.
    #[error("compressed fields cannot use BCD wire encoding")]
    CompressedEncoding,

    /// A BCD pad nibble must fit in four bits.
    #[error("pad nibble {nibble:#04x} does not fit in four bits")]
    InvalidPadNibble {
        /// Rejected pad nibble value.
        nibble: u8,
    },

    /// The packet header hex string contains a non-hex character.
    #[error("invalid packet header hex: {source}")]
    InvalidPacketHeaderHex {
        /// Decoding failure reported by the hex parser.
        #[from]
        source: hex::FromHexError,
    },

    /// A field table entry references a field number reserved for headers.
    #[error("field {number} collides with the header sentinel")]
    ReservedFieldNumber {
        /// Field number that collides with [`FieldNumber::HEADER`].
        number: FieldNumber,
    },
}

// Manual marker impl: `hex::FromHexError` implements `PartialEq` but not
// `Eq`, which blocks `derive(Eq)`; its equality is nonetheless total.
impl Eq for ConfigError {}

/// Wire-level protocol errors raised during formatting or parsing.
///
/// A protocol error terminates processing of the current message. The parser
/// context retains its buffered bytes so callers can inspect the wire image
/// up to the failure point.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A wire length byte is not a decimal digit.
    #[error("length byte {byte:#04x} is not a decimal digit")]
    NonDigitLength {
        /// Offending wire byte.
        byte: u8,
    },

    /// A length fell outside the declared bounds.
    #[error("length {length} outside declared bounds {min}..={max}")]
    LengthOutOfRange {
        /// Length written or decoded.
        length: usize,
        /// Declared minimum.
        min: usize,
        /// Declared maximum.
        max: usize,
    },

    /// A fixed-length field was given a value of the wrong size.
    ///
    /// Fixed length managers enforce exact equality; values are never
    /// silently truncated or extended.
    #[error("fixed-length field expects {expected} units, value has {actual}")]
    FixedLengthMismatch {
        /// Length the field is configured for.
        expected: usize,
        /// Length of the supplied value.
        actual: usize,
    },

    /// A formatter received a field value of the wrong variant.
    #[error("field {number} expects a {expected} value, found {found}")]
    WrongValueKind {
        /// Field number being formatted.
        number: FieldNumber,
        /// Variant the formatter handles.
        expected: &'static str,
        /// Variant actually supplied.
        found: &'static str,
    },

    /// A present field number has no registered formatter.
    #[error("no formatter registered for present field {number}")]
    NoFormatter {
        /// Unattributable field number.
        number: FieldNumber,
    },

    /// A bitmap declared a field outside any registered coverage.
    #[error("field {number} lies outside bitmap range {lower}..={upper}")]
    OutsideBitmapRange {
        /// Declared field number.
        number: FieldNumber,
        /// First covered field number.
        lower: FieldNumber,
        /// Last covered field number.
        upper: FieldNumber,
    },

    /// The leading packet header did not match the configured bytes.
    #[error("packet header mismatch: expected {expected:02x?}, found {found:02x?}")]
    PacketHeaderMismatch {
        /// Configured packet header bytes.
        expected: Vec<u8>,
        /// Bytes actually read off the wire.
        found: Vec<u8>,
    },

    /// A message requires a header but none was supplied.
    #[error("header formatter configured but the message carries no header")]
    MissingHeader,

    /// A packed-decimal nibble is not a decimal digit.
    #[error("BCD byte {byte:#04x} contains a non-decimal nibble")]
    NonDigitNibble {
        /// Offending wire byte.
        byte: u8,
    },

    /// A BCD payload contains a byte outside the ASCII digit range.
    #[error("BCD payload byte {byte:#04x} is not an ASCII digit")]
    NonDigitPayload {
        /// Offending payload byte.
        byte: u8,
    },

    /// A hex-encoded value contains a non-hex character.
    #[error("invalid hex wire data: {source}")]
    InvalidHex {
        /// Decoding failure reported by the hex parser.
        #[from]
        source: hex::FromHexError,
    },

    /// Wire text is not valid UTF-8.
    #[error("wire text is not valid UTF-8: {source}")]
    InvalidText {
        /// Underlying UTF-8 decoding failure.
        #[from]
        source: std::string::FromUtf8Error,
    },

    /// The trailer byte after a variable-length value did not match.
    #[error("trailer mismatch: expected {expected:#04x}, found {found:#04x}")]
    TrailerMismatch {
        /// Trailer byte the length manager defines.
        expected: u8,
        /// Byte actually read.
        found: u8,
    },

    /// An announced length includes the announcement, but is shorter than it.
    #[error("announced length {length} shorter than the {tag_len}-byte tag")]
    AnnouncementLength {
        /// Length decoded from the wire.
        length: usize,
        /// Wire length of the announcement tag.
        tag_len: usize,
    },

    /// An announcement redirected to a field that cannot receive a value.
    #[error("announced field {number} is registered as a {kind} field, which cannot be announced")]
    UnannounceableTarget {
        /// Field number the wire announced.
        number: FieldNumber,
        /// Kind of formatter registered at that number.
        kind: &'static str,
    },

    /// Compression or decompression of a field payload failed.
    #[error("compression failure: {source}")]
    Compression {
        /// Underlying stream error.
        source: io::Error,
    },

    /// A nested message's declared length did not contain a whole message.
    #[error("nested message truncated within its {length}-byte envelope")]
    NestedTruncated {
        /// Declared nested payload length.
        length: usize,
    },

    /// A nested message completed without consuming its whole envelope.
    #[error("nested message left {remaining} of its {length} envelope bytes unread")]
    NestedLeftover {
        /// Declared nested payload length.
        length: usize,
        /// Envelope bytes the nested parse did not consume.
        remaining: usize,
    },

    /// Failure while processing one field, preserving the inner cause.
    #[error("can't process field {number}: {source}")]
    Field {
        /// Field number being formatted or parsed.
        number: FieldNumber,
        /// Inner failure.
        #[source]
        source: Box<ProtocolError>,
    },
}

impl ProtocolError {
    /// Wrap this error with the field number being processed.
    ///
    /// Already-wrapped errors are returned unchanged so nested formatters
    /// produce one attribution per message level rather than a tower of
    /// identical frames.
    #[must_use]
    pub fn for_field(self, number: FieldNumber) -> Self {
        match self {
            Self::Field { .. } => self,
            other => Self::Field {
                number,
                source: Box::new(other),
            },
        }
    }

    /// Field number this error is attributed to, if any.
    #[must_use]
    pub fn field_number(&self) -> Option<FieldNumber> {
        match self {
            Self::Field { number, .. } => Some(*number),
            Self::WrongValueKind { number, .. } | Self::NoFormatter { number } => Some(*number),
            _ => None,
        }
    }
}

/// Top-level error type exposed by the codec.
///
/// # Examples
///
/// ```
/// use fieldwire::{CodecError, ProtocolError};
///
/// let err = CodecError::from(ProtocolError::NonDigitLength { byte: 0x41 });
/// assert!(matches!(err, CodecError::Protocol(_)));
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Formatter construction rejected the configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wire data or message content violated the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport-layer I/O failure surfaced through a codec adapter.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Whether the error stems from formatter configuration.
    ///
    /// Configuration errors are expected to surface during integration
    /// testing and are never worth retrying at runtime.
    #[must_use]
    pub fn is_config(&self) -> bool { matches!(self, Self::Config(_)) }
}

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    //! Display formatting and wrapping behaviour for codec errors.

    use super::{CodecError, ConfigError, ProtocolError};
    use crate::message::FieldNumber;

    #[test]
    fn field_wrap_is_idempotent() {
        let inner = ProtocolError::NonDigitLength { byte: 0x41 };
        let wrapped = inner.for_field(FieldNumber::new(2));
        let rewrapped = wrapped.for_field(FieldNumber::new(63));

        assert_eq!(rewrapped.field_number(), Some(FieldNumber::new(2)));
    }

    #[test]
    fn field_error_display_names_the_field() {
        let err = ProtocolError::LengthOutOfRange {
            length: 42,
            min: 1,
            max: 19,
        }
        .for_field(FieldNumber::new(2));

        let rendered = err.to_string();
        assert!(rendered.contains("field 2"), "unexpected display: {rendered}");
        assert!(rendered.contains("42"), "unexpected display: {rendered}");
    }

    #[test]
    fn config_errors_are_flagged() {
        let err = CodecError::from(ConfigError::InvalidLengthBounds { min: 9, max: 3 });
        assert!(err.is_config());

        let err = CodecError::from(ProtocolError::MissingHeader);
        assert!(!err.is_config());
    }

    #[test]
    fn length_bounds_display_is_actionable() {
        let err = ConfigError::LengthCapacityExceeded {
            max: 1000,
            digits: 2,
            capacity: 99,
        };
        assert_eq!(
            err.to_string(),
            "length bound 1000 exceeds 2-digit encoder capacity 99",
        );
    }
}
