//! `tokio_util` codec adapter for framed transports.
//!
//! [`MessageCodec`] wraps a [`MessageFormatter`] and a [`ParserContext`] so a
//! field table can drive `tokio_util::codec::Framed` directly. The decoder
//! side drains the read buffer into the parser context and surfaces whole
//! messages; partial messages stay suspended in the context between reads.
//!
//! # Error Handling
//!
//! Malformed wire data surfaces as [`CodecError::Protocol`]. A connection
//! that closes mid-message surfaces as [`CodecError::Io`] with
//! [`io::ErrorKind::UnexpectedEof`]; a close at a message boundary is clean.

use std::{io, sync::Arc};

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    CodecError,
    context::{FormatterContext, ParsePhase, ParserContext},
    formatter::MessageFormatter,
    message::Message,
    security::redacted_hex_dump,
};

/// Framed-transport adapter around a field table.
///
/// Cheap to construct per connection: the formatter is shared behind an
/// [`Arc`] and only the parser context is per-connection state.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use fieldwire::{
///     MessageCodec,
///     encoding::DataEncoding,
///     formatter::{FieldFormatter, MessageFormatter},
///     length::LengthManager,
///     message::{FieldNumber, Message},
/// };
/// use tokio_util::codec::{Decoder, Encoder};
///
/// # fn main() -> fieldwire::Result<()> {
/// let table = MessageFormatter::builder()
///     .field(
///         FieldNumber::new(2),
///         FieldFormatter::text(LengthManager::fixed(2), DataEncoding::PLAIN),
///     )?
///     .build()?;
/// let mut codec = MessageCodec::from_table(table);
///
/// let mut message = Message::new();
/// message.set_text(FieldNumber::new(2), "42");
///
/// let mut wire = BytesMut::new();
/// codec.encode(message, &mut wire)?;
/// let decoded = codec.decode(&mut wire)?.expect("complete message");
/// assert_eq!(decoded.text(FieldNumber::new(2)), Some("42"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MessageCodec {
    formatter: Arc<MessageFormatter>,
    parser: ParserContext,
}

impl MessageCodec {
    /// Adapter over a shared formatter.
    #[must_use]
    pub fn new(formatter: Arc<MessageFormatter>) -> Self {
        Self {
            formatter,
            parser: ParserContext::new(),
        }
    }

    /// Adapter that takes sole ownership of `formatter`.
    #[must_use]
    pub fn from_table(formatter: MessageFormatter) -> Self { Self::new(Arc::new(formatter)) }

    /// The field table this adapter formats and parses with.
    #[must_use]
    pub fn formatter(&self) -> &MessageFormatter { &self.formatter }

    /// The parser context, for inspecting suspended state and redacted
    /// ranges of the message in flight.
    #[must_use]
    pub fn context(&self) -> &ParserContext { &self.parser }

    fn eof_error(&self) -> CodecError {
        CodecError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "stream ended mid-message: {} bytes buffered, resume phase {:?}",
                self.parser.buffered(),
                self.parser.phase(),
            ),
        ))
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            let chunk = src.split();
            self.parser.feed(&chunk);
        }
        self.formatter.parse(&mut self.parser)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        // An empty buffer alone is not a message boundary: a consumed length
        // prefix leaves the buffer empty while the parse phase still points
        // mid-field. Clean close requires the phase to be back at the start.
        if self.parser.is_empty() && matches!(self.parser.phase(), ParsePhase::PacketHeader) {
            return Ok(None);
        }
        tracing::debug!(
            buffered = self.parser.buffered(),
            phase = ?self.parser.phase(),
            "stream ended mid-message"
        );
        Err(self.eof_error())
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut ctx = FormatterContext::new();
        self.formatter.format(&message, &mut ctx)?;
        tracing::trace!(
            bytes = ctx.len(),
            wire = %redacted_hex_dump(ctx.bytes(), ctx.redacted_ranges()),
            "encoded message"
        );
        dst.extend_from_slice(&ctx.take());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Decoder and encoder behaviour over in-memory buffers, including EOF
    //! handling at and away from message boundaries.

    use super::*;
    use crate::{
        encoding::DataEncoding,
        formatter::FieldFormatter,
        length::{LengthEncoder, LengthManager},
        message::FieldNumber,
    };

    fn n(value: u16) -> FieldNumber { FieldNumber::new(value) }

    fn table() -> MessageFormatter {
        MessageFormatter::builder()
            .packet_header_text("ISO")
            .field(
                n(2),
                FieldFormatter::text(
                    LengthManager::variable(1, 19, LengthEncoder::ASCII_LL).expect("bounds fit"),
                    DataEncoding::PLAIN,
                ),
            )
            .expect("fresh number")
            .build()
            .expect("valid table")
    }

    fn sample() -> Message {
        let mut message = Message::new();
        message.set_text(n(2), "99");
        message
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = MessageCodec::from_table(table());

        let mut wire = BytesMut::new();
        codec.encode(sample(), &mut wire).expect("encodes");
        assert_eq!(&wire[..], b"ISO0299");

        let decoded = codec
            .decode(&mut wire)
            .expect("well formed")
            .expect("complete");
        assert_eq!(decoded.text(n(2)), Some("99"));
        assert!(wire.is_empty(), "decode drains the read buffer");
    }

    #[test]
    fn decode_suspends_across_reads() {
        let mut codec = MessageCodec::from_table(table());

        let mut wire = BytesMut::from(&b"ISO02"[..]);
        assert!(codec.decode(&mut wire).expect("partial input").is_none());
        assert!(wire.is_empty(), "partial bytes move into the context");

        wire.extend_from_slice(b"99");
        let decoded = codec
            .decode(&mut wire)
            .expect("well formed")
            .expect("complete");
        assert_eq!(decoded.text(n(2)), Some("99"));
    }

    #[test]
    fn back_to_back_messages_decode_in_turn() {
        let mut codec = MessageCodec::from_table(table());

        let mut wire = BytesMut::from(&b"ISO0299ISO0155"[..]);
        let first = codec.decode(&mut wire).expect("first").expect("complete");
        let second = codec.decode(&mut wire).expect("second").expect("complete");
        assert_eq!(first.text(n(2)), Some("99"));
        assert_eq!(second.text(n(2)), Some("5"));
        assert!(codec.decode(&mut wire).expect("drained").is_none());
    }

    #[test]
    fn eof_at_a_message_boundary_is_clean() {
        let mut codec = MessageCodec::from_table(table());

        let mut wire = BytesMut::from(&b"ISO0299"[..]);
        assert!(codec.decode_eof(&mut wire).expect("complete").is_some());
        assert!(codec.decode_eof(&mut wire).expect("clean close").is_none());
    }

    #[test]
    fn eof_mid_message_is_an_error() {
        let mut codec = MessageCodec::from_table(table());

        let mut wire = BytesMut::from(&b"ISO02"[..]);
        let err = codec.decode_eof(&mut wire).expect_err("mid-message close");
        assert!(
            matches!(&err, CodecError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn eof_with_only_a_consumed_prefix_is_still_an_error() {
        let mut codec = MessageCodec::from_table(table());

        // The prefix is consumed into the decoded-length cache, leaving the
        // buffer empty while the message is still incomplete.
        let mut wire = BytesMut::from(&b"ISO02"[..]);
        assert!(codec.decode(&mut wire).expect("partial input").is_none());
        assert!(codec.context().is_empty());

        let err = codec.decode_eof(&mut wire).expect_err("mid-message close");
        assert!(
            matches!(&err, CodecError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof),
            "unexpected error: {err:?}"
        );
    }
}
