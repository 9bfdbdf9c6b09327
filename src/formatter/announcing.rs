//! Self-announcing fields: the field's own number travels on the wire.

use bytes::BufMut;

use crate::{
    ProtocolError,
    context::{FormatterContext, ParserContext},
    encoding::DataEncoding,
    length::{LengthEncoder, LengthManager},
    message::FieldNumber,
};

/// Wire layout of a self-announcing field.
///
/// The field number rides as a fixed-digit decimal tag between the length
/// prefix and the value: `[length][tag][value]`. With `tag_in_length` set the
/// prefix counts the tag's wire bytes as well as the value payload; without
/// it the prefix counts the payload alone. One announcing layout registered
/// at several numbers lets the wire decide which of them actually arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnouncingFormatter {
    manager: LengthManager,
    tag: LengthEncoder,
    tag_in_length: bool,
    encoding: DataEncoding,
    binary: bool,
}

/// A resolved announcement: the wire-declared number and value length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Announcement {
    pub(crate) number: FieldNumber,
    pub(crate) value_len: usize,
}

impl AnnouncingFormatter {
    pub(crate) const fn new(
        manager: LengthManager,
        tag: LengthEncoder,
        tag_in_length: bool,
        encoding: DataEncoding,
        binary: bool,
    ) -> Self {
        Self {
            manager,
            tag,
            tag_in_length,
            encoding,
            binary,
        }
    }

    /// The envelope's length manager.
    #[must_use]
    pub const fn manager(&self) -> &LengthManager { &self.manager }

    /// The tag codec.
    #[must_use]
    pub const fn tag(&self) -> LengthEncoder { self.tag }

    /// Whether the prefix counts the tag's wire bytes.
    #[must_use]
    pub const fn tag_in_length(&self) -> bool { self.tag_in_length }

    /// The value's data encoding.
    #[must_use]
    pub const fn encoding(&self) -> DataEncoding { self.encoding }

    /// Whether the value decodes to a binary field rather than text.
    #[must_use]
    pub const fn is_binary(&self) -> bool { self.binary }

    /// Resolve the announcement, consuming the prefix and tag exactly once.
    ///
    /// The decoded value length and announced number are cached in the
    /// context, so a parse suspended after either read resumes without
    /// re-consuming wire bytes.
    pub(crate) fn resolve(
        &self,
        ctx: &mut ParserContext,
    ) -> Result<Option<Announcement>, ProtocolError> {
        let value_len = match ctx.decoded_length() {
            Some(len) => len,
            None => {
                let prefix = self.manager.prefix_len();
                let Some(wire) = ctx.peek(prefix) else {
                    return Ok(None);
                };
                let declared = self.manager.read_length(wire)?;
                let value_len = if self.tag_in_length {
                    let tag_len = self.tag.wire_len();
                    declared
                        .checked_sub(tag_len)
                        .ok_or(ProtocolError::AnnouncementLength {
                            length: declared,
                            tag_len,
                        })?
                } else {
                    declared
                };
                ctx.advance(prefix);
                ctx.set_decoded_length(value_len);
                value_len
            }
        };

        let number = match ctx.announced() {
            Some(number) => number,
            None => {
                let tag_bytes = self.tag.wire_len();
                let Some(wire) = ctx.peek(tag_bytes) else {
                    return Ok(None);
                };
                let tag_value = self.tag.read_len(wire)?;
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "tag capacity tops out at four decimal digits"
                )]
                let number = FieldNumber::new(tag_value as u16);
                ctx.advance(tag_bytes);
                ctx.set_announced(number);
                number
            }
        };

        Ok(Some(Announcement { number, value_len }))
    }

    /// Write the prefix, tag, and encoded payload for `number`.
    pub(crate) fn format(
        &self,
        number: FieldNumber,
        payload: &[u8],
        ctx: &mut FormatterContext,
        redact: bool,
    ) -> Result<(), ProtocolError> {
        let tag_len = if self.tag_in_length {
            self.tag.wire_len()
        } else {
            0
        };
        self.manager
            .write_length(payload.len() + tag_len, ctx.buffer_mut())?;
        self.tag
            .write_len(usize::from(number.get()), ctx.buffer_mut());
        let start = ctx.len();
        self.encoding.encode(payload, ctx.buffer_mut())?;
        if redact {
            ctx.record_redacted(start..ctx.len());
        }
        if let Some(trailer) = self.manager.trailer() {
            ctx.buffer_mut().put_u8(trailer);
        }
        Ok(())
    }
}
