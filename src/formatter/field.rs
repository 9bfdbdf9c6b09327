//! Per-field wire codecs combining a length manager with a data encoding.

use std::io::Write;

use bytes::BufMut;
use flate2::write::{DeflateDecoder, DeflateEncoder, GzDecoder, GzEncoder};

use crate::{
    ConfigError, ProtocolError,
    context::{FormatterContext, ParserContext},
    encoding::DataEncoding,
    length::{LengthEncoder, LengthManager},
    message::{Bitmap, Field, FieldNumber},
};

use super::{announcing::AnnouncingFormatter, message::MessageFormatter, padding::Padding};

/// Compression applied to a field's payload before data encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Raw DEFLATE stream.
    Deflate,
    /// DEFLATE in a gzip wrapper with header and checksum.
    Gzip,
}

impl Compression {
    fn compress(self, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let level = flate2::Compression::default();
        match self {
            Self::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), level);
                encoder.write_all(payload).map_err(stream_error)?;
                encoder.finish().map_err(stream_error)
            }
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(payload).map_err(stream_error)?;
                encoder.finish().map_err(stream_error)
            }
        }
    }

    fn decompress(self, wire: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Deflate => {
                let mut decoder = DeflateDecoder::new(Vec::new());
                decoder.write_all(wire).map_err(stream_error)?;
                decoder.finish().map_err(stream_error)
            }
            Self::Gzip => {
                let mut decoder = GzDecoder::new(Vec::new());
                decoder.write_all(wire).map_err(stream_error)?;
                decoder.finish().map_err(stream_error)
            }
        }
    }
}

fn stream_error(source: std::io::Error) -> ProtocolError {
    ProtocolError::Compression { source }
}

/// Read a field's payload length, consuming the prefix exactly once.
///
/// The decoded value is cached in the context, so a parse suspended between
/// the prefix and the value resumes without re-reading wire bytes. Fixed
/// managers consume nothing and always succeed.
pub(super) fn read_payload_len(
    ctx: &mut ParserContext,
    manager: &LengthManager,
) -> Result<Option<usize>, ProtocolError> {
    if let Some(length) = ctx.decoded_length() {
        return Ok(Some(length));
    }
    let prefix = manager.prefix_len();
    let Some(wire) = ctx.peek(prefix) else {
        return Ok(None);
    };
    let length = manager.read_length(wire)?;
    ctx.advance(prefix);
    ctx.set_decoded_length(length);
    Ok(Some(length))
}

/// Consume a value's wire bytes and optional trailer as one unit.
///
/// The value and trailer are taken together so a suspension between them
/// cannot consume the value twice. On success the cached decoded length is
/// cleared for the next field.
pub(super) fn consume_value(
    ctx: &mut ParserContext,
    encoding: DataEncoding,
    payload_len: usize,
    trailer: Option<u8>,
    redact: bool,
) -> Result<Option<Vec<u8>>, ProtocolError> {
    let wire_len = encoding.encoded_len(payload_len);
    let required = wire_len + usize::from(trailer.is_some());
    let Some(wire) = ctx.peek(required) else {
        return Ok(None);
    };
    let payload = encoding.decode(&wire[..wire_len], payload_len)?;
    if let Some(expected) = trailer {
        let found = wire[wire_len];
        if found != expected {
            return Err(ProtocolError::TrailerMismatch { expected, found });
        }
    }
    if redact {
        let start = ctx.position();
        ctx.record_redacted(start..start + wire_len);
    }
    ctx.advance(required);
    ctx.reset_decoded_length();
    Ok(Some(payload))
}

#[derive(Clone, Debug)]
enum FormatterKind {
    Text {
        manager: LengthManager,
        encoding: DataEncoding,
        padding: Option<Padding>,
    },
    Binary {
        manager: LengthManager,
        encoding: DataEncoding,
    },
    Bitmap {
        lower: FieldNumber,
        upper: FieldNumber,
        encoding: DataEncoding,
    },
    Nested {
        manager: LengthManager,
        inner: Box<MessageFormatter>,
    },
    Announcing(AnnouncingFormatter),
    Compressed {
        manager: LengthManager,
        encoding: DataEncoding,
        algorithm: Compression,
        binary: bool,
    },
}

/// Wire codec for a single numbered field.
///
/// A formatter is configuration only and holds no per-message state; one
/// value serves every message processed through its table. Formatters do not
/// know their own number: the registry assigns numbers at registration, and
/// self-announcing fields read theirs off the wire.
#[derive(Clone, Debug)]
pub struct FieldFormatter {
    kind: FormatterKind,
}

impl FieldFormatter {
    /// Text field with `manager` bounds and `encoding` on the wire.
    #[must_use]
    pub const fn text(manager: LengthManager, encoding: DataEncoding) -> Self {
        Self {
            kind: FormatterKind::Text {
                manager,
                encoding,
                padding: None,
            },
        }
    }

    /// Text field padded before encoding and stripped after decoding.
    ///
    /// Values are padded up to the fixed length, or to the minimum bound for
    /// a variable manager; values already long enough pass through untouched.
    #[must_use]
    pub const fn padded_text(
        manager: LengthManager,
        encoding: DataEncoding,
        padding: Padding,
    ) -> Self {
        Self {
            kind: FormatterKind::Text {
                manager,
                encoding,
                padding: Some(padding),
            },
        }
    }

    /// Binary field.
    #[must_use]
    pub const fn binary(manager: LengthManager, encoding: DataEncoding) -> Self {
        Self {
            kind: FormatterKind::Binary { manager, encoding },
        }
    }

    /// Bitmap field declaring presence for `lower..=upper`.
    ///
    /// Bitmap fields carry no length prefix; their wire size follows from the
    /// covered range and the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBitmapRange`] for an inverted range,
    /// [`ConfigError::ReservedFieldNumber`] when the range reaches the header
    /// sentinel, and [`ConfigError::BitmapEncoding`] for a BCD encoding,
    /// which cannot carry arbitrary bitmap bytes.
    pub const fn bitmap(
        lower: FieldNumber,
        upper: FieldNumber,
        encoding: DataEncoding,
    ) -> Result<Self, ConfigError> {
        if lower.get() > upper.get() {
            return Err(ConfigError::InvalidBitmapRange { lower, upper });
        }
        if upper.is_header() {
            return Err(ConfigError::ReservedFieldNumber { number: upper });
        }
        if matches!(encoding, DataEncoding::Bcd(_)) {
            return Err(ConfigError::BitmapEncoding);
        }
        Ok(Self {
            kind: FormatterKind::Bitmap {
                lower,
                upper,
                encoding,
            },
        })
    }

    /// Nested-message field: the inner table's wire image as the payload.
    #[must_use]
    pub fn nested(manager: LengthManager, inner: MessageFormatter) -> Self {
        Self {
            kind: FormatterKind::Nested {
                manager,
                inner: Box::new(inner),
            },
        }
    }

    /// Self-announcing text field carrying its number as a `tag`-digit
    /// decimal between the length prefix and the value.
    ///
    /// With `tag_in_length` the prefix counts the tag's wire bytes as part of
    /// the declared length.
    #[must_use]
    pub const fn announcing(
        manager: LengthManager,
        tag: LengthEncoder,
        tag_in_length: bool,
        encoding: DataEncoding,
    ) -> Self {
        Self {
            kind: FormatterKind::Announcing(AnnouncingFormatter::new(
                manager,
                tag,
                tag_in_length,
                encoding,
                false,
            )),
        }
    }

    /// Self-announcing binary field.
    #[must_use]
    pub const fn announcing_binary(
        manager: LengthManager,
        tag: LengthEncoder,
        tag_in_length: bool,
        encoding: DataEncoding,
    ) -> Self {
        Self {
            kind: FormatterKind::Announcing(AnnouncingFormatter::new(
                manager,
                tag,
                tag_in_length,
                encoding,
                true,
            )),
        }
    }

    /// Text field whose payload is compressed before hitting the wire.
    ///
    /// The length prefix counts the compressed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CompressedEncoding`] for a BCD encoding;
    /// compressed bytes are opaque and rarely decimal.
    pub const fn compressed_text(
        manager: LengthManager,
        encoding: DataEncoding,
        algorithm: Compression,
    ) -> Result<Self, ConfigError> {
        Self::compressed(manager, encoding, algorithm, false)
    }

    /// Binary field whose payload is compressed before hitting the wire.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FieldFormatter::compressed_text`].
    pub const fn compressed_binary(
        manager: LengthManager,
        encoding: DataEncoding,
        algorithm: Compression,
    ) -> Result<Self, ConfigError> {
        Self::compressed(manager, encoding, algorithm, true)
    }

    const fn compressed(
        manager: LengthManager,
        encoding: DataEncoding,
        algorithm: Compression,
        binary: bool,
    ) -> Result<Self, ConfigError> {
        if matches!(encoding, DataEncoding::Bcd(_)) {
            return Err(ConfigError::CompressedEncoding);
        }
        Ok(Self {
            kind: FormatterKind::Compressed {
                manager,
                encoding,
                algorithm,
                binary,
            },
        })
    }

    /// Bitmap coverage, when this formats a bitmap field.
    #[must_use]
    pub fn bitmap_range(&self) -> Option<(FieldNumber, FieldNumber)> {
        match &self.kind {
            FormatterKind::Bitmap { lower, upper, .. } => Some((*lower, *upper)),
            _ => None,
        }
    }

    /// The announcing layout, when this is a self-announcing field.
    pub(crate) const fn announcing_layout(&self) -> Option<&AnnouncingFormatter> {
        match &self.kind {
            FormatterKind::Announcing(layout) => Some(layout),
            _ => None,
        }
    }

    /// Value encoding and binary flag used when another field's announcement
    /// redirects here. `None` for kinds that cannot receive an announcement.
    pub(crate) fn announced_value(&self) -> Option<(DataEncoding, bool)> {
        match &self.kind {
            FormatterKind::Text { encoding, .. } => Some((*encoding, false)),
            FormatterKind::Binary { encoding, .. } => Some((*encoding, true)),
            FormatterKind::Announcing(layout) => Some((layout.encoding(), layout.is_binary())),
            _ => None,
        }
    }

    pub(crate) const fn kind_name(&self) -> &'static str {
        match &self.kind {
            FormatterKind::Text { .. } => "text",
            FormatterKind::Binary { .. } => "binary",
            FormatterKind::Bitmap { .. } => "bitmap",
            FormatterKind::Nested { .. } => "nested message",
            FormatterKind::Announcing(_) => "announcing",
            FormatterKind::Compressed { .. } => "compressed",
        }
    }

    /// Append `field`'s wire form to the context.
    ///
    /// `redact` records the value's wire bytes as sensitive so diagnostics
    /// can mask them; prefixes, tags, and trailers stay visible.
    pub(crate) fn format(
        &self,
        field: &Field,
        ctx: &mut FormatterContext,
        redact: bool,
    ) -> Result<(), ProtocolError> {
        match &self.kind {
            FormatterKind::Text {
                manager,
                encoding,
                padding,
            } => {
                let text = field
                    .as_text()
                    .ok_or_else(|| wrong_kind(field, "text"))?;
                let padded = padding.map(|p| p.pad(text, pad_target(manager)));
                let payload = padded.as_deref().unwrap_or(text);
                write_value(manager, *encoding, payload.as_bytes(), ctx, redact)
            }
            FormatterKind::Binary { manager, encoding } => {
                let payload = field
                    .as_binary()
                    .ok_or_else(|| wrong_kind(field, "binary"))?;
                write_value(manager, *encoding, payload, ctx, redact)
            }
            FormatterKind::Bitmap { encoding, .. } => {
                let bitmap = field
                    .bitmap()
                    .ok_or_else(|| wrong_kind(field, "bitmap"))?;
                let start = ctx.len();
                encoding.encode(bitmap.as_bytes(), ctx.buffer_mut())?;
                if redact {
                    ctx.record_redacted(start..ctx.len());
                }
                Ok(())
            }
            FormatterKind::Nested { manager, inner } => {
                let nested = field
                    .as_nested()
                    .ok_or_else(|| wrong_kind(field, "nested message"))?;
                let mut temp = FormatterContext::new();
                inner
                    .format_protocol(nested, &mut temp)
                    .map_err(|source| ProtocolError::Field {
                        number: field.number(),
                        source: Box::new(source),
                    })?;
                let inner_ranges = temp.redacted_ranges().to_vec();
                manager.write_length(temp.len(), ctx.buffer_mut())?;
                let start = ctx.len();
                let image = temp.take();
                ctx.buffer_mut().extend_from_slice(&image);
                if redact {
                    ctx.record_redacted(start..ctx.len());
                } else {
                    for range in inner_ranges {
                        ctx.record_redacted(start + range.start..start + range.end);
                    }
                }
                if let Some(trailer) = manager.trailer() {
                    ctx.buffer_mut().put_u8(trailer);
                }
                Ok(())
            }
            FormatterKind::Announcing(layout) => {
                let payload = if layout.is_binary() {
                    field
                        .as_binary()
                        .ok_or_else(|| wrong_kind(field, "binary"))?
                } else {
                    field
                        .as_text()
                        .ok_or_else(|| wrong_kind(field, "text"))?
                        .as_bytes()
                };
                layout.format(field.number(), payload, ctx, redact)
            }
            FormatterKind::Compressed {
                manager,
                encoding,
                algorithm,
                binary,
            } => {
                let payload = if *binary {
                    field
                        .as_binary()
                        .ok_or_else(|| wrong_kind(field, "binary"))?
                } else {
                    field
                        .as_text()
                        .ok_or_else(|| wrong_kind(field, "text"))?
                        .as_bytes()
                };
                let compressed = algorithm.compress(payload)?;
                write_value(manager, *encoding, &compressed, ctx, redact)
            }
        }
    }

    /// Parse one field of this kind at `number` from the context.
    ///
    /// Returns `Ok(None)` when the buffered bytes do not yet hold the whole
    /// field; the caller feeds more data and drives the parse again.
    /// Self-announcing fields return the wire-declared number rather than
    /// `number`.
    pub(crate) fn parse(
        &self,
        number: FieldNumber,
        ctx: &mut ParserContext,
        redact: bool,
    ) -> Result<Option<Field>, ProtocolError> {
        match &self.kind {
            FormatterKind::Text {
                manager,
                encoding,
                padding,
            } => {
                let Some(len) = read_payload_len(ctx, manager)? else {
                    return Ok(None);
                };
                let Some(payload) =
                    consume_value(ctx, *encoding, len, manager.trailer(), redact)?
                else {
                    return Ok(None);
                };
                let text = String::from_utf8(payload)?;
                let text = match padding {
                    Some(padding) => padding.strip(&text),
                    None => text,
                };
                Ok(Some(Field::text(number, text)))
            }
            FormatterKind::Binary { manager, encoding } => {
                let Some(len) = read_payload_len(ctx, manager)? else {
                    return Ok(None);
                };
                let Some(payload) =
                    consume_value(ctx, *encoding, len, manager.trailer(), redact)?
                else {
                    return Ok(None);
                };
                Ok(Some(Field::binary(number, payload)))
            }
            FormatterKind::Bitmap {
                lower,
                upper,
                encoding,
            } => {
                let payload_len = crate::message::bitmap::byte_len(*lower, *upper);
                let Some(payload) = consume_value(ctx, *encoding, payload_len, None, redact)?
                else {
                    return Ok(None);
                };
                let bitmap = Bitmap::from_wire(*lower, *upper, &payload);
                Ok(Some(Field::new(number, bitmap)))
            }
            FormatterKind::Nested { manager, inner } => {
                let Some(len) = read_payload_len(ctx, manager)? else {
                    return Ok(None);
                };
                let trailer = manager.trailer();
                let required = len + usize::from(trailer.is_some());
                let Some(wire) = ctx.peek(required) else {
                    return Ok(None);
                };
                let mut child = ParserContext::new();
                child.feed(&wire[..len]);
                if let Some(expected) = trailer {
                    let found = wire[len];
                    if found != expected {
                        return Err(ProtocolError::TrailerMismatch { expected, found });
                    }
                }
                let wrap = |source: ProtocolError| ProtocolError::Field {
                    number,
                    source: Box::new(source),
                };
                let message = inner
                    .parse_protocol(&mut child)
                    .map_err(wrap)?
                    .ok_or(ProtocolError::NestedTruncated { length: len })?;
                if !child.is_empty() {
                    return Err(ProtocolError::NestedLeftover {
                        length: len,
                        remaining: child.buffered(),
                    });
                }
                let value_start = ctx.position();
                if redact {
                    ctx.record_redacted(value_start..value_start + len);
                } else {
                    for range in child.redacted_ranges().to_vec() {
                        ctx.record_redacted(value_start + range.start..value_start + range.end);
                    }
                }
                ctx.advance(required);
                ctx.reset_decoded_length();
                Ok(Some(Field::nested(number, message)))
            }
            FormatterKind::Announcing(layout) => {
                let Some(announcement) = layout.resolve(ctx)? else {
                    return Ok(None);
                };
                let Some(payload) = consume_value(
                    ctx,
                    layout.encoding(),
                    announcement.value_len,
                    layout.manager().trailer(),
                    redact,
                )?
                else {
                    return Ok(None);
                };
                ctx.clear_announced();
                let field = if layout.is_binary() {
                    Field::binary(announcement.number, payload)
                } else {
                    Field::text(announcement.number, String::from_utf8(payload)?)
                };
                Ok(Some(field))
            }
            FormatterKind::Compressed {
                manager,
                encoding,
                algorithm,
                binary,
            } => {
                let Some(len) = read_payload_len(ctx, manager)? else {
                    return Ok(None);
                };
                let Some(payload) =
                    consume_value(ctx, *encoding, len, manager.trailer(), redact)?
                else {
                    return Ok(None);
                };
                let expanded = algorithm.decompress(&payload)?;
                if *binary {
                    Ok(Some(Field::binary(number, expanded)))
                } else {
                    Ok(Some(Field::text(number, String::from_utf8(expanded)?)))
                }
            }
        }
    }
}

fn write_value(
    manager: &LengthManager,
    encoding: DataEncoding,
    payload: &[u8],
    ctx: &mut FormatterContext,
    redact: bool,
) -> Result<(), ProtocolError> {
    manager.write_length(payload.len(), ctx.buffer_mut())?;
    let start = ctx.len();
    encoding.encode(payload, ctx.buffer_mut())?;
    if redact {
        ctx.record_redacted(start..ctx.len());
    }
    if let Some(trailer) = manager.trailer() {
        ctx.buffer_mut().put_u8(trailer);
    }
    Ok(())
}

fn wrong_kind(field: &Field, expected: &'static str) -> ProtocolError {
    ProtocolError::WrongValueKind {
        number: field.number(),
        expected,
        found: field.value().kind(),
    }
}

const fn pad_target(manager: &LengthManager) -> usize {
    match manager {
        LengthManager::Fixed { length } => *length,
        LengthManager::Variable { min, .. } => *min,
    }
}
