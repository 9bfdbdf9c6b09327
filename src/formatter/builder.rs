//! Builder assembling a [`MessageFormatter`] from field registrations.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    ConfigError,
    hooks::{MessageHooks, SharedHooks},
    message::FieldNumber,
    security::SecuritySchema,
};

use super::{field::FieldFormatter, message::MessageFormatter};

/// Builder for [`MessageFormatter`].
///
/// Registrations are validated as they are added, so configuration mistakes
/// surface at the offending call rather than at build time.
///
/// # Examples
///
/// ```
/// use fieldwire::encoding::DataEncoding;
/// use fieldwire::formatter::{FieldFormatter, MessageFormatter};
/// use fieldwire::length::LengthManager;
/// use fieldwire::message::FieldNumber;
///
/// let formatter = MessageFormatter::builder()
///     .field(
///         FieldNumber::new(3),
///         FieldFormatter::text(LengthManager::fixed(6), DataEncoding::PLAIN),
///     )?
///     .build()?;
/// assert!(formatter.formatter(FieldNumber::new(3)).is_some());
/// # Ok::<(), fieldwire::CodecError>(())
/// ```
#[derive(Default)]
pub struct MessageFormatterBuilder {
    formatters: BTreeMap<FieldNumber, FieldFormatter>,
    bitmaps: Vec<FieldNumber>,
    header: Option<FieldFormatter>,
    packet_header: Vec<u8>,
    hooks: Option<SharedHooks>,
    schema: SecuritySchema,
}

impl MessageFormatterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `formatter` for `number`.
    ///
    /// Bitmap formatters are also recorded in registration order; the first
    /// one registered anchors every formatted message.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReservedFieldNumber`] for the header sentinel,
    /// [`ConfigError::DuplicateFormatter`] when `number` is already taken,
    /// and [`ConfigError::LengthCapacityExceeded`] when a self-announcing
    /// formatter's tag cannot carry `number`.
    pub fn field(
        mut self,
        number: FieldNumber,
        formatter: FieldFormatter,
    ) -> Result<Self, ConfigError> {
        if number.is_header() {
            return Err(ConfigError::ReservedFieldNumber { number });
        }
        if self.formatters.contains_key(&number) {
            return Err(ConfigError::DuplicateFormatter { number });
        }
        if let Some(layout) = formatter.announcing_layout() {
            let tag = layout.tag();
            if usize::from(number.get()) > tag.max_value() {
                return Err(ConfigError::LengthCapacityExceeded {
                    max: usize::from(number.get()),
                    digits: tag.digits(),
                    capacity: tag.max_value(),
                });
            }
        }
        if formatter.bitmap_range().is_some() {
            self.bitmaps.push(number);
        }
        self.formatters.insert(number, formatter);
        Ok(self)
    }

    /// Set the header formatter, processed before any numbered field.
    #[must_use]
    pub fn header(mut self, formatter: FieldFormatter) -> Self {
        self.header = Some(formatter);
        self
    }

    /// Literal packet header bytes expected before every message.
    #[must_use]
    pub fn packet_header_text(mut self, text: &str) -> Self {
        self.packet_header = text.as_bytes().to_vec();
        self
    }

    /// Packet header given as hex characters.
    ///
    /// An odd-length string gains a leading zero, so `"F30"` reads as the
    /// bytes `0x0F 0x30`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPacketHeaderHex`] for a non-hex
    /// character.
    pub fn packet_header_hex(mut self, hex_text: &str) -> Result<Self, ConfigError> {
        let padded;
        let normalized = if hex_text.len() % 2 == 1 {
            padded = format!("0{hex_text}");
            padded.as_str()
        } else {
            hex_text
        };
        self.packet_header = hex::decode(normalized)?;
        Ok(self)
    }

    /// Install hooks observing messages on both directions.
    #[must_use]
    pub fn hooks(mut self, hooks: impl MessageHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Install the security schema driving redaction decisions.
    #[must_use]
    pub fn security(mut self, schema: SecuritySchema) -> Self {
        self.schema = schema;
        self
    }

    /// Finish the build.
    ///
    /// # Errors
    ///
    /// Currently never fails; the `Result` keeps room for cross-field
    /// validation without breaking callers.
    pub fn build(self) -> Result<MessageFormatter, ConfigError> {
        Ok(MessageFormatter::from_parts(
            self.formatters,
            self.bitmaps,
            self.header,
            self.packet_header,
            self.hooks,
            self.schema,
        ))
    }
}

impl fmt::Debug for MessageFormatterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFormatterBuilder")
            .field("formatters", &self.formatters)
            .field("bitmaps", &self.bitmaps)
            .field("header", &self.header)
            .field("packet_header", &self.packet_header)
            .field("hooks", &self.hooks.is_some())
            .field("schema", &self.schema)
            .finish()
    }
}
