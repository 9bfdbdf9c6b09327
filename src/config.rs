//! Serde-loadable field table descriptions.
//!
//! A [`TableSpec`] is the data form of a message formatter: applications keep
//! field tables in configuration files and build the runtime formatter at
//! startup with [`TableSpec::build`]. The types here deserialize from any
//! serde format; the tests use TOML.
//!
//! Every structural rule the builder API enforces applies equally to loaded
//! tables: invalid bounds, duplicate numbers, and reserved numbers surface as
//! [`ConfigError`] from `build`, never as panics.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    encoding::{DataEncoding, PadSide},
    formatter::{Compression, FieldFormatter, MessageFormatter, Padding},
    length::{LengthEncoder, LengthManager},
    message::FieldNumber,
    security::{Obfuscation, SecuritySchema},
};

/// Declarative form of a whole field table.
///
/// # Examples
///
/// ```
/// use fieldwire::{
///     config::TableSpec,
///     context::FormatterContext,
///     message::{FieldNumber, Message},
/// };
///
/// # fn main() -> fieldwire::Result<()> {
/// let spec: TableSpec = toml::from_str(
///     r#"
///     packet_header = { text = "ISO" }
///
///     [[fields]]
///     number = 2
///     kind = "text"
///     length = { kind = "variable", min = 1, max = 19, prefix = { digits = 2 } }
///     "#,
/// )
/// .expect("well-formed TOML");
/// let formatter = spec.build()?;
///
/// let mut message = Message::new();
/// message.set_text(FieldNumber::new(2), "42");
/// let mut ctx = FormatterContext::new();
/// formatter.format(&message, &mut ctx)?;
/// assert_eq!(ctx.bytes(), b"ISO0242");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSpec {
    /// Fixed bytes expected in front of every message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_header: Option<PacketHeaderSpec>,
    /// Formatter for the message header, when the format carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<FieldSpec>,
    /// Numbered field entries, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldEntry>,
    /// Sensitive-field declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityEntry>,
}

impl TableSpec {
    /// Build the runtime formatter this spec describes.
    ///
    /// # Errors
    ///
    /// Returns the same [`ConfigError`] values the builder API raises for
    /// invalid bounds, duplicate or reserved numbers, and encoding rules.
    pub fn build(&self) -> Result<MessageFormatter, ConfigError> {
        let mut builder = MessageFormatter::builder();
        if let Some(packet) = &self.packet_header {
            builder = match packet {
                PacketHeaderSpec::Text(text) => builder.packet_header_text(text),
                PacketHeaderSpec::Hex(hex_text) => builder.packet_header_hex(hex_text)?,
            };
        }
        if let Some(header) = &self.header {
            builder = builder.header(header.build()?);
        }
        for entry in &self.fields {
            builder = builder.field(FieldNumber::new(entry.number), entry.spec.build()?)?;
        }
        if !self.security.is_empty() {
            let mut schema = SecuritySchema::new();
            for entry in &self.security {
                schema = match entry.strategy {
                    Some(strategy) => {
                        schema.obfuscated(FieldNumber::new(entry.number), strategy.build())
                    }
                    None => schema.sensitive(FieldNumber::new(entry.number)),
                };
            }
            builder = builder.security(schema);
        }
        builder.build()
    }
}

/// Leading packet header bytes, given as text or as hex digits.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketHeaderSpec {
    /// Header bytes spelled as literal text.
    Text(String),
    /// Header bytes spelled as hex digits; odd counts gain a leading zero.
    Hex(String),
}

/// One numbered field in the table.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FieldEntry {
    /// Field number the formatter registers under.
    pub number: u16,
    /// The formatter itself.
    #[serde(flatten)]
    pub spec: FieldSpec,
}

/// Declarative form of a single field formatter.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Text field, optionally padded to its expected width.
    Text {
        /// Length layout.
        length: LengthSpec,
        /// Wire encoding; plain bytes when omitted.
        #[serde(default)]
        encoding: EncodingSpec,
        /// Pad-and-strip rule applied around encoding.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        padding: Option<PaddingSpec>,
    },
    /// Raw byte field.
    Binary {
        /// Length layout.
        length: LengthSpec,
        /// Wire encoding; plain bytes when omitted.
        #[serde(default)]
        encoding: EncodingSpec,
    },
    /// Presence bitmap covering `lower..=upper`.
    Bitmap {
        /// First field number the bitmap covers.
        lower: u16,
        /// Last field number the bitmap covers.
        upper: u16,
        /// Wire encoding; plain bytes when omitted. BCD is rejected.
        #[serde(default)]
        encoding: EncodingSpec,
    },
    /// Field whose payload is a complete inner message.
    Nested {
        /// Length layout of the envelope.
        length: LengthSpec,
        /// Field table of the inner message.
        table: Box<TableSpec>,
    },
    /// Field that announces its own number on the wire.
    Announcing {
        /// Length layout.
        length: LengthSpec,
        /// Digit layout of the number announcement.
        tag: PrefixSpec,
        /// Whether the length prefix counts the tag bytes.
        #[serde(default)]
        tag_in_length: bool,
        /// Wire encoding of the value; plain bytes when omitted.
        #[serde(default)]
        encoding: EncodingSpec,
        /// Whether values are binary rather than text.
        #[serde(default)]
        binary: bool,
    },
    /// Field whose payload is compressed before hitting the wire.
    Compressed {
        /// Length layout; the prefix counts compressed bytes.
        length: LengthSpec,
        /// Compression algorithm.
        algorithm: CompressionSpec,
        /// Wire encoding of the compressed bytes. BCD is rejected.
        #[serde(default)]
        encoding: EncodingSpec,
        /// Whether values are binary rather than text.
        #[serde(default)]
        binary: bool,
    },
}

impl FieldSpec {
    /// Build the runtime formatter for this entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the entry violates a structural rule,
    /// such as inverted bounds or a BCD-encoded bitmap.
    pub fn build(&self) -> Result<FieldFormatter, ConfigError> {
        match self {
            Self::Text {
                length,
                encoding,
                padding,
            } => {
                let manager = length.build()?;
                Ok(match padding {
                    Some(padding) => {
                        FieldFormatter::padded_text(manager, encoding.build(), padding.build())
                    }
                    None => FieldFormatter::text(manager, encoding.build()),
                })
            }
            Self::Binary { length, encoding } => {
                Ok(FieldFormatter::binary(length.build()?, encoding.build()))
            }
            Self::Bitmap {
                lower,
                upper,
                encoding,
            } => FieldFormatter::bitmap(
                FieldNumber::new(*lower),
                FieldNumber::new(*upper),
                encoding.build(),
            ),
            Self::Nested { length, table } => {
                Ok(FieldFormatter::nested(length.build()?, table.build()?))
            }
            Self::Announcing {
                length,
                tag,
                tag_in_length,
                encoding,
                binary,
            } => {
                let manager = length.build()?;
                let tag = tag.build()?;
                Ok(if *binary {
                    FieldFormatter::announcing_binary(manager, tag, *tag_in_length, encoding.build())
                } else {
                    FieldFormatter::announcing(manager, tag, *tag_in_length, encoding.build())
                })
            }
            Self::Compressed {
                length,
                algorithm,
                encoding,
                binary,
            } => {
                let manager = length.build()?;
                if *binary {
                    FieldFormatter::compressed_binary(manager, encoding.build(), algorithm.build())
                } else {
                    FieldFormatter::compressed_text(manager, encoding.build(), algorithm.build())
                }
            }
        }
    }
}

/// Length layout: fixed width or a bounded variable length with a prefix.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LengthSpec {
    /// Exactly `length` payload units.
    Fixed {
        /// Payload length in pre-encoding units.
        length: usize,
    },
    /// `min..=max` payload units, declared by a wire prefix.
    Variable {
        /// Smallest accepted payload length.
        min: usize,
        /// Largest accepted payload length.
        max: usize,
        /// Digit layout of the length prefix.
        prefix: PrefixSpec,
        /// Byte expected after the value, when the format uses one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trailer: Option<u8>,
    },
}

impl LengthSpec {
    fn build(self) -> Result<LengthManager, ConfigError> {
        match self {
            Self::Fixed { length } => Ok(LengthManager::fixed(length)),
            Self::Variable {
                min,
                max,
                prefix,
                trailer,
            } => {
                let encoder = prefix.build()?;
                match trailer {
                    Some(trailer) => LengthManager::variable_with_trailer(min, max, encoder, trailer),
                    None => LengthManager::variable(min, max, encoder),
                }
            }
        }
    }
}

/// Digit layout of a length prefix or announcement tag.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct PrefixSpec {
    /// Decimal digit count, one to four.
    pub digits: u8,
    /// How the digits travel on the wire; ASCII when omitted.
    #[serde(default)]
    pub style: PrefixStyle,
}

impl PrefixSpec {
    fn build(self) -> Result<LengthEncoder, ConfigError> {
        match self.style {
            PrefixStyle::Ascii => LengthEncoder::ascii(self.digits),
            PrefixStyle::Bcd => LengthEncoder::bcd(self.digits),
        }
    }
}

/// Wire form of prefix digits.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrefixStyle {
    /// One ASCII digit character per digit.
    #[default]
    Ascii,
    /// Two digits packed per byte.
    Bcd,
}

/// Wire encoding of a field value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncodingSpec {
    /// Bytes pass through unchanged.
    #[default]
    Plain,
    /// Packed decimal with a leading zero pad nibble.
    Bcd,
    /// Packed decimal with a trailing `0xF` pad nibble.
    BcdRightF,
    /// Hex-character encoding.
    Hex,
}

impl EncodingSpec {
    const fn build(self) -> DataEncoding {
        match self {
            Self::Plain => DataEncoding::PLAIN,
            Self::Bcd => DataEncoding::BCD,
            Self::BcdRightF => DataEncoding::BCD_RIGHT_F,
            Self::Hex => DataEncoding::HEX,
        }
    }
}

/// Pad-and-strip rule for text fields.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct PaddingSpec {
    /// Fill character.
    pub fill: char,
    /// Which side receives the fill.
    pub side: SideSpec,
}

impl PaddingSpec {
    fn build(self) -> Padding {
        let side = match self.side {
            SideSpec::Left => PadSide::Left,
            SideSpec::Right => PadSide::Right,
        };
        Padding::new(self.fill, side)
    }
}

/// Side of a value, for padding.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SideSpec {
    /// Before the first character.
    Left,
    /// After the last character.
    Right,
}

/// Compression algorithm for compressed fields.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionSpec {
    /// Raw DEFLATE stream.
    Deflate,
    /// DEFLATE in a gzip wrapper.
    Gzip,
}

impl CompressionSpec {
    const fn build(self) -> Compression {
        match self {
            Self::Deflate => Compression::Deflate,
            Self::Gzip => Compression::Gzip,
        }
    }
}

/// One sensitive-field declaration.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SecurityEntry {
    /// Field number the rule applies to.
    pub number: u16,
    /// Rendering strategy; an omitted strategy withholds the value entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ObfuscationSpec>,
}

/// Rendering strategy for a sensitive field.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObfuscationSpec {
    /// Replace every character, preserving only the length.
    MaskAll,
    /// Star everything except the last four digits.
    CardNumber,
}

impl ObfuscationSpec {
    const fn build(self) -> Obfuscation {
        match self {
            Self::MaskAll => Obfuscation::MaskAll,
            Self::CardNumber => Obfuscation::CardNumber,
        }
    }
}
