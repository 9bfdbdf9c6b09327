//! Typed field values and the numbered container holding them.

use std::fmt;

use crate::message::{Bitmap, FieldNumber, Message};

/// The typed payload of one field.
///
/// Formatters dispatch on the variant; handing a formatter the wrong variant
/// raises [`crate::ProtocolError::WrongValueKind`] rather than coercing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Character data.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Field-presence bit vector.
    Bitmap(Bitmap),
    /// A whole sub-message.
    Nested(Message),
}

impl FieldValue {
    /// Short variant name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Bitmap(_) => "bitmap",
            Self::Nested(_) => "nested message",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "text \"{s}\""),
            Self::Binary(b) => write!(f, "binary {}", hex::encode_upper(b)),
            Self::Bitmap(b) => {
                write!(f, "bitmap {{")?;
                for (i, number) in b.iter_set().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{number}")?;
                }
                write!(f, "}}")
            }
            Self::Nested(m) => write!(f, "nested message ({} fields)", m.len()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self { Self::Text(value) }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self { Self::Binary(value) }
}

impl From<Bitmap> for FieldValue {
    fn from(value: Bitmap) -> Self { Self::Bitmap(value) }
}

impl From<Message> for FieldValue {
    fn from(value: Message) -> Self { Self::Nested(value) }
}

/// A numbered, typed unit of message data.
///
/// # Examples
///
/// ```
/// use fieldwire::message::{Field, FieldNumber};
///
/// let field = Field::text(FieldNumber::new(3), "000000");
/// assert_eq!(field.number().get(), 3);
/// assert_eq!(field.as_text(), Some("000000"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    number: FieldNumber,
    value: FieldValue,
}

impl Field {
    /// Create a field from a number and any value variant.
    #[must_use]
    pub fn new(number: FieldNumber, value: impl Into<FieldValue>) -> Self {
        Self {
            number,
            value: value.into(),
        }
    }

    /// Create a text field.
    #[must_use]
    pub fn text(number: FieldNumber, value: impl Into<String>) -> Self {
        Self::new(number, FieldValue::Text(value.into()))
    }

    /// Create a binary field.
    #[must_use]
    pub fn binary(number: FieldNumber, value: impl Into<Vec<u8>>) -> Self {
        Self::new(number, FieldValue::Binary(value.into()))
    }

    /// Create a nested-message field.
    #[must_use]
    pub fn nested(number: FieldNumber, value: Message) -> Self {
        Self::new(number, FieldValue::Nested(value))
    }

    /// The field number.
    #[must_use]
    pub const fn number(&self) -> FieldNumber { self.number }

    /// Rebind the field to a different number.
    ///
    /// Used when a self-announcing wire tag relocates a parsed field to the
    /// number it carried on the wire; ordinary fields keep their number for
    /// life.
    pub fn relocate(&mut self, number: FieldNumber) { self.number = number; }

    /// Borrow the typed value.
    #[must_use]
    pub const fn value(&self) -> &FieldValue { &self.value }

    /// Consume the field, returning its value.
    #[must_use]
    pub fn into_value(self) -> FieldValue { self.value }

    /// Text payload, if this is a text field.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Binary payload, if this is a binary field.
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match &self.value {
            FieldValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Bitmap payload, if this is a bitmap field.
    #[must_use]
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match &self.value {
            FieldValue::Bitmap(b) => Some(b),
            _ => None,
        }
    }

    /// Nested message, if this field holds one.
    #[must_use]
    pub fn as_nested(&self) -> Option<&Message> {
        match &self.value {
            FieldValue::Nested(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.number, self.value)
    }
}
