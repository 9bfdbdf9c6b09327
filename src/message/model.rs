//! The in-memory message model: an ordered collection of numbered fields.

use std::{collections::BTreeMap, fmt};

use crate::message::{Bitmap, Field, FieldNumber, FieldValue};

/// An ordered collection of numbered fields plus an optional header.
///
/// Fields are keyed by [`FieldNumber`] and iterate in ascending order, which
/// is also the wire order. The message tracks whether its field set changed
/// since the last time bitmap bits were derived from it; the formatter uses
/// that flag to decide between recomputing bitmap contents and trusting the
/// bitmap fields already stored (as after a parse).
///
/// Nested messages are reached by walking downward from the root via
/// [`Message::message_at`]; child messages hold no pointer back to their
/// parent.
///
/// # Examples
///
/// ```
/// use fieldwire::message::{FieldNumber, Message};
///
/// let mut message = Message::new();
/// message.set_text(FieldNumber::new(3), "000000");
/// message.set_text(FieldNumber::new(11), "123456");
/// assert_eq!(message.text(FieldNumber::new(3)), Some("000000"));
/// assert_eq!(message.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Message {
    fields: BTreeMap<FieldNumber, Field>,
    // Boxed to break the layout cycle Message -> Field -> FieldValue::Nested.
    header: Option<Box<Field>>,
    bitmap_dirty: bool,
}

impl Message {
    /// Create an empty message.
    ///
    /// A fresh message is considered changed, so the first format derives
    /// bitmap bits from the field set rather than trusting stale state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            header: None,
            bitmap_dirty: true,
        }
    }

    /// Insert a field, replacing any previous field with the same number.
    pub fn set(&mut self, field: Field) {
        self.fields.insert(field.number(), field);
        self.bitmap_dirty = true;
    }

    /// Insert a text field.
    pub fn set_text(&mut self, number: FieldNumber, value: impl Into<String>) {
        self.set(Field::text(number, value));
    }

    /// Insert a binary field.
    pub fn set_binary(&mut self, number: FieldNumber, value: impl Into<Vec<u8>>) {
        self.set(Field::binary(number, value));
    }

    /// Insert a nested-message field.
    pub fn set_nested(&mut self, number: FieldNumber, value: Message) {
        self.set(Field::nested(number, value));
    }

    /// Remove a field, returning it if present.
    pub fn remove(&mut self, number: FieldNumber) -> Option<Field> {
        let removed = self.fields.remove(&number);
        if removed.is_some() {
            self.bitmap_dirty = true;
        }
        removed
    }

    /// Borrow a field by number.
    #[must_use]
    pub fn field(&self, number: FieldNumber) -> Option<&Field> { self.fields.get(&number) }

    /// Return whether a field with `number` is present.
    #[must_use]
    pub fn contains(&self, number: FieldNumber) -> bool { self.fields.contains_key(&number) }

    /// Text payload of the field at `number`, when present and textual.
    #[must_use]
    pub fn text(&self, number: FieldNumber) -> Option<&str> {
        self.field(number).and_then(Field::as_text)
    }

    /// Binary payload of the field at `number`, when present and binary.
    #[must_use]
    pub fn binary(&self, number: FieldNumber) -> Option<&[u8]> {
        self.field(number).and_then(Field::as_binary)
    }

    /// Bitmap stored at `number`, when present and a bitmap.
    #[must_use]
    pub fn bitmap(&self, number: FieldNumber) -> Option<&Bitmap> {
        self.field(number).and_then(Field::bitmap)
    }

    /// Nested message stored at `number`, when present and nested.
    #[must_use]
    pub fn nested(&self, number: FieldNumber) -> Option<&Message> {
        self.field(number).and_then(Field::as_nested)
    }

    /// Walk a path of field numbers down through nested messages.
    ///
    /// An empty path yields the message itself. The walk stops with `None`
    /// as soon as a path element is absent or not a nested message.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldwire::message::{FieldNumber, Message};
    ///
    /// let mut inner = Message::new();
    /// inner.set_text(FieldNumber::new(2), "4000001234567890");
    /// let mut outer = Message::new();
    /// outer.set_nested(FieldNumber::new(62), inner);
    ///
    /// let found = outer.message_at(&[FieldNumber::new(62)]).expect("nested");
    /// assert_eq!(found.text(FieldNumber::new(2)), Some("4000001234567890"));
    /// assert!(outer.message_at(&[FieldNumber::new(63)]).is_none());
    /// ```
    #[must_use]
    pub fn message_at(&self, path: &[FieldNumber]) -> Option<&Message> {
        let mut current = self;
        for number in path {
            current = current.nested(*number)?;
        }
        Some(current)
    }

    /// Borrow the header field, if one is set.
    #[must_use]
    pub fn header(&self) -> Option<&Field> { self.header.as_deref() }

    /// Set the header value.
    ///
    /// The header is stored under [`FieldNumber::HEADER`] and never appears
    /// in the numbered field set or in bitmap computations.
    pub fn set_header(&mut self, value: impl Into<FieldValue>) {
        self.header = Some(Box::new(Field::new(FieldNumber::HEADER, value)));
    }

    /// Remove and return the header field.
    pub fn clear_header(&mut self) -> Option<Field> { self.header.take().map(|h| *h) }

    /// Iterate the fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> { self.fields.values() }

    /// Iterate the field numbers in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = FieldNumber> + '_ {
        self.fields.keys().copied()
    }

    /// Number of fields, excluding the header.
    #[must_use]
    pub fn len(&self) -> usize { self.fields.len() }

    /// Return whether the message holds no numbered fields.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Whether the field set changed since bitmap bits were last derived.
    pub(crate) const fn bitmap_dirty(&self) -> bool { self.bitmap_dirty }

    /// Mark stored bitmap fields as in sync with the field set.
    pub(crate) const fn clear_bitmap_dirty(&mut self) { self.bitmap_dirty = false; }
}

/// Equality compares the header and field set only; the bitmap-recompute
/// flag is bookkeeping, not content.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.header == other.header
    }
}

impl Eq for Message {}

/// Renders every field verbatim, one per line.
///
/// This rendering is for structural inspection and masks nothing; use
/// [`SecuritySchema::describe`](crate::security::SecuritySchema::describe)
/// when the output may reach logs.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message ({} fields)", self.fields.len())?;
        if let Some(header) = &self.header {
            writeln!(f, "  header: {}", header.value())?;
        }
        for field in self.fields.values() {
            writeln!(f, "  {field}")?;
        }
        Ok(())
    }
}
