//! Sensitive-field handling: obfuscation strategies, the security schema,
//! and redacted rendering for logs and diagnostics.
//!
//! Nothing in this module touches the wire format. The schema only decides
//! what may appear in human-facing output; formatting and parsing record the
//! byte ranges of schema-listed fields so wire dumps can be masked too.

use std::{collections::BTreeMap, fmt::Write as _, ops::Range};

use crate::message::{FieldNumber, FieldValue, Message};

/// How a sensitive value is rendered for humans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Obfuscation {
    /// Replace every character, preserving only the length.
    MaskAll,
    /// Card-number masking: everything starred except the last four digits.
    CardNumber,
}

impl Obfuscation {
    /// Render `value` with this strategy applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldwire::security::Obfuscation;
    ///
    /// assert_eq!(
    ///     Obfuscation::CardNumber.apply("4000000000000002"),
    ///     "************0002"
    /// );
    /// assert_eq!(Obfuscation::MaskAll.apply("12345"), "*****");
    /// ```
    #[must_use]
    pub fn apply(self, value: &str) -> String {
        let total = value.chars().count();
        let visible = match self {
            Self::MaskAll => 0,
            // Values of four characters or fewer stay fully masked.
            Self::CardNumber => if total > 4 { 4 } else { 0 },
        };
        let mut rendered = "*".repeat(total - visible);
        rendered.extend(value.chars().skip(total - visible));
        rendered
    }
}

/// Which fields are sensitive, and how each may be shown.
///
/// An absent entry means the field is loggable verbatim. A listed field is
/// never logged verbatim: with a strategy its value renders obfuscated, and
/// without one the value is withheld entirely.
#[derive(Clone, Debug, Default)]
pub struct SecuritySchema {
    entries: BTreeMap<FieldNumber, Option<Obfuscation>>,
}

impl SecuritySchema {
    /// An empty schema; every field is loggable.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Mark `number` sensitive with no renderable form.
    #[must_use]
    pub fn sensitive(mut self, number: FieldNumber) -> Self {
        self.entries.insert(number, None);
        self
    }

    /// Mark `number` sensitive, rendered through `strategy`.
    #[must_use]
    pub fn obfuscated(mut self, number: FieldNumber, strategy: Obfuscation) -> Self {
        self.entries.insert(number, Some(strategy));
        self
    }

    /// Whether `number` is listed as sensitive.
    #[must_use]
    pub fn is_sensitive(&self, number: FieldNumber) -> bool {
        self.entries.contains_key(&number)
    }

    /// Render one field value under the schema's rules for `number`.
    #[must_use]
    pub fn render_value(&self, number: FieldNumber, value: &FieldValue) -> String {
        match self.entries.get(&number) {
            None => value.to_string(),
            Some(Some(strategy)) => match value {
                FieldValue::Text(text) => format!("text \"{}\"", strategy.apply(text)),
                _ => "(redacted)".to_owned(),
            },
            Some(None) => "(redacted)".to_owned(),
        }
    }

    /// Render a whole message with sensitive fields masked.
    ///
    /// This is the log-safe counterpart of [`Message`]'s `Display`
    /// implementation.
    #[must_use]
    pub fn describe(&self, message: &Message) -> String {
        let mut out = format!("message ({} fields)\n", message.len());
        if let Some(header) = message.header() {
            let _ = writeln!(out, "  header: {}", header.value());
        }
        for field in message.fields() {
            let _ = writeln!(
                out,
                "  {}: {}",
                field.number(),
                self.render_value(field.number(), field.value())
            );
        }
        out
    }
}

/// Render a wire image as a hex dump with sensitive ranges masked.
///
/// Sixteen bytes per line, offset-prefixed; bytes inside any of `ranges`
/// render as `**`. Ranges use the same coordinates as the image slice, which
/// matches what the contexts record.
///
/// # Examples
///
/// ```
/// use fieldwire::security::redacted_hex_dump;
///
/// let dump = redacted_hex_dump(b"AB12", &[2..4]);
/// assert_eq!(dump, "0000  41 42 ** **");
/// ```
#[must_use]
pub fn redacted_hex_dump(image: &[u8], ranges: &[Range<usize>]) -> String {
    let mut out = String::new();
    for (line, chunk) in image.chunks(16).enumerate() {
        if line > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:04X} ", line * 16);
        for (column, byte) in chunk.iter().enumerate() {
            let offset = line * 16 + column;
            if ranges.iter().any(|range| range.contains(&offset)) {
                out.push_str(" **");
            } else {
                let _ = write!(out, " {byte:02X}");
            }
        }
    }
    out
}
