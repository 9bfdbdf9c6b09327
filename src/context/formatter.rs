//! Format-side context: an output buffer plus recorded sensitive ranges.

use std::ops::Range;

use bytes::BytesMut;

/// Accumulates the wire image of one or more outgoing messages.
///
/// Sensitive fields are recorded as byte ranges relative to the buffer start
/// so diagnostics can render the image with those ranges masked (see
/// [`redacted_hex_dump`](crate::security::redacted_hex_dump)). Taking the
/// image resets the ranges with it.
#[derive(Debug, Default)]
pub struct FormatterContext {
    buffer: BytesMut,
    redacted: Vec<Range<usize>>,
}

impl FormatterContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The accumulated wire image.
    #[must_use]
    pub fn bytes(&self) -> &[u8] { &self.buffer }

    /// Number of accumulated bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.buffer.len() }

    /// Whether nothing has been formatted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    /// Byte ranges of sensitive data, relative to the buffer start.
    #[must_use]
    pub fn redacted_ranges(&self) -> &[Range<usize>] { &self.redacted }

    /// Take the accumulated image, clearing the recorded ranges with it.
    ///
    /// Render any diagnostics before taking; the ranges refer to the image
    /// being handed out.
    pub fn take(&mut self) -> BytesMut {
        self.redacted.clear();
        self.buffer.split()
    }

    pub(crate) const fn buffer_mut(&mut self) -> &mut BytesMut { &mut self.buffer }

    /// Record a sensitive range in buffer coordinates.
    pub(crate) fn record_redacted(&mut self, range: Range<usize>) {
        self.redacted.push(range);
    }
}
