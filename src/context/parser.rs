//! Parse-side context: buffered bytes plus suspend/resume state.

use std::ops::Range;

use bytes::{Buf, BytesMut};

use crate::message::{Bitmap, FieldNumber, Message};

/// Where a suspended parse resumes.
///
/// The phase is an explicit value rather than an encoded sentinel so it can
/// be inspected in logs and assertions. Phases advance strictly forward
/// within one message and reset when the message completes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParsePhase {
    /// Expecting the configured packet header, if any.
    #[default]
    PacketHeader,
    /// Expecting the message header field.
    Header,
    /// Header done; the before-fields hook has not run yet.
    BeforeFields,
    /// Walking numbered fields, `next` being the first candidate not yet
    /// parsed.
    Fields {
        /// Next candidate field number.
        next: FieldNumber,
    },
}

/// Resumable cursor over an incoming byte stream.
///
/// The context owns the buffer: callers [`feed`](ParserContext::feed) it raw
/// chunks as they arrive and re-drive the parse. Insufficient data never
/// invalidates a context; the parse simply returns nothing and the next
/// `feed` plus re-drive continues from the recorded phase. Bytes are consumed
/// from the front only once the unit they belong to is complete.
///
/// One context serves one stream. Messages may span chunk boundaries and
/// chunks may span message boundaries; neither disturbs the other's state.
#[derive(Debug, Default)]
pub struct ParserContext {
    buffer: BytesMut,
    /// Total bytes consumed from the stream since creation.
    position: usize,
    /// Stream position where the message under assembly began.
    message_start: usize,
    phase: ParsePhase,
    message: Message,
    active_bitmap: Option<(FieldNumber, Bitmap)>,
    decoded_length: Option<usize>,
    announced: Option<FieldNumber>,
    redacted: Vec<Range<usize>>,
}

impl ParserContext {
    /// Create an empty context positioned at the start of a message.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append a chunk of received bytes to the buffer.
    pub fn feed(&mut self, bytes: &[u8]) { self.buffer.extend_from_slice(bytes); }

    /// Number of buffered, not yet consumed bytes.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Whether no unconsumed bytes remain.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    /// Total bytes consumed from the stream since creation.
    #[must_use]
    pub const fn position(&self) -> usize { self.position }

    /// The phase a re-driven parse resumes from.
    #[must_use]
    pub const fn phase(&self) -> &ParsePhase { &self.phase }

    /// Byte ranges of sensitive data in the message under assembly,
    /// relative to that message's first wire byte.
    ///
    /// Ranges survive a protocol error and remain readable after the message
    /// completes; they reset when the next message's parse begins or on
    /// [`message_consumed`](ParserContext::message_consumed).
    #[must_use]
    pub fn redacted_ranges(&self) -> &[Range<usize>] { &self.redacted }

    /// Reset every per-message slot, keeping unconsumed buffered bytes.
    ///
    /// Called when a message completes; also usable to abandon a partially
    /// assembled message after a protocol error once diagnostics are done.
    pub fn message_consumed(&mut self) {
        self.phase = ParsePhase::PacketHeader;
        self.message = Message::new();
        self.active_bitmap = None;
        self.decoded_length = None;
        self.announced = None;
        self.redacted.clear();
        self.message_start = self.position;
    }

    /// Clear only the cached decoded length, as a field completes.
    pub fn reset_decoded_length(&mut self) { self.decoded_length = None; }

    /// Borrow the first `len` buffered bytes without consuming them.
    pub(crate) fn peek(&self, len: usize) -> Option<&[u8]> {
        (self.buffer.len() >= len).then(|| &self.buffer[..len])
    }

    /// Consume `len` buffered bytes.
    pub(crate) fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.buffer.len());
        self.buffer.advance(len);
        self.position += len;
    }

    pub(crate) fn set_phase(&mut self, phase: ParsePhase) { self.phase = phase; }

    pub(crate) const fn decoded_length(&self) -> Option<usize> { self.decoded_length }

    pub(crate) fn set_decoded_length(&mut self, length: usize) {
        self.decoded_length = Some(length);
    }

    pub(crate) const fn announced(&self) -> Option<FieldNumber> { self.announced }

    pub(crate) fn set_announced(&mut self, number: FieldNumber) {
        self.announced = Some(number);
    }

    pub(crate) fn clear_announced(&mut self) { self.announced = None; }

    pub(crate) const fn active_bitmap(&self) -> Option<&(FieldNumber, Bitmap)> {
        self.active_bitmap.as_ref()
    }

    pub(crate) fn set_active_bitmap(&mut self, number: FieldNumber, bitmap: Bitmap) {
        self.active_bitmap = Some((number, bitmap));
    }

    pub(crate) const fn message(&self) -> &Message { &self.message }

    pub(crate) const fn message_mut(&mut self) -> &mut Message { &mut self.message }

    /// Hand out the completed message and reset per-message state.
    ///
    /// Redacted ranges are kept so the completed message's wire image can
    /// still be dumped with masking; they clear when the next message's parse
    /// begins.
    pub(crate) fn take_message(&mut self) -> Message {
        let message = std::mem::replace(&mut self.message, Message::new());
        self.phase = ParsePhase::PacketHeader;
        self.active_bitmap = None;
        self.decoded_length = None;
        self.announced = None;
        self.message_start = self.position;
        message
    }

    /// Drop redacted ranges belonging to a previous message.
    ///
    /// Within one message no range is recorded before the packet-header phase
    /// completes, so ranges seen at that phase are leftovers.
    pub(crate) fn clear_stale_redactions(&mut self) {
        if matches!(self.phase, ParsePhase::PacketHeader) {
            self.redacted.clear();
        }
    }

    /// Record a sensitive wire range in stream coordinates.
    pub(crate) fn record_redacted(&mut self, range: Range<usize>) {
        debug_assert!(range.start >= self.message_start);
        self.redacted
            .push(range.start - self.message_start..range.end - self.message_start);
    }
}
