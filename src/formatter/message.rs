//! The message-level orchestrator driving field formatters over a table.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{
    CodecError, ProtocolError, Result,
    context::{FormatterContext, ParsePhase, ParserContext},
    hooks::{Direction, SharedHooks},
    message::{Bitmap, Field, FieldNumber, Message},
    metrics,
    security::SecuritySchema,
};

use super::{
    announcing::AnnouncingFormatter,
    builder::MessageFormatterBuilder,
    field::{FieldFormatter, consume_value},
};

/// A complete field table: the codec for one message format.
///
/// The formatter maps field numbers to [`FieldFormatter`]s and carries the
/// packet header, header formatter, hooks, and security schema configured at
/// build time. It holds no per-message state; all of that lives in the
/// contexts, so one formatter serves any number of streams concurrently.
///
/// Registered fields outside every bitmap's coverage are unconditional: the
/// parser always expects them on the wire, so messages should always carry
/// them.
#[derive(Clone)]
pub struct MessageFormatter {
    formatters: BTreeMap<FieldNumber, FieldFormatter>,
    /// Bitmap field numbers in registration order; the first always travels
    /// when bits are recomputed so a parser can anchor on it.
    bitmaps: Vec<FieldNumber>,
    header: Option<FieldFormatter>,
    packet_header: Vec<u8>,
    hooks: Option<SharedHooks>,
    schema: SecuritySchema,
}

impl MessageFormatter {
    /// Start building a formatter.
    #[must_use]
    pub fn builder() -> MessageFormatterBuilder { MessageFormatterBuilder::new() }

    pub(super) const fn from_parts(
        formatters: BTreeMap<FieldNumber, FieldFormatter>,
        bitmaps: Vec<FieldNumber>,
        header: Option<FieldFormatter>,
        packet_header: Vec<u8>,
        hooks: Option<SharedHooks>,
        schema: SecuritySchema,
    ) -> Self {
        Self {
            formatters,
            bitmaps,
            header,
            packet_header,
            hooks,
            schema,
        }
    }

    /// Formatter registered for `number`, if any.
    #[must_use]
    pub fn formatter(&self, number: FieldNumber) -> Option<&FieldFormatter> {
        self.formatters.get(&number)
    }

    /// The configured security schema.
    #[must_use]
    pub const fn schema(&self) -> &SecuritySchema { &self.schema }

    /// Format `message`, appending its complete wire image to `ctx`.
    ///
    /// The message is not modified; bitmap contents are derived on the fly
    /// (see [`Message`] on when stored bitmap fields are trusted instead).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Protocol`] when the message cannot be laid out
    /// with this table, for example a present field without a formatter or a
    /// value violating its length bounds.
    pub fn format(&self, message: &Message, ctx: &mut FormatterContext) -> Result<()> {
        match self.format_protocol(message, ctx) {
            Ok(()) => {
                metrics::inc_messages(Direction::Format);
                Ok(())
            }
            Err(err) => {
                metrics::inc_protocol_errors();
                Err(CodecError::Protocol(err))
            }
        }
    }

    /// Drive a parse over the context's buffered bytes.
    ///
    /// Returns `Ok(Some(message))` when a whole message was assembled and
    /// consumed, and `Ok(None)` when the buffered bytes run out mid-message;
    /// feed the context more bytes and call again to resume. The context is
    /// never invalidated by insufficient data.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Protocol`] for malformed wire data. The context
    /// keeps its buffered bytes and redaction ranges for diagnostics; call
    /// [`ParserContext::message_consumed`] to abandon the broken message
    /// before reusing the context.
    pub fn parse(&self, ctx: &mut ParserContext) -> Result<Option<Message>> {
        match self.parse_protocol(ctx) {
            Ok(Some(message)) => {
                metrics::inc_messages(Direction::Parse);
                Ok(Some(message))
            }
            Ok(None) => {
                metrics::inc_parse_suspensions();
                Ok(None)
            }
            Err(err) => {
                metrics::inc_protocol_errors();
                Err(CodecError::Protocol(err))
            }
        }
    }

    pub(crate) fn format_protocol(
        &self,
        message: &Message,
        ctx: &mut FormatterContext,
    ) -> std::result::Result<(), ProtocolError> {
        ctx.buffer_mut().extend_from_slice(&self.packet_header);
        match (&self.header, message.header()) {
            (Some(formatter), Some(field)) => formatter.format(field, ctx, false)?,
            (Some(_), None) => return Err(ProtocolError::MissingHeader),
            (None, Some(_)) => {
                log::warn!("message carries a header but the table defines none; skipping it");
            }
            (None, None) => {}
        }
        if let Some(hooks) = &self.hooks {
            hooks.before_fields(message, Direction::Format);
        }

        let plan = self.bitmap_plan(message)?;
        let mut numbers: BTreeSet<FieldNumber> = message.numbers().collect();
        numbers.extend(plan.keys().copied());
        for number in numbers {
            let redact = self.schema.is_sensitive(number);
            if let Some(planned) = plan.get(&number) {
                let formatter = self
                    .formatters
                    .get(&number)
                    .ok_or(ProtocolError::NoFormatter { number })?;
                let field = Field::new(number, planned.clone());
                formatter
                    .format(&field, ctx, redact)
                    .map_err(|e| e.for_field(number))?;
                continue;
            }
            if self.bitmaps.contains(&number) {
                // a stored bitmap the plan excluded; its bits are stale
                continue;
            }
            let Some(field) = message.field(number) else {
                continue;
            };
            let formatter = self
                .formatters
                .get(&number)
                .ok_or(ProtocolError::NoFormatter { number })?;
            formatter
                .format(field, ctx, redact)
                .map_err(|e| e.for_field(number))?;
        }
        Ok(())
    }

    pub(crate) fn parse_protocol(
        &self,
        ctx: &mut ParserContext,
    ) -> std::result::Result<Option<Message>, ProtocolError> {
        ctx.clear_stale_redactions();
        loop {
            match ctx.phase().clone() {
                ParsePhase::PacketHeader => {
                    if !self.packet_header.is_empty() {
                        let Some(wire) = ctx.peek(self.packet_header.len()) else {
                            return Ok(None);
                        };
                        if wire != &self.packet_header[..] {
                            return Err(ProtocolError::PacketHeaderMismatch {
                                expected: self.packet_header.clone(),
                                found: wire.to_vec(),
                            });
                        }
                        ctx.advance(self.packet_header.len());
                    }
                    ctx.set_phase(ParsePhase::Header);
                }
                ParsePhase::Header => {
                    if let Some(formatter) = &self.header {
                        let Some(field) = formatter.parse(FieldNumber::HEADER, ctx, false)? else {
                            return Ok(None);
                        };
                        ctx.message_mut().set_header(field.into_value());
                    }
                    ctx.set_phase(ParsePhase::BeforeFields);
                }
                ParsePhase::BeforeFields => {
                    if let Some(hooks) = &self.hooks {
                        hooks.before_fields(ctx.message(), Direction::Parse);
                    }
                    let Some(first) = self.formatters.keys().next().copied() else {
                        return Ok(Some(complete(ctx)));
                    };
                    ctx.set_phase(ParsePhase::Fields { next: first });
                }
                ParsePhase::Fields { next } => return self.walk_fields(next, ctx),
            }
        }
    }

    /// Walk candidate numbers from `from` upward, parsing present fields.
    fn walk_fields(
        &self,
        from: FieldNumber,
        ctx: &mut ParserContext,
    ) -> std::result::Result<Option<Message>, ProtocolError> {
        let Some(ceiling) = self.walk_ceiling() else {
            return Ok(Some(complete(ctx)));
        };
        let mut current = from;
        while current <= ceiling {
            // an announced field may have landed here already
            if ctx.message().contains(current) {
                current = current.successor();
                continue;
            }
            let covered = self.covered_by_registered_bitmap(current);
            if covered && !presence_declared(current, ctx) {
                current = current.successor();
                continue;
            }
            let Some(formatter) = self.formatters.get(&current) else {
                if covered {
                    return Err(ProtocolError::NoFormatter { number: current });
                }
                current = current.successor();
                continue;
            };
            let parsed = if let Some(layout) = formatter.announcing_layout() {
                self.parse_announced(current, layout, ctx)
            } else {
                let redact = self.schema.is_sensitive(current);
                formatter.parse(current, ctx, redact)
            };
            match parsed.map_err(|e| e.for_field(current))? {
                Some(field) => {
                    ctx.message_mut().set(field);
                    current = current.successor();
                }
                None => {
                    ctx.set_phase(ParsePhase::Fields { next: current });
                    return Ok(None);
                }
            }
        }
        Ok(Some(complete(ctx)))
    }

    /// Parse a self-announcing candidate, redirecting on a foreign number.
    ///
    /// The envelope (length prefix, tag, trailer) always follows the
    /// candidate's layout; the value's encoding follows the formatter
    /// registered at the announced number when the announcement points
    /// elsewhere.
    fn parse_announced(
        &self,
        candidate: FieldNumber,
        layout: &AnnouncingFormatter,
        ctx: &mut ParserContext,
    ) -> std::result::Result<Option<Field>, ProtocolError> {
        let Some(announcement) = layout.resolve(ctx)? else {
            return Ok(None);
        };
        let number = announcement.number;
        let (encoding, binary) = if number == candidate {
            (layout.encoding(), layout.is_binary())
        } else {
            let target = self
                .formatters
                .get(&number)
                .ok_or(ProtocolError::NoFormatter { number })?;
            target
                .announced_value()
                .ok_or_else(|| ProtocolError::UnannounceableTarget {
                    number,
                    kind: target.kind_name(),
                })?
        };
        let redact = self.schema.is_sensitive(number);
        let Some(payload) = consume_value(
            ctx,
            encoding,
            announcement.value_len,
            layout.manager().trailer(),
            redact,
        )
        .map_err(|e| e.for_field(number))?
        else {
            return Ok(None);
        };
        ctx.clear_announced();
        let field = if binary {
            Field::binary(number, payload)
        } else {
            let text =
                String::from_utf8(payload).map_err(|e| ProtocolError::from(e).for_field(number))?;
            Field::text(number, text)
        };
        Ok(Some(field))
    }

    /// Decide which bitmap fields travel and with which bits set.
    ///
    /// A changed message derives everything from its field set: a registered
    /// bitmap is included when any covered plain field is present or a
    /// covered included bitmap chains off it, and the first registered bitmap
    /// always travels. An unchanged message, typically straight from a parse,
    /// reuses its stored bitmap fields verbatim.
    fn bitmap_plan(
        &self,
        message: &Message,
    ) -> std::result::Result<BTreeMap<FieldNumber, Bitmap>, ProtocolError> {
        if self.bitmaps.is_empty() {
            return Ok(BTreeMap::new());
        }
        if !message.bitmap_dirty() {
            let stored: BTreeMap<FieldNumber, Bitmap> = self
                .bitmaps
                .iter()
                .filter_map(|&n| message.bitmap(n).map(|b| (n, b.clone())))
                .collect();
            let anchored = self
                .bitmaps
                .first()
                .is_some_and(|first| stored.contains_key(first));
            if anchored {
                return Ok(stored);
            }
        }

        let mut included: Vec<FieldNumber> = Vec::new();
        loop {
            let mut grew = false;
            for &number in &self.bitmaps {
                if included.contains(&number) {
                    continue;
                }
                let Some((lower, upper)) = self.bitmap_range(number) else {
                    continue;
                };
                let has_plain = message
                    .numbers()
                    .any(|n| lower <= n && n <= upper && !self.bitmaps.contains(&n));
                let has_chained = included
                    .iter()
                    .any(|&b| lower <= b && b <= upper);
                if has_plain || has_chained {
                    included.push(number);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        if let Some(&first) = self.bitmaps.first() {
            if !included.contains(&first) {
                included.push(first);
            }
        }

        let mut plan = BTreeMap::new();
        for &number in &included {
            let Some((lower, upper)) = self.bitmap_range(number) else {
                continue;
            };
            let mut bitmap = Bitmap::new(lower, upper);
            for n in message.numbers() {
                if lower <= n && n <= upper && !self.bitmaps.contains(&n) {
                    bitmap.set(n, true)?;
                }
            }
            for &chained in &included {
                if lower <= chained && chained <= upper {
                    bitmap.set(chained, true)?;
                }
            }
            plan.insert(number, bitmap);
        }
        Ok(plan)
    }

    fn bitmap_range(&self, number: FieldNumber) -> Option<(FieldNumber, FieldNumber)> {
        self.formatters
            .get(&number)
            .and_then(FieldFormatter::bitmap_range)
    }

    fn covered_by_registered_bitmap(&self, number: FieldNumber) -> bool {
        self.bitmaps.iter().any(|&b| {
            self.bitmap_range(b)
                .is_some_and(|(lower, upper)| lower <= number && number <= upper)
        })
    }

    /// Last candidate the field walk can reach: the highest registered
    /// number or covered upper bound, whichever is greater.
    fn walk_ceiling(&self) -> Option<FieldNumber> {
        let registered = self.formatters.keys().next_back().copied();
        let covered = self
            .bitmaps
            .iter()
            .filter_map(|&b| self.bitmap_range(b))
            .map(|(_, upper)| upper)
            .max();
        match (registered, covered) {
            (Some(r), Some(c)) => Some(r.max(c)),
            (r, c) => r.or(c),
        }
    }
}

impl fmt::Debug for MessageFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFormatter")
            .field("formatters", &self.formatters)
            .field("bitmaps", &self.bitmaps)
            .field("header", &self.header)
            .field("packet_header", &self.packet_header)
            .field("hooks", &self.hooks.is_some())
            .field("schema", &self.schema)
            .finish()
    }
}

/// Whether a covered candidate's presence bit is set, activating the
/// declaring bitmap on the way. A covered candidate whose declaring bitmap
/// never arrived reads as absent.
fn presence_declared(current: FieldNumber, ctx: &mut ParserContext) -> bool {
    let active_covers = ctx
        .active_bitmap()
        .is_some_and(|(_, bitmap)| bitmap.covers(current));
    if !active_covers {
        let activated = ctx.message().fields().find_map(|field| {
            field
                .bitmap()
                .filter(|bitmap| bitmap.covers(current))
                .map(|bitmap| (field.number(), bitmap.clone()))
        });
        match activated {
            Some((number, bitmap)) => ctx.set_active_bitmap(number, bitmap),
            None => return false,
        }
    }
    ctx.active_bitmap()
        .is_some_and(|(_, bitmap)| bitmap.is_set(current))
}

/// Hand out the assembled message, marking its bitmap fields trustworthy.
fn complete(ctx: &mut ParserContext) -> Message {
    let mut message = ctx.take_message();
    message.clear_bitmap_dirty();
    log::trace!("parsed message with {} fields", message.len());
    message
}
