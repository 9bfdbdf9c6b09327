//! Shared demonstration table, message, and wire image.
//!
//! The table models a miniature authorization surface: an `ISO` packet
//! header, a four-character message type header, a primary bitmap covering
//! fields 2 through 64, and representative fields including a nested block
//! at 62. The card number at 2 and the PIN block at 52 are marked sensitive,
//! so formatting and parsing both record redacted ranges.

use std::ops::Range;

use fieldwire::{
    encoding::DataEncoding,
    formatter::{FieldFormatter, MessageFormatter, Padding},
    length::{LengthEncoder, LengthManager},
    message::{FieldNumber, Message},
    security::{Obfuscation, SecuritySchema},
};
use rstest::fixture;

fn n(value: u16) -> FieldNumber { FieldNumber::new(value) }

fn ascii_var(min: usize, max: usize) -> LengthManager {
    LengthManager::variable(min, max, LengthEncoder::ASCII_LL).expect("bounds fit two digits")
}

fn inner_table() -> MessageFormatter {
    MessageFormatter::builder()
        .field(
            n(2),
            FieldFormatter::text(ascii_var(1, 19), DataEncoding::PLAIN),
        )
        .expect("fresh number")
        .build()
        .expect("valid table")
}

/// The demonstration field table.
#[must_use]
pub fn demo_table() -> MessageFormatter {
    MessageFormatter::builder()
        .packet_header_text("ISO")
        .header(FieldFormatter::text(
            LengthManager::fixed(4),
            DataEncoding::PLAIN,
        ))
        .field(
            n(1),
            FieldFormatter::bitmap(n(2), n(64), DataEncoding::PLAIN).expect("valid range"),
        )
        .expect("fresh number")
        .field(
            n(2),
            FieldFormatter::text(ascii_var(1, 19), DataEncoding::BCD),
        )
        .expect("fresh number")
        .field(
            n(3),
            FieldFormatter::padded_text(
                LengthManager::fixed(6),
                DataEncoding::PLAIN,
                Padding::SPACES_RIGHT,
            ),
        )
        .expect("fresh number")
        .field(
            n(11),
            FieldFormatter::padded_text(
                LengthManager::fixed(3),
                DataEncoding::BCD,
                Padding::ZEROS_LEFT,
            ),
        )
        .expect("fresh number")
        .field(
            n(52),
            FieldFormatter::binary(LengthManager::fixed(2), DataEncoding::PLAIN),
        )
        .expect("fresh number")
        .field(
            n(62),
            FieldFormatter::nested(ascii_var(1, 99), inner_table()),
        )
        .expect("fresh number")
        .security(
            SecuritySchema::new()
                .obfuscated(n(2), Obfuscation::CardNumber)
                .sensitive(n(52)),
        )
        .build()
        .expect("valid table")
}

/// A message exercising every field kind in [`demo_table`].
#[must_use]
pub fn demo_message() -> Message {
    let mut inner = Message::new();
    inner.set_text(n(2), "99");

    let mut message = Message::new();
    message.set_header("0200");
    message.set_text(n(2), "4000000000000002");
    message.set_text(n(3), "AB");
    message.set_text(n(11), "7");
    message.set_binary(n(52), vec![0xAA, 0xBB]);
    message.set_nested(n(62), inner);
    message
}

/// [`demo_message`] through [`demo_table`], byte for byte.
#[must_use]
pub fn demo_image() -> Vec<u8> {
    let mut image = Vec::new();
    // packet header and message type header, offsets 0..7
    image.extend_from_slice(b"ISO0200");
    // field 1: bitmap with bits 2, 3, 11, 52, 62, offsets 7..15
    image.extend_from_slice(&[0xC0, 0x40, 0x00, 0x00, 0x00, 0x00, 0x20, 0x08]);
    // field 2: ASCII length 16, BCD card number, offsets 15..25
    image.extend_from_slice(b"16");
    image.extend_from_slice(&[0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02]);
    // field 3: "AB" space-padded to six, offsets 25..31
    image.extend_from_slice(b"AB    ");
    // field 11: "7" zero-padded to three digits of BCD, offsets 31..33
    image.extend_from_slice(&[0x00, 0x07]);
    // field 52: raw PIN block, offsets 33..35
    image.extend_from_slice(&[0xAA, 0xBB]);
    // field 62: nested image "0299" behind an ASCII length, offsets 35..41
    image.extend_from_slice(b"040299");
    image
}

/// Redacted ranges both contexts record for the demo image: the card number
/// value at field 2 and the PIN block at field 52.
#[must_use]
pub fn demo_redacted_ranges() -> Vec<Range<usize>> { vec![17..25, 33..35] }

/// The demonstration table as an rstest fixture.
#[fixture]
pub fn demo_formatter() -> MessageFormatter { demo_table() }
