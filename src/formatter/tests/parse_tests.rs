//! Tests for the parse path: the candidate walk, announcements, and errors.

use crate::{
    ProtocolError,
    context::{ParsePhase, ParserContext},
    encoding::DataEncoding,
    formatter::{FieldFormatter, MessageFormatter},
    length::{LengthEncoder, LengthManager},
    message::Message,
};

use super::fixtures::{
    ascii_var, chained_table, demo_formatter, demo_image, inner_table, n, protocol_error,
};

fn parse_one(formatter: &MessageFormatter, wire: &[u8]) -> Message {
    let mut ctx = ParserContext::new();
    ctx.feed(wire);
    formatter
        .parse(&mut ctx)
        .expect("wire is well formed")
        .expect("wire is complete")
}

fn announcing_table() -> MessageFormatter {
    MessageFormatter::builder()
        .field(
            n(48),
            FieldFormatter::announcing(
                ascii_var(1, 99),
                LengthEncoder::ASCII_LL,
                false,
                DataEncoding::PLAIN,
            ),
        )
        .expect("fresh number")
        .field(
            n(49),
            FieldFormatter::text(ascii_var(1, 19), DataEncoding::BCD),
        )
        .expect("fresh number")
        .build()
        .expect("valid table")
}

#[test]
fn the_demo_image_parses_to_the_demo_fields() {
    let formatter = demo_formatter();
    let mut ctx = ParserContext::new();
    ctx.feed(&demo_image());

    let message = formatter
        .parse(&mut ctx)
        .expect("image is well formed")
        .expect("image is complete");

    assert_eq!(message.header().and_then(|h| h.as_text()), Some("0200"));
    assert_eq!(message.len(), 6, "five fields plus the bitmap");
    assert_eq!(message.text(n(2)), Some("4000000000000002"));
    assert_eq!(message.text(n(3)), Some("AB"));
    assert_eq!(message.text(n(11)), Some("7"));
    assert_eq!(message.binary(n(52)), Some(&[0xAA, 0xBB][..]));
    assert_eq!(
        message.nested(n(62)).and_then(|m| m.text(n(2))),
        Some("99")
    );

    let bitmap = message.bitmap(n(1)).expect("parsed bitmap travels along");
    let set: Vec<u16> = bitmap.iter_set().map(crate::message::FieldNumber::get).collect();
    assert_eq!(set, vec![2, 3, 11, 52, 62]);

    assert!(ctx.is_empty());
    assert_eq!(ctx.redacted_ranges(), &[17..25, 33..35]);
}

#[test]
fn trailing_bytes_stay_buffered_for_the_next_message() {
    let formatter = demo_formatter();
    let image = demo_image();
    let mut ctx = ParserContext::new();
    ctx.feed(&image);
    ctx.feed(&image[..3]);

    let first = formatter
        .parse(&mut ctx)
        .expect("image is well formed")
        .expect("image is complete");
    assert_eq!(first.text(n(3)), Some("AB"));
    assert_eq!(ctx.buffered(), 3);

    ctx.feed(&image[3..]);
    let second = formatter
        .parse(&mut ctx)
        .expect("image is well formed")
        .expect("image is complete");
    assert_eq!(first, second);
    assert_eq!(
        ctx.redacted_ranges(),
        &[17..25, 33..35],
        "ranges are relative to each message"
    );
}

#[test]
fn a_packet_header_mismatch_consumes_nothing() {
    let formatter = demo_formatter();
    let mut ctx = ParserContext::new();
    ctx.feed(b"XYZ0200");

    let err = protocol_error(formatter.parse(&mut ctx).expect_err("wrong magic"));
    let ProtocolError::PacketHeaderMismatch { expected, found } = err else {
        panic!("expected a packet header mismatch, got {err:?}");
    };
    assert_eq!(expected, b"ISO");
    assert_eq!(found, b"XYZ");
    assert_eq!(ctx.buffered(), 7);
}

#[test]
fn a_claimed_bit_without_a_formatter_is_an_error() {
    let formatter = MessageFormatter::builder()
        .field(
            n(1),
            FieldFormatter::bitmap(n(2), n(9), DataEncoding::PLAIN).expect("valid range"),
        )
        .expect("fresh number")
        .field(
            n(2),
            FieldFormatter::text(LengthManager::fixed(1), DataEncoding::PLAIN),
        )
        .expect("fresh number")
        .build()
        .expect("valid table");

    let mut ctx = ParserContext::new();
    ctx.feed(&[0x90, b'A']);
    let err = protocol_error(formatter.parse(&mut ctx).expect_err("bit 5 is claimed"));
    assert!(matches!(
        err,
        ProtocolError::NoFormatter { number } if number == n(5)
    ));
}

#[test]
fn an_all_zero_bitmap_parses_an_empty_message() {
    let message = parse_one(&chained_table(), &[0x00]);
    assert_eq!(message.len(), 1, "just the bitmap");
    assert!(message.bitmap(n(1)).is_some());
}

#[test]
fn chained_bitmaps_activate_in_turn() {
    let message = parse_one(&chained_table(), &[0x01, 0x20, b'X']);
    assert_eq!(message.text(n(12)), Some("X"));
    assert!(message.bitmap(n(1)).is_some());
    assert!(message.bitmap(n(9)).is_some());
}

#[test]
fn a_bitmapless_table_parses_every_registered_field() {
    let message = parse_one(&inner_table(), b"0299");
    assert_eq!(message.text(n(2)), Some("99"));
}

#[test]
fn an_announcement_redirects_to_the_registered_target() {
    let mut wire = b"0349".to_vec();
    wire.extend_from_slice(&[0x01, 0x23]);

    let message = parse_one(&announcing_table(), &wire);
    assert_eq!(message.text(n(49)), Some("123"));
    assert!(!message.contains(n(48)));
}

#[test]
fn an_announcement_for_an_unregistered_number_is_rejected() {
    let formatter = announcing_table();
    let mut ctx = ParserContext::new();
    ctx.feed(b"0150");

    let err = protocol_error(formatter.parse(&mut ctx).expect_err("50 is not registered"));
    let ProtocolError::Field { number, source } = err else {
        panic!("expected field attribution, got {err:?}");
    };
    assert_eq!(number, n(48));
    assert!(matches!(
        *source,
        ProtocolError::NoFormatter { number } if number == n(50)
    ));
}

#[test]
fn an_announcement_cannot_target_a_bitmap() {
    let formatter = MessageFormatter::builder()
        .field(
            n(5),
            FieldFormatter::announcing(
                ascii_var(1, 99),
                LengthEncoder::ASCII_LL,
                false,
                DataEncoding::PLAIN,
            ),
        )
        .expect("fresh number")
        .field(
            n(7),
            FieldFormatter::bitmap(n(10), n(17), DataEncoding::PLAIN).expect("valid range"),
        )
        .expect("fresh number")
        .build()
        .expect("valid table");

    let mut ctx = ParserContext::new();
    ctx.feed(b"0107");
    let err = protocol_error(formatter.parse(&mut ctx).expect_err("a bitmap has no announced form"));
    let ProtocolError::Field { number, source } = err else {
        panic!("expected field attribution, got {err:?}");
    };
    assert_eq!(number, n(5));
    assert!(matches!(
        *source,
        ProtocolError::UnannounceableTarget { kind: "bitmap", .. }
    ));
}

#[test]
fn parse_errors_name_the_offending_field() {
    let mut image = demo_image();
    // field 11's low nibble becomes 0xA, which is not a decimal digit
    image[32] = 0x1A;

    let formatter = demo_formatter();
    let mut ctx = ParserContext::new();
    ctx.feed(&image);

    let err = protocol_error(formatter.parse(&mut ctx).expect_err("corrupt BCD"));
    let ProtocolError::Field { number, source } = err else {
        panic!("expected field attribution, got {err:?}");
    };
    assert_eq!(number, n(11));
    assert!(matches!(*source, ProtocolError::NonDigitNibble { byte: 0x1A }));

    assert_eq!(ctx.buffered(), 10, "unconsumed bytes stay for diagnostics");
    ctx.message_consumed();
    assert_eq!(ctx.phase(), &ParsePhase::PacketHeader);
    assert!(ctx.redacted_ranges().is_empty());
}
