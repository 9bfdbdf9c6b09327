//! End-to-end formatting and parsing through the public API.
//!
//! The demo fixtures come from `fieldwire_testing`; the drivers deliver the
//! wire image whole, split at every offset, and in fixed-size chunks.

use fieldwire::{
    CodecError,
    ProtocolError,
    context::FormatterContext,
    encoding::DataEncoding,
    formatter::{FieldFormatter, MessageFormatter, Padding},
    length::LengthManager,
    message::{FieldNumber, Message},
    security::redacted_hex_dump,
};
use fieldwire_testing::{
    demo_image,
    demo_message,
    demo_redacted_ranges,
    demo_table,
    parse_in_chunks,
    parse_split,
    parse_whole,
};

fn n(value: u16) -> FieldNumber { FieldNumber::new(value) }

#[test]
fn the_demo_message_formats_to_its_published_image() {
    let formatter = demo_table();
    let mut ctx = FormatterContext::new();
    formatter
        .format(&demo_message(), &mut ctx)
        .expect("formats");

    assert_eq!(ctx.bytes(), demo_image().as_slice());
    assert_eq!(ctx.redacted_ranges(), demo_redacted_ranges().as_slice());
}

#[test]
fn the_demo_image_parses_back_to_the_demo_fields() {
    let parsed = parse_whole(&demo_table(), &demo_image()).expect("parses");

    assert_eq!(parsed.header().and_then(|h| h.as_text()), Some("0200"));
    assert_eq!(parsed.text(n(2)), Some("4000000000000002"));
    assert_eq!(parsed.text(n(3)), Some("AB"));
    assert_eq!(parsed.text(n(11)), Some("7"));
    assert_eq!(parsed.binary(n(52)), Some(&[0xAA, 0xBB][..]));
    assert_eq!(parsed.nested(n(62)).and_then(|m| m.text(n(2))), Some("99"));
}

#[test]
fn every_split_offset_yields_the_same_message() {
    let formatter = demo_table();
    let image = demo_image();
    let whole = parse_whole(&formatter, &image).expect("parses");

    for split in 0..=image.len() {
        let resumed = parse_split(&formatter, &image, split).expect("parses");
        assert_eq!(resumed, whole, "split at {split}");
    }
}

#[test]
fn chunked_delivery_matches_one_shot_parsing() {
    let formatter = demo_table();
    let image = demo_image();
    let whole = parse_whole(&formatter, &image).expect("parses");

    for chunk in 1..=image.len() {
        let messages = parse_in_chunks(&formatter, &image, chunk).expect("parses");
        assert_eq!(messages, vec![whole.clone()], "chunk size {chunk}");
    }
}

#[test]
fn two_consecutive_messages_parse_from_one_stream() {
    let formatter = demo_table();
    let mut stream = demo_image();
    stream.extend_from_slice(&demo_image());

    let messages = parse_in_chunks(&formatter, &stream, 5).expect("parses");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], messages[1]);
}

// ---------------------------------------------------------------------------
// Fixed-width padding
// ---------------------------------------------------------------------------

fn scenario_table() -> MessageFormatter {
    MessageFormatter::builder()
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
        .build()
        .expect("valid table")
}

#[test]
fn fixed_width_fields_pad_to_their_declared_widths() {
    let formatter = scenario_table();
    let mut message = Message::new();
    message.set_text(n(3), "AB");
    message.set_text(n(11), "7");

    let mut ctx = FormatterContext::new();
    formatter.format(&message, &mut ctx).expect("formats");
    assert_eq!(ctx.bytes(), b"AB    \x00\x07");

    let parsed = parse_whole(&formatter, ctx.bytes()).expect("parses");
    assert_eq!(parsed.text(n(3)), Some("AB"));
    assert_eq!(parsed.text(n(11)), Some("7"));
}

#[test]
fn oversized_values_fail_instead_of_truncating() {
    let formatter = scenario_table();
    let mut message = Message::new();
    message.set_text(n(3), "ABCDEFG");

    let mut ctx = FormatterContext::new();
    let err = formatter
        .format(&message, &mut ctx)
        .expect_err("seven characters cannot fit six");
    let CodecError::Protocol(ProtocolError::Field { number, source }) = err else {
        panic!("expected a field error, got {err:?}");
    };
    assert_eq!(number, n(3));
    assert!(matches!(
        *source,
        ProtocolError::FixedLengthMismatch {
            expected: 6,
            actual: 7,
        }
    ));
}

// ---------------------------------------------------------------------------
// Sensitive-field rendering
// ---------------------------------------------------------------------------

#[test]
fn card_numbers_render_masked_in_descriptions() {
    let described = demo_table().schema().describe(&demo_message());

    assert!(described.contains("************0002"));
    assert!(!described.contains("4000000000000002"));
    assert!(described.contains("52: (redacted)"));
}

#[test]
fn wire_dumps_mask_the_recorded_ranges() {
    let formatter = demo_table();
    let mut ctx = FormatterContext::new();
    formatter
        .format(&demo_message(), &mut ctx)
        .expect("formats");

    let dump = redacted_hex_dump(ctx.bytes(), ctx.redacted_ranges());
    assert!(
        dump.contains("** ** ** ** ** ** ** **"),
        "card bytes are masked: {dump}"
    );
    assert!(
        !dump.contains("40 00 00 00 00 00 00 02"),
        "card bytes leaked: {dump}"
    );
    assert!(!dump.contains("AA BB"), "PIN block leaked: {dump}");
}
