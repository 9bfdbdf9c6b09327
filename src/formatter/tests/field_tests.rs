//! Tests for the per-field codecs in isolation.

use rstest::rstest;

use crate::{
    ConfigError, ProtocolError,
    context::{FormatterContext, ParserContext},
    encoding::DataEncoding,
    formatter::{Compression, FieldFormatter, Padding},
    length::{LengthEncoder, LengthManager},
    message::{Bitmap, Field, FieldNumber, Message},
};

use super::fixtures::{ascii_var, inner_table, n};

fn format_field(formatter: &FieldFormatter, field: &Field) -> Vec<u8> {
    let mut ctx = FormatterContext::new();
    formatter
        .format(field, &mut ctx, false)
        .expect("field formats");
    ctx.take().to_vec()
}

fn parse_field(formatter: &FieldFormatter, number: FieldNumber, wire: &[u8]) -> Field {
    let mut ctx = ParserContext::new();
    ctx.feed(wire);
    formatter
        .parse(number, &mut ctx, false)
        .expect("wire is well formed")
        .expect("wire is complete")
}

fn parse_error(formatter: &FieldFormatter, number: FieldNumber, wire: &[u8]) -> ProtocolError {
    let mut ctx = ParserContext::new();
    ctx.feed(wire);
    formatter
        .parse(number, &mut ctx, false)
        .expect_err("wire is malformed")
}

#[test]
fn space_padded_text_formats_to_its_fixed_width() {
    let formatter = FieldFormatter::padded_text(
        LengthManager::fixed(6),
        DataEncoding::PLAIN,
        Padding::SPACES_RIGHT,
    );
    let wire = format_field(&formatter, &Field::text(n(3), "AB"));
    assert_eq!(wire, b"AB    ");

    let field = parse_field(&formatter, n(3), &wire);
    assert_eq!(field.as_text(), Some("AB"));
}

#[test]
fn oversized_fixed_values_are_never_truncated() {
    let formatter = FieldFormatter::padded_text(
        LengthManager::fixed(6),
        DataEncoding::PLAIN,
        Padding::SPACES_RIGHT,
    );
    let mut ctx = FormatterContext::new();
    let err = formatter
        .format(&Field::text(n(3), "ABCDEFG"), &mut ctx, false)
        .expect_err("seven characters into a six-character field");
    assert!(matches!(
        err,
        ProtocolError::FixedLengthMismatch {
            expected: 6,
            actual: 7
        }
    ));
}

#[test]
fn bcd_numeric_zero_pads_to_its_digit_count() {
    let formatter = FieldFormatter::padded_text(
        LengthManager::fixed(3),
        DataEncoding::BCD,
        Padding::ZEROS_LEFT,
    );
    let wire = format_field(&formatter, &Field::text(n(11), "7"));
    assert_eq!(wire, [0x00, 0x07]);

    let field = parse_field(&formatter, n(11), &wire);
    assert_eq!(field.as_text(), Some("7"));
}

#[test]
fn variable_binary_carries_its_length_in_bcd() {
    let manager = LengthManager::variable(1, 99, LengthEncoder::BCD_LL).expect("bounds fit");
    let formatter = FieldFormatter::binary(manager, DataEncoding::PLAIN);

    let wire = format_field(&formatter, &Field::binary(n(7), vec![0xDE, 0xAD]));
    assert_eq!(wire, [0x02, 0xDE, 0xAD]);

    let field = parse_field(&formatter, n(7), &wire);
    assert_eq!(field.as_binary(), Some(&[0xDE, 0xAD][..]));
}

#[test]
fn hex_encoding_doubles_binary_on_the_wire() {
    let formatter = FieldFormatter::binary(LengthManager::fixed(2), DataEncoding::HEX);

    let wire = format_field(&formatter, &Field::binary(n(7), vec![0xAB, 0x01]));
    assert_eq!(wire, b"AB01");

    let field = parse_field(&formatter, n(7), &wire);
    assert_eq!(field.as_binary(), Some(&[0xAB, 0x01][..]));
}

#[test]
fn trailer_byte_travels_after_the_value() {
    let manager = LengthManager::variable_with_trailer(1, 99, LengthEncoder::ASCII_LL, 0x03)
        .expect("bounds fit");
    let formatter = FieldFormatter::text(manager, DataEncoding::PLAIN);

    let wire = format_field(&formatter, &Field::text(n(7), "HI"));
    assert_eq!(wire, b"02HI\x03");

    let field = parse_field(&formatter, n(7), &wire);
    assert_eq!(field.as_text(), Some("HI"));
}

#[test]
fn wrong_trailer_byte_is_rejected() {
    let manager = LengthManager::variable_with_trailer(1, 99, LengthEncoder::ASCII_LL, 0x03)
        .expect("bounds fit");
    let formatter = FieldFormatter::text(manager, DataEncoding::PLAIN);

    let err = parse_error(&formatter, n(7), b"02HIX");
    assert!(matches!(
        err,
        ProtocolError::TrailerMismatch {
            expected: 0x03,
            found: b'X'
        }
    ));
}

#[test]
fn value_kind_must_match_the_formatter() {
    let formatter = FieldFormatter::text(LengthManager::fixed(2), DataEncoding::PLAIN);
    let mut ctx = FormatterContext::new();
    let err = formatter
        .format(&Field::binary(n(7), vec![1, 2]), &mut ctx, false)
        .expect_err("binary value into a text formatter");
    assert!(matches!(
        err,
        ProtocolError::WrongValueKind {
            expected: "text",
            found: "binary",
            ..
        }
    ));
}

#[test]
fn parse_suspends_without_losing_the_cached_length() {
    let formatter = FieldFormatter::text(ascii_var(1, 99), DataEncoding::PLAIN);
    let mut ctx = ParserContext::new();

    assert!(
        formatter
            .parse(n(7), &mut ctx, false)
            .expect("no data yet")
            .is_none()
    );

    ctx.feed(b"02");
    assert!(
        formatter
            .parse(n(7), &mut ctx, false)
            .expect("prefix only")
            .is_none()
    );
    assert!(ctx.is_empty(), "the prefix is consumed into the cached length");

    ctx.feed(b"H");
    assert!(
        formatter
            .parse(n(7), &mut ctx, false)
            .expect("half a value")
            .is_none()
    );

    ctx.feed(b"I");
    let field = formatter
        .parse(n(7), &mut ctx, false)
        .expect("value complete")
        .expect("value complete");
    assert_eq!(field.as_text(), Some("HI"));
    assert!(ctx.is_empty());
}

#[test]
fn bitmap_constructor_validates_its_configuration() {
    let inverted = FieldFormatter::bitmap(n(9), n(2), DataEncoding::PLAIN)
        .expect_err("lower above upper");
    assert_eq!(
        inverted,
        ConfigError::InvalidBitmapRange {
            lower: n(9),
            upper: n(2)
        }
    );

    let sentinel = FieldFormatter::bitmap(n(2), FieldNumber::HEADER, DataEncoding::PLAIN)
        .expect_err("the header sentinel is not a field");
    assert_eq!(
        sentinel,
        ConfigError::ReservedFieldNumber {
            number: FieldNumber::HEADER
        }
    );

    let bcd = FieldFormatter::bitmap(n(2), n(64), DataEncoding::BCD)
        .expect_err("bitmap bytes are not digits");
    assert_eq!(bcd, ConfigError::BitmapEncoding);
}

#[test]
fn bitmap_field_has_no_length_prefix() {
    let formatter = FieldFormatter::bitmap(n(2), n(9), DataEncoding::PLAIN).expect("valid range");
    let mut bitmap = Bitmap::new(n(2), n(9));
    bitmap.set(n(2), true).expect("in range");
    bitmap.set(n(9), true).expect("in range");

    let wire = format_field(&formatter, &Field::new(n(1), bitmap));
    assert_eq!(wire, [0x81]);

    let field = parse_field(&formatter, n(1), &wire);
    let parsed = field.bitmap().expect("bitmap value");
    assert!(parsed.is_set(n(2)));
    assert!(parsed.is_set(n(9)));
    assert!(!parsed.is_set(n(5)));
}

#[test]
fn nested_field_round_trips_through_its_envelope() {
    let formatter = FieldFormatter::nested(ascii_var(1, 99), inner_table());
    let mut inner = Message::new();
    inner.set_text(n(2), "99");

    let wire = format_field(&formatter, &Field::nested(n(62), inner));
    assert_eq!(wire, b"040299");

    let field = parse_field(&formatter, n(62), &wire);
    let nested = field.as_nested().expect("nested value");
    assert_eq!(nested.text(n(2)), Some("99"));
}

#[test]
fn nested_value_must_parse_to_completion() {
    let formatter = FieldFormatter::nested(ascii_var(1, 99), inner_table());
    let err = parse_error(&formatter, n(62), b"03029");
    assert!(matches!(err, ProtocolError::NestedTruncated { length: 3 }));
}

#[test]
fn nested_value_must_be_fully_consumed() {
    let formatter = FieldFormatter::nested(ascii_var(1, 99), inner_table());
    let err = parse_error(&formatter, n(62), b"050299X");
    assert!(matches!(
        err,
        ProtocolError::NestedLeftover {
            length: 5,
            remaining: 1
        }
    ));
}

#[rstest]
#[case::tag_outside_the_length(false, b"0248HI".as_slice())]
#[case::tag_folded_into_the_length(true, b"0448HI".as_slice())]
fn announcing_field_writes_length_tag_value(#[case] folded: bool, #[case] wire: &[u8]) {
    let formatter = FieldFormatter::announcing(
        ascii_var(1, 99),
        LengthEncoder::ASCII_LL,
        folded,
        DataEncoding::PLAIN,
    );
    assert_eq!(format_field(&formatter, &Field::text(n(48), "HI")), wire);

    let field = parse_field(&formatter, n(5), wire);
    assert_eq!(field.number(), n(48), "the wire-declared number wins");
    assert_eq!(field.as_text(), Some("HI"));
}

#[test]
fn folded_announcement_must_cover_its_tag() {
    let formatter = FieldFormatter::announcing(
        ascii_var(1, 99),
        LengthEncoder::ASCII_LL,
        true,
        DataEncoding::PLAIN,
    );
    let err = parse_error(&formatter, n(5), b"0148HI");
    assert!(matches!(
        err,
        ProtocolError::AnnouncementLength {
            length: 1,
            tag_len: 2
        }
    ));
}

#[test]
fn announcing_binary_carries_raw_bytes() {
    let formatter = FieldFormatter::announcing_binary(
        ascii_var(1, 99),
        LengthEncoder::ASCII_LL,
        false,
        DataEncoding::HEX,
    );

    let wire = format_field(&formatter, &Field::binary(n(52), vec![0xAA, 0xBB]));
    assert_eq!(wire, b"0252AABB");

    let field = parse_field(&formatter, n(5), &wire);
    assert_eq!(field.number(), n(52), "the wire-declared number wins");
    assert_eq!(field.as_binary(), Some(&[0xAA, 0xBB][..]));
}

#[rstest]
#[case::deflate(Compression::Deflate)]
#[case::gzip(Compression::Gzip)]
fn compressed_text_round_trips(#[case] algorithm: Compression) {
    let manager = LengthManager::variable(1, 999, LengthEncoder::ASCII_LLL).expect("bounds fit");
    let formatter =
        FieldFormatter::compressed_text(manager, DataEncoding::PLAIN, algorithm).expect("plain");
    let text = "repetitive repetitive repetitive repetitive payload";

    let wire = format_field(&formatter, &Field::text(n(7), text));
    let declared: usize = std::str::from_utf8(&wire[..3])
        .expect("ASCII digits")
        .parse()
        .expect("decimal length");
    assert_eq!(declared, wire.len() - 3, "the prefix counts compressed bytes");

    let field = parse_field(&formatter, n(7), &wire);
    assert_eq!(field.as_text(), Some(text));
}

#[test]
fn compressed_binary_round_trips() {
    let manager = LengthManager::variable(1, 999, LengthEncoder::ASCII_LLL).expect("bounds fit");
    let formatter =
        FieldFormatter::compressed_binary(manager, DataEncoding::PLAIN, Compression::Deflate)
            .expect("plain");
    let payload = vec![0x5A; 64];

    let wire = format_field(&formatter, &Field::binary(n(7), payload.clone()));
    let field = parse_field(&formatter, n(7), &wire);
    assert_eq!(field.as_binary(), Some(&payload[..]));
}

#[test]
fn compressed_fields_refuse_bcd_wire_encoding() {
    let manager = LengthManager::variable(1, 999, LengthEncoder::ASCII_LLL).expect("bounds fit");
    let err = FieldFormatter::compressed_text(manager, DataEncoding::BCD, Compression::Deflate)
        .expect_err("compressed bytes are not digits");
    assert_eq!(err, ConfigError::CompressedEncoding);
}
