//! Tests for table construction and its validation rules.

use crate::{
    ConfigError,
    context::FormatterContext,
    encoding::DataEncoding,
    formatter::{FieldFormatter, MessageFormatter},
    length::{LengthEncoder, LengthManager},
    message::{FieldNumber, Message},
};

use super::fixtures::{ascii_var, n};

fn text_field() -> FieldFormatter {
    FieldFormatter::text(LengthManager::fixed(2), DataEncoding::PLAIN)
}

#[test]
fn duplicate_registration_is_rejected() {
    let err = MessageFormatter::builder()
        .field(n(2), text_field())
        .expect("fresh number")
        .field(n(2), text_field())
        .expect_err("second registration at 2");
    assert_eq!(err, ConfigError::DuplicateFormatter { number: n(2) });
}

#[test]
fn the_header_sentinel_cannot_be_registered_as_a_field() {
    let err = MessageFormatter::builder()
        .field(FieldNumber::HEADER, text_field())
        .expect_err("the sentinel is reserved");
    assert_eq!(
        err,
        ConfigError::ReservedFieldNumber {
            number: FieldNumber::HEADER
        }
    );
}

#[test]
fn announcing_tag_capacity_is_checked_at_registration() {
    let formatter = FieldFormatter::announcing(
        ascii_var(1, 99),
        LengthEncoder::ASCII_LL,
        false,
        DataEncoding::PLAIN,
    );
    let err = MessageFormatter::builder()
        .field(n(123), formatter)
        .expect_err("123 does not fit two tag digits");
    assert_eq!(
        err,
        ConfigError::LengthCapacityExceeded {
            max: 123,
            digits: 2,
            capacity: 99
        }
    );
}

#[test]
fn packet_header_hex_left_pads_odd_digit_counts() {
    let formatter = MessageFormatter::builder()
        .packet_header_hex("F30")
        .expect("valid hex")
        .build()
        .expect("valid table");

    let mut ctx = FormatterContext::new();
    formatter
        .format(&Message::new(), &mut ctx)
        .expect("empty table formats");
    assert_eq!(ctx.bytes(), [0x0F, 0x30]);
}

#[test]
fn malformed_packet_header_hex_is_rejected() {
    let err = MessageFormatter::builder()
        .packet_header_hex("XY")
        .expect_err("not hex digits");
    assert!(matches!(err, ConfigError::InvalidPacketHeaderHex { .. }));
}

#[test]
fn an_empty_table_formats_an_empty_image() {
    let formatter = MessageFormatter::builder().build().expect("valid table");
    let mut ctx = FormatterContext::new();
    formatter
        .format(&Message::new(), &mut ctx)
        .expect("nothing to lay out");
    assert!(ctx.is_empty());
}
