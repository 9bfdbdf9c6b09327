//! Tests for bitmap bit layout, range checks, and iteration order.

use rstest::rstest;

use crate::{ProtocolError, message::*};

fn range(lower: u16, upper: u16) -> Bitmap {
    Bitmap::new(FieldNumber::new(lower), FieldNumber::new(upper))
}

#[rstest]
#[case(2, 65, 8)]
#[case(1, 8, 1)]
#[case(1, 9, 2)]
#[case(5, 5, 1)]
fn bitmap_rounds_byte_length_up(#[case] lower: u16, #[case] upper: u16, #[case] bytes: usize) {
    assert_eq!(range(lower, upper).byte_len(), bytes);
}

#[test]
fn lowest_covered_number_maps_to_high_bit_of_first_byte() {
    let mut bitmap = range(2, 65);
    bitmap.set(FieldNumber::new(2), true).expect("covered");
    assert_eq!(bitmap.as_bytes()[0], 0x80);

    bitmap.set(FieldNumber::new(2), false).expect("covered");
    bitmap.set(FieldNumber::new(9), true).expect("covered");
    assert_eq!(bitmap.as_bytes(), &[0x01, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn bits_survive_a_wire_round_trip() {
    let mut bitmap = range(2, 65);
    for number in [2, 3, 11, 64] {
        bitmap.set(FieldNumber::new(number), true).expect("covered");
    }
    let rebuilt = Bitmap::from_wire(
        FieldNumber::new(2),
        FieldNumber::new(65),
        bitmap.as_bytes(),
    );
    assert_eq!(rebuilt, bitmap);
    let set: Vec<u16> = rebuilt.iter_set().map(FieldNumber::get).collect();
    assert_eq!(set, vec![2, 3, 11, 64]);
}

#[test]
fn setting_an_uncovered_number_is_rejected() {
    let mut bitmap = range(2, 65);
    let err = bitmap
        .set(FieldNumber::new(66), true)
        .expect_err("66 is outside 2..=65");
    assert!(matches!(
        err,
        ProtocolError::OutsideBitmapRange { number, .. } if number == FieldNumber::new(66)
    ));
}

#[test]
fn uncovered_numbers_read_as_unset() {
    let bitmap = range(2, 65);
    assert!(!bitmap.is_set(FieldNumber::new(1)));
    assert!(!bitmap.is_set(FieldNumber::new(66)));
}

#[test]
fn inverted_range_is_a_config_error() {
    let err = Bitmap::try_new(FieldNumber::new(10), FieldNumber::new(2))
        .expect_err("inverted range must be rejected");
    let rendered = err.to_string();
    assert!(rendered.contains("10"), "bounds missing from {rendered:?}");
}

#[test]
fn clear_resets_every_bit() {
    let mut bitmap = range(2, 65);
    bitmap.set(FieldNumber::new(40), true).expect("covered");
    bitmap.clear();
    assert_eq!(bitmap.iter_set().count(), 0);
}
