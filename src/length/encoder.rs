//! Fixed-width encoders for wire-carried length prefixes.

use bytes::{BufMut, BytesMut};

use crate::{ConfigError, ProtocolError};

/// Maximum decimal digits a length prefix may carry.
const MAX_DIGITS: u8 = 4;

/// How length digits are laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LengthFlavor {
    /// Two decimal digits per byte, left zero-padded.
    Bcd,
    /// One ASCII decimal digit per byte.
    Ascii,
}

/// A fixed-digit decimal length prefix.
///
/// Capacity comes in discrete tiers of one to four decimal digits; a
/// two-digit encoder carries lengths up to 99, a three-digit one up to 999.
/// BCD encoders pack two digits per byte and zero-pad odd digit counts on
/// the left, so a three-digit BCD prefix occupies two wire bytes.
///
/// # Examples
///
/// ```
/// use fieldwire::length::LengthEncoder;
///
/// let encoder = LengthEncoder::bcd(3).expect("supported tier");
/// assert_eq!(encoder.wire_len(), 2);
/// assert_eq!(encoder.max_value(), 999);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthEncoder {
    flavor: LengthFlavor,
    digits: u8,
}

impl LengthEncoder {
    /// Two-digit BCD prefix, one wire byte.
    pub const BCD_LL: Self = Self {
        flavor: LengthFlavor::Bcd,
        digits: 2,
    };
    /// Three-digit BCD prefix, two wire bytes.
    pub const BCD_LLL: Self = Self {
        flavor: LengthFlavor::Bcd,
        digits: 3,
    };
    /// Two-digit ASCII prefix.
    pub const ASCII_LL: Self = Self {
        flavor: LengthFlavor::Ascii,
        digits: 2,
    };
    /// Three-digit ASCII prefix.
    pub const ASCII_LLL: Self = Self {
        flavor: LengthFlavor::Ascii,
        digits: 3,
    };

    /// Create a BCD length encoder with the given digit capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedDigits`] when `digits` is outside
    /// `1..=4`.
    pub const fn bcd(digits: u8) -> Result<Self, ConfigError> {
        Self::with_flavor(LengthFlavor::Bcd, digits)
    }

    /// Create an ASCII length encoder with the given digit capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedDigits`] when `digits` is outside
    /// `1..=4`.
    pub const fn ascii(digits: u8) -> Result<Self, ConfigError> {
        Self::with_flavor(LengthFlavor::Ascii, digits)
    }

    const fn with_flavor(flavor: LengthFlavor, digits: u8) -> Result<Self, ConfigError> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(ConfigError::UnsupportedDigits { digits });
        }
        Ok(Self { flavor, digits })
    }

    /// Decimal digit capacity of the prefix.
    #[must_use]
    pub const fn digits(self) -> u8 { self.digits }

    /// Wire bytes the prefix occupies.
    #[must_use]
    pub const fn wire_len(self) -> usize {
        match self.flavor {
            LengthFlavor::Bcd => (self.digits as usize).div_ceil(2),
            LengthFlavor::Ascii => self.digits as usize,
        }
    }

    /// Largest length the prefix can carry.
    #[must_use]
    pub const fn max_value(self) -> usize { 10usize.pow(self.digits as u32) - 1 }

    /// Append the wire form of `length` to `dst`.
    ///
    /// Callers bound `length` by [`LengthEncoder::max_value`] first; the
    /// length manager enforces this before delegating here.
    pub fn write_len(self, length: usize, dst: &mut BytesMut) {
        debug_assert!(length <= self.max_value());
        match self.flavor {
            LengthFlavor::Bcd => {
                let nibbles = self.wire_len() * 2;
                let mut remaining = length;
                let mut bytes = vec![0u8; self.wire_len()];
                for position in (0..nibbles).rev() {
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "a decimal digit always fits in u8"
                    )]
                    let digit = (remaining % 10) as u8;
                    remaining /= 10;
                    let shift = if position % 2 == 0 { 4 } else { 0 };
                    bytes[position / 2] |= digit << shift;
                }
                dst.extend_from_slice(&bytes);
            }
            LengthFlavor::Ascii => {
                let digits = self.digits as usize;
                dst.put_slice(format!("{length:0digits$}").as_bytes());
            }
        }
    }

    /// Decode a length from exactly [`LengthEncoder::wire_len`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NonDigitLength`] naming the offending wire
    /// byte when a nibble or character is not a decimal digit.
    pub fn read_len(self, wire: &[u8]) -> Result<usize, ProtocolError> {
        debug_assert_eq!(wire.len(), self.wire_len());
        let mut value = 0usize;
        match self.flavor {
            LengthFlavor::Bcd => {
                for &byte in wire {
                    for nibble in [byte >> 4, byte & 0x0F] {
                        if nibble > 9 {
                            return Err(ProtocolError::NonDigitLength { byte });
                        }
                        value = value * 10 + usize::from(nibble);
                    }
                }
            }
            LengthFlavor::Ascii => {
                for &byte in wire {
                    if !byte.is_ascii_digit() {
                        return Err(ProtocolError::NonDigitLength { byte });
                    }
                    value = value * 10 + usize::from(byte - b'0');
                }
            }
        }
        Ok(value)
    }
}
