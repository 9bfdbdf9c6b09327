//! Presence bitmaps declaring which field numbers follow on the wire.

use crate::{error::ConfigError, message::FieldNumber};

/// Fixed-size bit vector flagging field presence over a contiguous range.
///
/// A bitmap covers the inclusive range `lower..=upper`. Bits are laid out
/// most-significant-bit first: the bit for `lower` is bit 7 of byte 0. After
/// recomputation the owning formatter guarantees `bit(n)` is set exactly when
/// field `n` is present in the message.
///
/// # Examples
///
/// ```
/// use fieldwire::message::{Bitmap, FieldNumber};
///
/// let mut bitmap = Bitmap::new(FieldNumber::new(2), FieldNumber::new(65));
/// bitmap.set(FieldNumber::new(2), true).expect("covered");
/// assert!(bitmap.is_set(FieldNumber::new(2)));
/// assert!(!bitmap.is_set(FieldNumber::new(3)));
/// assert_eq!(bitmap.as_bytes()[0], 0x80);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    lower: FieldNumber,
    upper: FieldNumber,
    bits: Vec<u8>,
}

impl Bitmap {
    /// Create an empty bitmap covering `lower..=upper`.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`. Use [`Bitmap::try_new`] when the range
    /// comes from untrusted configuration.
    #[must_use]
    pub fn new(lower: FieldNumber, upper: FieldNumber) -> Self {
        assert!(lower <= upper, "invalid bitmap range");
        let bits = vec![0; byte_len(lower, upper)];
        Self { lower, upper, bits }
    }

    /// Fallible constructor validating the covered range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBitmapRange`] if `lower > upper`.
    pub fn try_new(lower: FieldNumber, upper: FieldNumber) -> Result<Self, ConfigError> {
        if lower > upper {
            return Err(ConfigError::InvalidBitmapRange { lower, upper });
        }
        Ok(Self::new(lower, upper))
    }

    /// Rebuild a bitmap from wire bytes.
    ///
    /// `bytes` must hold exactly [`Bitmap::byte_len`] bytes for the range;
    /// callers slice the wire image accordingly before decoding.
    #[must_use]
    pub(crate) fn from_wire(lower: FieldNumber, upper: FieldNumber, bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), byte_len(lower, upper));
        Self {
            lower,
            upper,
            bits: bytes.to_vec(),
        }
    }

    /// First field number the bitmap covers.
    #[must_use]
    pub const fn lower(&self) -> FieldNumber { self.lower }

    /// Last field number the bitmap covers.
    #[must_use]
    pub const fn upper(&self) -> FieldNumber { self.upper }

    /// Number of wire bytes the bitmap occupies before data encoding.
    #[must_use]
    pub fn byte_len(&self) -> usize { self.bits.len() }

    /// Whether `number` falls inside the covered range.
    #[must_use]
    pub fn covers(&self, number: FieldNumber) -> bool {
        self.lower <= number && number <= self.upper
    }

    /// Whether the bit for `number` is set. Uncovered numbers read as unset.
    #[must_use]
    pub fn is_set(&self, number: FieldNumber) -> bool {
        let Some((byte, mask)) = self.position(number) else {
            return false;
        };
        self.bits[byte] & mask != 0
    }

    /// Set or clear the bit for `number`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProtocolError::OutsideBitmapRange`] if `number` is not
    /// covered by this bitmap.
    pub fn set(
        &mut self,
        number: FieldNumber,
        present: bool,
    ) -> Result<(), crate::ProtocolError> {
        let Some((byte, mask)) = self.position(number) else {
            return Err(crate::ProtocolError::OutsideBitmapRange {
                number,
                lower: self.lower,
                upper: self.upper,
            });
        };
        if present {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
        Ok(())
    }

    /// Clear every bit.
    pub fn clear(&mut self) { self.bits.fill(0); }

    /// Iterate the covered field numbers whose bits are set, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = FieldNumber> + '_ {
        let lower = self.lower.get();
        let upper = self.upper.get();
        (lower..=upper)
            .map(FieldNumber::new)
            .filter(|n| self.is_set(*n))
    }

    /// Raw bitmap bytes, most-significant-bit first.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bits }

    fn position(&self, number: FieldNumber) -> Option<(usize, u8)> {
        if !self.covers(number) {
            return None;
        }
        let offset = usize::from(number.get() - self.lower.get());
        Some((offset / 8, 0x80 >> (offset % 8)))
    }
}

/// Wire size in bytes of a bitmap covering `lower..=upper`.
#[must_use]
pub(crate) fn byte_len(lower: FieldNumber, upper: FieldNumber) -> usize {
    let span = usize::from(upper.get() - lower.get()) + 1;
    span.div_ceil(8)
}
