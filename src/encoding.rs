//! Data encodings converting field payloads to and from wire bytes.
//!
//! Encodings are stateless `Copy` values; formatters embed them directly and
//! share them freely across threads. The payload side of the contract is
//! always a byte slice: text formatters pass the UTF-8 bytes of the field
//! value, binary formatters the raw bytes.

use bytes::{BufMut, BytesMut};

use crate::{ConfigError, ProtocolError};

/// Which side of an odd-length payload receives the BCD pad nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadSide {
    /// Pad before the first digit.
    Left,
    /// Pad after the last digit.
    Right,
}

/// Binary-coded-decimal packing: two decimal digits per wire byte.
///
/// Odd-length payloads gain one pad nibble on the configured side so the
/// digit count survives a round trip; the decoder drops the pad position
/// without validating it, which keeps `0xF`-padded track data readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BcdEncoding {
    pad_nibble: u8,
    pad_side: PadSide,
}

impl BcdEncoding {
    /// Zero nibble before the first digit, the common numeric-field layout.
    pub const LEFT_ZERO: Self = Self {
        pad_nibble: 0x0,
        pad_side: PadSide::Left,
    };
    /// `0xF` nibble after the last digit, as track-2 data is packed.
    pub const RIGHT_F: Self = Self {
        pad_nibble: 0xF,
        pad_side: PadSide::Right,
    };

    /// Create an encoding with a custom pad nibble and side.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPadNibble`] if `pad_nibble` does not fit
    /// in four bits.
    pub const fn new(pad_nibble: u8, pad_side: PadSide) -> Result<Self, ConfigError> {
        if pad_nibble > 0xF {
            return Err(ConfigError::InvalidPadNibble { nibble: pad_nibble });
        }
        Ok(Self {
            pad_nibble,
            pad_side,
        })
    }

    /// The configured pad nibble.
    #[must_use]
    pub const fn pad_nibble(self) -> u8 { self.pad_nibble }

    /// The configured pad side.
    #[must_use]
    pub const fn pad_side(self) -> PadSide { self.pad_side }

    fn encode(self, payload: &[u8], dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let mut nibbles = Vec::with_capacity(payload.len() + 1);
        let odd = payload.len() % 2 == 1;
        if odd && matches!(self.pad_side, PadSide::Left) {
            nibbles.push(self.pad_nibble);
        }
        for &byte in payload {
            if !byte.is_ascii_digit() {
                return Err(ProtocolError::NonDigitPayload { byte });
            }
            nibbles.push(byte - b'0');
        }
        if odd && matches!(self.pad_side, PadSide::Right) {
            nibbles.push(self.pad_nibble);
        }
        for pair in nibbles.chunks_exact(2) {
            dst.put_u8(pair[0] << 4 | pair[1]);
        }
        Ok(())
    }

    fn decode(self, wire: &[u8], payload_len: usize) -> Result<Vec<u8>, ProtocolError> {
        debug_assert_eq!(wire.len(), payload_len.div_ceil(2));
        let offset = match self.pad_side {
            PadSide::Left if payload_len % 2 == 1 => 1,
            PadSide::Left | PadSide::Right => 0,
        };
        let mut digits = Vec::with_capacity(payload_len);
        for position in offset..offset + payload_len {
            let byte = wire[position / 2];
            let nibble = if position % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            if nibble > 9 {
                return Err(ProtocolError::NonDigitNibble { byte });
            }
            digits.push(b'0' + nibble);
        }
        Ok(digits)
    }
}

/// A data-encoding strategy shared by text and binary formatters.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use fieldwire::encoding::DataEncoding;
///
/// let mut wire = BytesMut::new();
/// DataEncoding::BCD.encode(b"007", &mut wire).expect("digits");
/// assert_eq!(&wire[..], &[0x00, 0x07]);
/// assert_eq!(DataEncoding::BCD.decode(&wire, 3).expect("valid"), b"007");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataEncoding {
    /// Bytes pass through unchanged.
    Plain,
    /// Two decimal digits per byte.
    Bcd(BcdEncoding),
    /// Each payload byte as two uppercase hex characters.
    Hex,
}

impl DataEncoding {
    /// Identity encoding.
    pub const PLAIN: Self = Self::Plain;
    /// BCD with a leading zero pad nibble.
    pub const BCD: Self = Self::Bcd(BcdEncoding::LEFT_ZERO);
    /// BCD with a trailing `0xF` pad nibble.
    pub const BCD_RIGHT_F: Self = Self::Bcd(BcdEncoding::RIGHT_F);
    /// Hex-character encoding.
    pub const HEX: Self = Self::Hex;

    /// Wire bytes produced for a payload of `payload_len` bytes.
    #[must_use]
    pub const fn encoded_len(self, payload_len: usize) -> usize {
        match self {
            Self::Plain => payload_len,
            Self::Bcd(_) => payload_len.div_ceil(2),
            Self::Hex => payload_len * 2,
        }
    }

    /// Append the wire form of `payload` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NonDigitPayload`] when a BCD encoding meets a
    /// byte outside `'0'..='9'`, naming the offending byte.
    pub fn encode(self, payload: &[u8], dst: &mut BytesMut) -> Result<(), ProtocolError> {
        match self {
            Self::Plain => {
                dst.extend_from_slice(payload);
                Ok(())
            }
            Self::Bcd(bcd) => bcd.encode(payload, dst),
            Self::Hex => {
                dst.extend_from_slice(hex::encode_upper(payload).as_bytes());
                Ok(())
            }
        }
    }

    /// Decode `payload_len` payload bytes from their wire form.
    ///
    /// `wire` must hold exactly [`DataEncoding::encoded_len`] bytes; the
    /// caller slices the buffered image accordingly before decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NonDigitNibble`] for a BCD nibble outside
    /// `0..=9` (the pad position is not validated) and
    /// [`ProtocolError::InvalidHex`] for malformed hex characters.
    pub fn decode(self, wire: &[u8], payload_len: usize) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Plain => {
                debug_assert_eq!(wire.len(), payload_len);
                Ok(wire.to_vec())
            }
            Self::Bcd(bcd) => bcd.decode(wire, payload_len),
            Self::Hex => {
                debug_assert_eq!(wire.len(), payload_len * 2);
                Ok(hex::decode(wire)?)
            }
        }
    }
}
