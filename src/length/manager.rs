//! Length managers deciding how a field's size is validated and carried.

use bytes::BytesMut;

use crate::{ConfigError, ProtocolError, length::LengthEncoder};

/// Strategy for a field's wire length.
///
/// Fixed-size fields carry no length prefix; the configured constant is the
/// contract, and a payload of any other size is a protocol error rather than
/// a truncation. Variable fields write their length through a
/// [`LengthEncoder`] and bounds-check it in both directions, optionally
/// followed by a single trailer byte after the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthManager {
    /// The field is always exactly `length` payload bytes.
    Fixed {
        /// Constant payload length.
        length: usize,
    },
    /// The payload length travels on the wire ahead of the value.
    Variable {
        /// Smallest admissible payload length.
        min: usize,
        /// Largest admissible payload length.
        max: usize,
        /// Prefix encoding.
        encoder: LengthEncoder,
        /// Byte expected after the value, if any.
        trailer: Option<u8>,
    },
}

impl LengthManager {
    /// A fixed-size manager; the length never appears on the wire.
    #[must_use]
    pub const fn fixed(length: usize) -> Self { Self::Fixed { length } }

    /// A variable-size manager carrying the length in `encoder`'s format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLengthBounds`] when `min > max` and
    /// [`ConfigError::LengthCapacityExceeded`] when `max` does not fit in the
    /// encoder's digit capacity.
    pub const fn variable(
        min: usize,
        max: usize,
        encoder: LengthEncoder,
    ) -> Result<Self, ConfigError> {
        Self::variable_inner(min, max, encoder, None)
    }

    /// Like [`LengthManager::variable`], expecting `trailer` after the value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`LengthManager::variable`].
    pub const fn variable_with_trailer(
        min: usize,
        max: usize,
        encoder: LengthEncoder,
        trailer: u8,
    ) -> Result<Self, ConfigError> {
        Self::variable_inner(min, max, encoder, Some(trailer))
    }

    const fn variable_inner(
        min: usize,
        max: usize,
        encoder: LengthEncoder,
        trailer: Option<u8>,
    ) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidLengthBounds { min, max });
        }
        if max > encoder.max_value() {
            return Err(ConfigError::LengthCapacityExceeded {
                max,
                digits: encoder.digits(),
                capacity: encoder.max_value(),
            });
        }
        Ok(Self::Variable {
            min,
            max,
            encoder,
            trailer,
        })
    }

    /// Wire bytes occupied by the length prefix; zero for fixed fields.
    #[must_use]
    pub const fn prefix_len(&self) -> usize {
        match self {
            Self::Fixed { .. } => 0,
            Self::Variable { encoder, .. } => encoder.wire_len(),
        }
    }

    /// Trailer byte expected after the value, if any.
    #[must_use]
    pub const fn trailer(&self) -> Option<u8> {
        match self {
            Self::Fixed { .. } => None,
            Self::Variable { trailer, .. } => *trailer,
        }
    }

    /// Validate `length` and append its wire form (if any) to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FixedLengthMismatch`] when a fixed-size field
    /// is handed a payload of any other size, and
    /// [`ProtocolError::LengthOutOfRange`] when a variable length falls
    /// outside the configured bounds.
    pub fn write_length(&self, length: usize, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        match *self {
            Self::Fixed { length: expected } => {
                if length != expected {
                    return Err(ProtocolError::FixedLengthMismatch {
                        expected,
                        actual: length,
                    });
                }
                Ok(())
            }
            Self::Variable {
                min, max, encoder, ..
            } => {
                if length < min || length > max {
                    return Err(ProtocolError::LengthOutOfRange { length, min, max });
                }
                encoder.write_len(length, dst);
                Ok(())
            }
        }
    }

    /// Decode the payload length from exactly [`LengthManager::prefix_len`]
    /// wire bytes.
    ///
    /// Fixed managers ignore `wire` and yield their constant; callers need
    /// not buffer anything to learn a fixed field's length.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NonDigitLength`] for malformed prefix bytes
    /// and [`ProtocolError::LengthOutOfRange`] when the decoded value falls
    /// outside the configured bounds.
    pub fn read_length(&self, wire: &[u8]) -> Result<usize, ProtocolError> {
        match *self {
            Self::Fixed { length } => Ok(length),
            Self::Variable {
                min, max, encoder, ..
            } => {
                let length = encoder.read_len(wire)?;
                if length < min || length > max {
                    return Err(ProtocolError::LengthOutOfRange { length, min, max });
                }
                Ok(length)
            }
        }
    }
}
