use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of one field within a message.
///
/// Field numbers order the wire layout: formatting and parsing both walk
/// numbers ascending. The dedicated [`FieldNumber::HEADER`] sentinel binds a
/// formatter to the message header slot instead of a numbered field.
///
/// # Examples
///
/// ```
/// use fieldwire::message::FieldNumber;
/// let n = FieldNumber::new(11);
/// assert_eq!(n.get(), 11);
/// assert!(n < FieldNumber::new(12));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct FieldNumber(u16);

impl FieldNumber {
    /// Sentinel binding a formatter to the message header rather than a
    /// numbered field.
    pub const HEADER: FieldNumber = FieldNumber(u16::MAX);

    /// Create a new field number.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the inner numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// The next field number, saturating at the sentinel boundary.
    #[must_use]
    pub const fn successor(self) -> Self { Self(self.0.saturating_add(1)) }

    /// Whether this is the header sentinel.
    #[must_use]
    pub const fn is_header(self) -> bool { self.0 == u16::MAX }
}
