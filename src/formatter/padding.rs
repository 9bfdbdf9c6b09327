//! Padding policy applied by text formatters.

use crate::encoding::PadSide;

/// How a text value is padded to a fixed length and unpadded on the way back.
///
/// Padding only ever lengthens a short value; a value longer than the target
/// passes through untouched so the length manager can reject it. Stripping is
/// the inverse applied after parse, with one guard: a value that was nothing
/// but fill characters strips to a single fill character rather than an empty
/// string, so an all-zero numeric field survives a round trip as `"0"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Padding {
    fill: char,
    side: PadSide,
}

impl Padding {
    /// Left-justified text: spaces appended on the right.
    pub const SPACES_RIGHT: Self = Self {
        fill: ' ',
        side: PadSide::Right,
    };
    /// Right-justified numerics: zeroes prepended on the left.
    pub const ZEROS_LEFT: Self = Self {
        fill: '0',
        side: PadSide::Left,
    };

    /// Create a policy with an arbitrary fill character and side.
    #[must_use]
    pub const fn new(fill: char, side: PadSide) -> Self { Self { fill, side } }

    /// Pad `value` to `target` characters; longer values pass through.
    #[must_use]
    pub fn pad(&self, value: &str, target: usize) -> String {
        let current = value.chars().count();
        if current >= target {
            return value.to_owned();
        }
        let fill: String = std::iter::repeat_n(self.fill, target - current).collect();
        match self.side {
            PadSide::Left => fill + value,
            PadSide::Right => value.to_owned() + &fill,
        }
    }

    /// Remove fill characters from the padded side.
    #[must_use]
    pub fn strip(&self, value: &str) -> String {
        let stripped = match self.side {
            PadSide::Left => value.trim_start_matches(self.fill),
            PadSide::Right => value.trim_end_matches(self.fill),
        };
        if stripped.is_empty() && !value.is_empty() {
            return self.fill.to_string();
        }
        stripped.to_owned()
    }
}
