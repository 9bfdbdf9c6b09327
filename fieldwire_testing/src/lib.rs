//! Utilities for driving [`MessageFormatter`](fieldwire::MessageFormatter)
//! instances with partial input during tests.
//!
//! The fixtures build one shared demonstration table, message, and wire
//! image; the drivers feed an image to a formatter whole, split, in fixed
//! chunks, or through a framed in-memory transport.
//!
//! ```rust
//! use fieldwire_testing::{demo_image, demo_table, parse_whole};
//!
//! let message = parse_whole(&demo_table(), &demo_image()).expect("demo image parses");
//! // five plain fields plus the stored bitmap at field 1
//! assert_eq!(message.len(), 6);
//! ```

pub mod drivers;
pub mod fixtures;

pub use drivers::{decode_framed, parse_in_chunks, parse_split, parse_whole};
pub use fixtures::{demo_image, demo_message, demo_redacted_ranges, demo_table};
