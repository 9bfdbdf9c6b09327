//! Wire length handling: fixed-width length prefixes and the managers that
//! decide whether a field's size travels on the wire at all.

pub mod encoder;
pub mod manager;

pub use encoder::LengthEncoder;
pub use manager::LengthManager;
