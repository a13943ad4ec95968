/// Duration string conversion
pub mod duration;

/// Exclusive state CSV loader
pub mod table;

pub use duration::{duration_seconds, parse_duration};
pub use table::{StateDuration, StateRow, StateTable};
