pub mod aggregate;
pub mod datasets;
pub mod event;
pub mod features;
pub mod segment;
pub mod source;
pub mod weapons;

pub use segment::{segment, SegmentError};
pub use source::{EventSource, SourceError};
