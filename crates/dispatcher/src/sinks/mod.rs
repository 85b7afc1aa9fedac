//! Sink implementations
//!
//! Contains LogSink, PcdSink and RecordSink.

mod log;
mod pcd;
mod record;

pub use self::log::LogSink;
pub use self::pcd::{encode_pcd, intensity_to_u8, scan_to_points, PcdPoint, PcdSink};
pub use self::record::RecordSink;
