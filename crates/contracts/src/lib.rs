//! # Contracts
//!
//! Shared data model for the KAIST Urban Complex converter. Every other crate in the
//! workspace depends on this one; it never depends back on them.
//!
//! ## Time Model
//! - Sensor timestamps are nanoseconds since the epoch as `i64` ([`Timestamp`])
//! - Timestamps are non-decreasing within one sensor's own series, never globally unique

mod calibration;
mod config;
mod error;
mod pose;
mod sensor;
mod sensor_id;
mod sink;
mod sync;

pub use calibration::CalibrationTransform;
pub use config::*;
pub use error::*;
pub use pose::{AlignedPose, PoseRecord, RawPose};
pub use sensor::*;
pub use sensor_id::SensorId;
pub use sink::DataSink;
pub use sync::*;
