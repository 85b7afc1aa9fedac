//! # Dispatcher
//!
//! Export side of the converter.
//!
//! Responsibilities:
//! - Consume the fused, time-ordered `SensorRecord` stream
//! - Fan out to every configured sink, stopping at the first failure
//! - Sinks: PCD frames, MCAP recording, log summary
//! - `aligned_poses.txt` for exported PCD frames

pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod poses;
pub mod sinks;

pub use contracts::{DataSink, SensorRecord};
pub use dispatcher::{
    create_dispatcher, create_sink, dispatch, DispatchSummary, Dispatcher, DispatcherBuilder,
    DispatcherConfig, SinkSpec,
};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use poses::write_aligned_poses;
pub use sinks::{LogSink, PcdSink, RecordSink};
