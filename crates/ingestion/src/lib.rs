//! # Ingestion
//!
//! File-level access to a KAIST Urban Complex dataset directory.
//!
//! Responsibilities:
//! - Locate every sensor file below a dataset root ([`DatasetLayout`])
//! - Parse stamp lists, CSV rows, scans and calibration files
//! - Expose one accessor per sensor ([`DatasetSchema`])
//! - Build and reuse the merged dual-head scan cache ([`materialize`])
//! - Fuse selected sensors into one time-ordered stream ([`fuse_dataset`])
//! - Derive ground-truth coordinates ([`build_global_coords`])
//!
//! ## Usage Example
//!
//! ```no_run
//! use contracts::{LidarMode, SchemaVersions, SensorKind};
//! use ingestion::{fuse_dataset, DatasetSchema};
//!
//! let schema = DatasetSchema::new("/data/urban39");
//! let stream = fuse_dataset(
//!     &schema,
//!     &[SensorKind::Vlp, SensorKind::Imu, SensorKind::VrsGps],
//!     LidarMode::Merged,
//!     SchemaVersions::default(),
//! )?;
//! for record in stream {
//!     println!("{} {}", record.timestamp, record.sensor_id);
//! }
//! # Ok::<(), ingestion::IngestionError>(())
//! ```

mod error;
mod fuse;
mod layout;
mod materialize;
mod reader;
mod rows;
mod schema;
mod trajectory;

// Re-exports
pub use error::{IngestionError, Result};
pub use fuse::{fuse_dataset, RecordStream};
pub use layout::{DatasetLayout, DualHeadRig};
pub use materialize::{materialize, MaterializeReport};
pub use reader::{
    load_scan, read_calibration, read_scan, read_stamps, read_text_scan, write_scan, write_stamps,
};
pub use rows::{read_rows, RowCursor, RowSchema, SensorRow};
pub use schema::{DatasetSchema, DualHeadRecords};
pub use trajectory::{
    build_global_coords, read_global_coords, read_global_poses, write_global_coords,
};
