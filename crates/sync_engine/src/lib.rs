//! # Sync Engine
//!
//! Timestamp alignment core of the converter.
//!
//! Responsibilities:
//! - Nearest-timestamp matching between two series ([`match_nearest`])
//! - Dual-head stamp pairing under skew bounds ([`merge_stamps`])
//! - Scan geometry: calibration transforms, concatenation, SICK polar grid
//! - K-way time-ordered merge of sorted record streams ([`fuse`])
//! - Nearest-neighbour pose alignment ([`align_poses`])
//!
//! Everything here is pure computation over in-memory data; file access lives in
//! `ingestion`.
//!
//! ## Example
//!
//! ```
//! use contracts::SkewBounds;
//! use sync_engine::{fuse, match_nearest, merge_stamps};
//!
//! let pairs = merge_stamps(&[0, 100_000_000], &[20_000_000, 120_000_000], &SkewBounds::default())?;
//! assert_eq!(pairs.len(), 2);
//!
//! assert_eq!(match_nearest(&[11, 19], &[10, 20])?, vec![0, 1]);
//!
//! let ordered: Vec<i64> = fuse([vec![1, 5], vec![2, 3]]).collect();
//! assert_eq!(ordered, vec![1, 2, 3, 5]);
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod align;
mod fuse;
mod geometry;
mod matcher;
mod merge;

pub use align::{align_poses, attach_orientation};
pub use fuse::{fuse, TimeOrderedMerge};
pub use geometry::{
    merge_scans, sick_beam_angle_deg, sick_to_cartesian, transform_points, PointScan,
    SICK_BEAM_COUNT,
};
pub use matcher::match_nearest;
pub use merge::merge_stamps;
