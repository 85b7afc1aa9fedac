//! Vehicle trajectory types used by ground-truth export and pose alignment

use serde::{Deserialize, Serialize};

use crate::{Quaternion, Timestamp, Timestamped};

/// One row of `global_pose.csv`: stamp plus a 3x4 row-major `[R | t]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPose {
    pub timestamp: Timestamp,
    pub matrix: [[f64; 4]; 3],
}

impl RawPose {
    /// Translation column of the pose matrix
    pub fn translation(&self) -> [f64; 3] {
        [self.matrix[0][3], self.matrix[1][3], self.matrix[2][3]]
    }
}

impl Timestamped for RawPose {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Position plus orientation at a timestamp (one row of `global_coors.csv`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub timestamp: Timestamp,
    pub position: [f64; 3],
    pub orientation: Quaternion,
}

impl Timestamped for PoseRecord {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Trajectory pose assigned to the `frame_index`-th exported lidar frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPose {
    pub frame_index: usize,
    /// Stamp of the lidar frame, not of the trajectory sample
    pub frame_timestamp: Timestamp,
    pub pose: PoseRecord,
}
