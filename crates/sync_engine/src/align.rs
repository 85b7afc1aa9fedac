//! Nearest-neighbour pose alignment. No interpolation is performed.

use contracts::{AlignedPose, ContractError, PoseRecord, Quaternion, RawPose, Timestamp};
use tracing::instrument;

use crate::match_nearest;

/// Assigns the nearest trajectory pose to every target stamp.
///
/// Output rows are numbered sequentially from 0 and keep the pose's own stamp.
#[instrument(
    name = "align_poses",
    skip_all,
    fields(targets = targets.len(), poses = trajectory.len())
)]
pub fn align_poses(
    targets: &[Timestamp],
    trajectory: &[PoseRecord],
) -> Result<Vec<AlignedPose>, ContractError> {
    let stamps: Vec<Timestamp> = trajectory.iter().map(|p| p.timestamp).collect();
    let indices = match_nearest(targets, &stamps)?;

    Ok(targets
        .iter()
        .zip(indices)
        .enumerate()
        .map(|(frame_index, (&frame_timestamp, pose_index))| AlignedPose {
            frame_index,
            frame_timestamp,
            pose: trajectory[pose_index],
        })
        .collect())
}

/// Builds position + orientation records from raw `[R | t]` poses, taking the
/// orientation from the nearest IMU sample.
///
/// # Errors
/// [`ContractError::CountMismatch`] if not every pose received an orientation.
#[instrument(
    name = "attach_orientation",
    skip_all,
    fields(poses = poses.len(), imu = orientations.len())
)]
pub fn attach_orientation(
    poses: &[RawPose],
    orientations: &[(Timestamp, Quaternion)],
) -> Result<Vec<PoseRecord>, ContractError> {
    let pose_stamps: Vec<Timestamp> = poses.iter().map(|p| p.timestamp).collect();
    let imu_stamps: Vec<Timestamp> = orientations.iter().map(|(t, _)| *t).collect();
    let indices = match_nearest(&pose_stamps, &imu_stamps)
        .map_err(|_| ContractError::count_mismatch("pose orientations", poses.len(), 0))?;

    if indices.len() != poses.len() {
        return Err(ContractError::count_mismatch(
            "pose orientations",
            poses.len(),
            indices.len(),
        ));
    }

    Ok(poses
        .iter()
        .zip(indices)
        .map(|(pose, imu_index)| PoseRecord {
            timestamp: pose.timestamp,
            position: pose.translation(),
            orientation: orientations[imu_index].1,
        })
        .collect())
}
