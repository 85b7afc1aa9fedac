//! `aligned_poses.txt` writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use contracts::{AlignedPose, ContractError};

/// Writes one `idx stamp x y z qx qy qz qw` line per aligned frame.
///
/// Floats keep a fractional part (`3.0`, not `3`).
pub fn write_aligned_poses(path: &Path, poses: &[AlignedPose]) -> Result<(), ContractError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for aligned in poses {
        let pose = &aligned.pose;
        let [x, y, z] = pose.position;
        let q = pose.orientation;
        writeln!(
            writer,
            "{} {} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
            aligned.frame_index, pose.timestamp, x, y, z, q.x, q.y, q.z, q.w
        )?;
    }
    writer.flush()?;
    Ok(())
}
