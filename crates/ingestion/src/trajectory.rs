//! Ground-truth trajectory files.
//!
//! `global_pose.csv` holds `stamp` plus a row-major 3×4 `[R | t]` matrix per row.
//! `global_coors.csv` is derived from it: `stamp,x,y,z,qx,qy,qz,qw`, with the
//! orientation taken from the nearest IMU sample.

use std::path::Path;

use contracts::{PoseRecord, Quaternion, RawPose, SchemaVersion, Timestamp};
use sync_engine::attach_orientation;
use tracing::{info, instrument};

use crate::error::{IngestionError, Result};
use crate::rows::{read_rows, RowCursor, RowSchema};
use crate::schema::DatasetSchema;

struct PoseMatrix([[f64; 4]; 3]);

impl RowSchema for PoseMatrix {
    const FILE: &'static str = "global_pose";

    fn columns(_: SchemaVersion) -> usize {
        13
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        let mut matrix = [[0.0; 4]; 3];
        for value in matrix.iter_mut().flatten() {
            *value = row.f64()?;
        }
        Ok(Self(matrix))
    }
}

struct Coordinates {
    position: [f64; 3],
    orientation: Quaternion,
}

impl RowSchema for Coordinates {
    const FILE: &'static str = "global_coors";

    fn columns(_: SchemaVersion) -> usize {
        8
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        let position = [row.f64()?, row.f64()?, row.f64()?];
        let orientation = Quaternion::new(row.f64()?, row.f64()?, row.f64()?, row.f64()?);
        Ok(Self {
            position,
            orientation,
        })
    }
}

/// Reads `global_pose.csv`
pub fn read_global_poses(path: &Path) -> Result<Vec<RawPose>> {
    Ok(read_rows::<PoseMatrix>(path, SchemaVersion::V1)?
        .into_iter()
        .map(|(timestamp, PoseMatrix(matrix))| RawPose { timestamp, matrix })
        .collect())
}

/// Reads `global_coors.csv`
pub fn read_global_coords(path: &Path) -> Result<Vec<PoseRecord>> {
    Ok(read_rows::<Coordinates>(path, SchemaVersion::V1)?
        .into_iter()
        .map(|(timestamp, c)| PoseRecord {
            timestamp,
            position: c.position,
            orientation: c.orientation,
        })
        .collect())
}

/// Writes `stamp,x,y,z,qx,qy,qz,qw` rows without a header
pub fn write_global_coords(path: &Path, poses: &[PoseRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| IngestionError::csv(path, e))?;

    for pose in poses {
        let [x, y, z] = pose.position;
        let q = pose.orientation;
        let row: [String; 8] = [
            pose.timestamp.to_string(),
            x.to_string(),
            y.to_string(),
            z.to_string(),
            q.x.to_string(),
            q.y.to_string(),
            q.z.to_string(),
            q.w.to_string(),
        ];
        writer
            .write_record(&row)
            .map_err(|e| IngestionError::csv(path, e))?;
    }
    writer.flush().map_err(|e| IngestionError::io(path, e))
}

/// Derives `global_coors.csv` from `global_pose.csv` and the IMU orientations.
///
/// # Errors
/// [`contracts::ContractError::CountMismatch`] when the IMU file has no samples to
/// match against.
#[instrument(name = "build_global_coords", skip_all, fields(dataset = ?schema.layout().name()))]
pub fn build_global_coords(schema: &DatasetSchema, imu_version: u8) -> Result<Vec<PoseRecord>> {
    let layout = schema.layout();
    let poses = read_global_poses(&layout.global_pose())?;
    let orientations: Vec<(Timestamp, Quaternion)> = schema
        .imu_samples(imu_version)?
        .into_iter()
        .map(|(t, imu)| (t, imu.orientation))
        .collect();

    let records = attach_orientation(&poses, &orientations)?;

    let out = layout.global_coords();
    write_global_coords(&out, &records)?;
    info!(poses = records.len(), path = %out.display(), "ground truth written");
    Ok(records)
}
