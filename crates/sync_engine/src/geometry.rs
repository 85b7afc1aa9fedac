//! Point scan geometry: calibration transforms, dual-head concatenation and the
//! SICK polar grid.

use std::sync::OnceLock;

use contracts::{CalibrationTransform, ContractError};
use nalgebra::{Matrix3, Vector3};

/// Number of beams in one SICK scan
pub const SICK_BEAM_COUNT: usize = 286;

const SICK_START_DEG: f64 = -5.0;
const SICK_END_DEG: f64 = 185.5;
const SICK_STEP_DEG: f64 = 0.6667;

/// Row-major matrix of f32 points, as stored in `<timestamp>.bin` files
#[derive(Debug, Clone, PartialEq)]
pub struct PointScan {
    columns: usize,
    data: Vec<f32>,
}

impl PointScan {
    /// # Errors
    /// [`ContractError::InvalidScan`] when `data` is not a whole number of rows.
    pub fn new(columns: usize, data: Vec<f32>) -> Result<Self, ContractError> {
        if columns == 0 || data.len() % columns != 0 {
            return Err(ContractError::invalid_scan(format!(
                "{} values do not form rows of {columns} columns",
                data.len()
            )));
        }
        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.columns
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.columns..(index + 1) * self.columns]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.columns)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Moves every point into the vehicle frame with `p' = p · R + T`.
///
/// The first three columns are treated as the point, the last column is carried
/// through unchanged. The result always has 4 columns.
pub fn transform_points(
    scan: &PointScan,
    calib: &CalibrationTransform,
) -> Result<PointScan, ContractError> {
    if scan.columns < 4 {
        return Err(ContractError::invalid_scan(format!(
            "cannot transform a scan with {} columns, need at least 4",
            scan.columns
        )));
    }

    let r = &calib.rotation;
    // Row-vector product p · R is Rᵀ applied to the column vector p
    let rotation_t = Matrix3::new(
        r[0][0], r[1][0], r[2][0], //
        r[0][1], r[1][1], r[2][1], //
        r[0][2], r[1][2], r[2][2],
    );
    let translation = Vector3::from(calib.translation);

    let mut data = Vec::with_capacity(scan.rows() * 4);
    for row in scan.iter_rows() {
        let p = Vector3::new(row[0] as f64, row[1] as f64, row[2] as f64);
        let q = rotation_t * p + translation;
        data.extend_from_slice(&[q.x as f32, q.y as f32, q.z as f32, row[scan.columns - 1]]);
    }

    Ok(PointScan { columns: 4, data })
}

/// Transforms both heads into the vehicle frame and stacks them, first head first.
pub fn merge_scans(
    first: &PointScan,
    second: &PointScan,
    first_calib: &CalibrationTransform,
    second_calib: &CalibrationTransform,
) -> Result<PointScan, ContractError> {
    let mut merged = transform_points(first, first_calib)?;
    let second = transform_points(second, second_calib)?;
    merged.data.extend_from_slice(&second.data);
    Ok(merged)
}

struct SickGrid {
    cos: Vec<f64>,
    sin: Vec<f64>,
}

fn sick_grid() -> &'static SickGrid {
    static GRID: OnceLock<SickGrid> = OnceLock::new();
    GRID.get_or_init(|| {
        let angles: Vec<f64> = (0..)
            .map(|k| SICK_START_DEG + k as f64 * SICK_STEP_DEG)
            .take_while(|deg| *deg < SICK_END_DEG)
            .map(f64::to_radians)
            .collect();
        SickGrid {
            cos: angles.iter().map(|a| a.cos()).collect(),
            sin: angles.iter().map(|a| a.sin()).collect(),
        }
    })
}

/// Beam angle in degrees for SICK beam `index`
pub fn sick_beam_angle_deg(index: usize) -> f64 {
    SICK_START_DEG + index as f64 * SICK_STEP_DEG
}

/// Converts a 2-column SICK scan `(range, value)` into `(x, y, 0, value)` rows.
///
/// # Errors
/// [`ContractError::InvalidScan`] unless the scan has 2 columns and one row per beam.
pub fn sick_to_cartesian(scan: &PointScan) -> Result<PointScan, ContractError> {
    let grid = sick_grid();
    if scan.columns != 2 || scan.rows() != grid.cos.len() {
        return Err(ContractError::invalid_scan(format!(
            "SICK scan must be {} rows x 2 columns, got {} x {}",
            grid.cos.len(),
            scan.rows(),
            scan.columns
        )));
    }

    let mut data = Vec::with_capacity(scan.rows() * 4);
    for ((row, cos), sin) in scan.iter_rows().zip(&grid.cos).zip(&grid.sin) {
        let range = row[0] as f64;
        data.extend_from_slice(&[(range * cos) as f32, (range * sin) as f32, 0.0, row[1]]);
    }

    Ok(PointScan { columns: 4, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_scan_shape_checked() {
        assert!(PointScan::new(4, vec![0.0; 8]).is_ok());
        assert!(PointScan::new(4, vec![0.0; 7]).is_err());
        assert!(PointScan::new(0, vec![]).is_err());
    }

    #[test]
    fn test_identity_transform_is_noop() {
        let scan = PointScan::new(4, vec![1.5, -2.0, 3.25, 0.7, 0.0, 0.0, 1.0, 0.1]).unwrap();
        let out = transform_points(&scan, &CalibrationTransform::identity()).unwrap();
        assert_eq!(out, scan);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let calib = CalibrationTransform::new(
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [0.0, 0.0, 0.0],
        );
        let scan = PointScan::new(4, vec![1.0, 0.0, 0.0, 0.5, 0.0, 2.0, 0.0, 0.25]).unwrap();
        let out = transform_points(&scan, &calib).unwrap();
        // (1,0,0)·R = first row of R, (0,2,0)·R = 2 × second row
        assert_eq!(out.row(0), &[0.0, -1.0, 0.0, 0.5]);
        assert_eq!(out.row(1), &[2.0, 0.0, 0.0, 0.25]);
    }

    #[test]
    fn test_translation_applied_after_rotation() {
        let calib = CalibrationTransform::new(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [10.0, -1.0, 0.5],
        );
        let scan = PointScan::new(4, vec![1.0, 2.0, 3.0, 9.0]).unwrap();
        let out = transform_points(&scan, &calib).unwrap();
        assert_eq!(out.row(0), &[11.0, 1.0, 3.5, 9.0]);
    }

    #[test]
    fn test_merge_stacks_first_then_second() {
        let first = PointScan::new(4, vec![1.0, 1.0, 1.0, 0.1]).unwrap();
        let second = PointScan::new(4, vec![2.0, 2.0, 2.0, 0.2, 3.0, 3.0, 3.0, 0.3]).unwrap();
        let shift = CalibrationTransform::new(
            CalibrationTransform::identity().rotation,
            [0.0, 0.0, 1.0],
        );
        let merged =
            merge_scans(&first, &second, &CalibrationTransform::identity(), &shift).unwrap();
        assert_eq!(merged.rows(), 3);
        assert_eq!(merged.row(0), &[1.0, 1.0, 1.0, 0.1]);
        assert_eq!(merged.row(2), &[3.0, 3.0, 4.0, 0.3]);
    }

    #[test]
    fn test_transform_rejects_two_column_scan() {
        let scan = PointScan::new(2, vec![1.0, 2.0]).unwrap();
        assert!(transform_points(&scan, &CalibrationTransform::identity()).is_err());
    }

    #[test]
    fn test_sick_grid_spans_half_circle() {
        let grid = sick_grid();
        assert_eq!(grid.cos.len(), SICK_BEAM_COUNT);
        assert!(sick_beam_angle_deg(SICK_BEAM_COUNT - 1) < SICK_END_DEG);
        assert!(sick_beam_angle_deg(SICK_BEAM_COUNT) >= SICK_END_DEG);
    }

    #[test]
    fn test_sick_first_beam() {
        let mut data = vec![0.0f32; SICK_BEAM_COUNT * 2];
        data[0] = 10.0;
        data[1] = 0.75;
        let scan = PointScan::new(2, data).unwrap();
        let out = sick_to_cartesian(&scan).unwrap();

        let angle = (-5.0f64).to_radians();
        let row = out.row(0);
        assert!(approx(row[0], (10.0 * angle.cos()) as f32));
        assert!(approx(row[1], (10.0 * angle.sin()) as f32));
        assert_eq!(row[2], 0.0);
        assert_eq!(row[3], 0.75);
        assert_eq!(out.rows(), SICK_BEAM_COUNT);
    }

    #[test]
    fn test_sick_ninety_degrees_points_forward_left() {
        // Beam 143 sits at -5 + 143 * 0.6667 = 90.338 degrees
        let mut data = vec![0.0f32; SICK_BEAM_COUNT * 2];
        data[143 * 2] = 2.0;
        let out = sick_to_cartesian(&PointScan::new(2, data).unwrap()).unwrap();
        let row = out.row(143);
        assert!(row[0].abs() < 0.02);
        assert!(approx(row[1], (2.0 * 90.3381f64.to_radians().sin()) as f32));
    }

    #[test]
    fn test_sick_wrong_beam_count() {
        let scan = PointScan::new(2, vec![1.0; 20]).unwrap();
        assert!(matches!(
            sick_to_cartesian(&scan),
            Err(ContractError::InvalidScan { .. })
        ));
    }
}
