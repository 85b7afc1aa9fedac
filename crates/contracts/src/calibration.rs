use serde::{Deserialize, Serialize};

/// Rigid transform from a sensor frame into the vehicle frame
///
/// Applied to a row vector `p` as `p · R + T`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTransform {
    /// Row-major 3x3 rotation
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

impl CalibrationTransform {
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [0.0; 3],
        )
    }

    /// Builds a transform from the 9 row-major rotation values and 3 translation values
    pub fn from_slices(rotation: &[f64; 9], translation: &[f64; 3]) -> Self {
        let mut r = [[0.0; 3]; 3];
        for (i, row) in r.iter_mut().enumerate() {
            row.copy_from_slice(&rotation[i * 3..i * 3 + 3]);
        }
        Self::new(r, *translation)
    }
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self::identity()
    }
}
