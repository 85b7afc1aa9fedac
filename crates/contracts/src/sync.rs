//! Timestamp types shared by the matcher, the dual-head merger and the fuser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor timestamp in nanoseconds
pub type Timestamp = i64;

/// Anything that can be ordered on the global sensor clock
pub trait Timestamped {
    fn timestamp(&self) -> Timestamp;
}

impl Timestamped for Timestamp {
    #[inline]
    fn timestamp(&self) -> Timestamp {
        *self
    }
}

/// One matched pair of stamps from the two heads of a dual-head rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampPair {
    /// Stamp taken from the first head (left VLP / back SICK)
    pub left: Timestamp,
    /// Stamp taken from the second head (right VLP / middle SICK)
    pub right: Timestamp,
}

impl StampPair {
    pub fn new(left: Timestamp, right: Timestamp) -> Self {
        Self { left, right }
    }

    /// Stamp under which the merged scan is stored (floor of the mean)
    #[inline]
    pub fn average(&self) -> Timestamp {
        // i128 keeps the sum from overflowing for stamps near i64::MAX
        ((self.left as i128 + self.right as i128).div_euclid(2)) as Timestamp
    }

    /// Absolute time difference between the two heads
    #[inline]
    pub fn skew(&self) -> u64 {
        self.left.abs_diff(self.right)
    }
}

/// Skew bounds enforced while pairing dual-head stamps
///
/// Lidar heads spin at 10 Hz, so two heads are expected to agree within half a
/// scan period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkewBounds {
    /// Limit for the candidate actually chosen (ns)
    #[serde(rename = "nearest_skew_ns", default = "default_nearest_ns")]
    pub nearest_ns: u64,

    /// Limit for both local candidates, chosen or not (ns)
    #[serde(rename = "hard_skew_ns", default = "default_hard_ns")]
    pub hard_ns: u64,
}

fn default_nearest_ns() -> u64 {
    500_000_000
}

fn default_hard_ns() -> u64 {
    1_000_000_000
}

impl Default for SkewBounds {
    fn default() -> Self {
        Self {
            nearest_ns: default_nearest_ns(),
            hard_ns: default_hard_ns(),
        }
    }
}

/// Which dual-head lidar collections enter the fused stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidarMode {
    /// Per-head scans only
    Raw,
    /// Merged scans only
    #[default]
    Merged,
    /// Per-head and merged scans
    Both,
}

impl LidarMode {
    pub fn includes_raw(self) -> bool {
        matches!(self, Self::Raw | Self::Both)
    }

    pub fn includes_merged(self) -> bool {
        matches!(self, Self::Merged | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Merged => "merged",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for LidarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LidarMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "original" => Ok(Self::Raw),
            "merged" => Ok(Self::Merged),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown lidar mode '{other}' (expected raw, merged or both)")),
        }
    }
}
