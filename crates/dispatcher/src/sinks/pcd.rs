//! PcdSink - writes lidar scans as PCL `.pcd` files
//!
//! Fields are `x y z intensity timestamp` (`F F F U F`, sizes `4 4 4 1 8`).
//! `binary_compressed` stores the fields column by column and LZF-compresses the
//! block; data that LZF cannot shrink is written as plain `binary` instead.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{
    ContractError, DataSink, LidarFrame, LidarModel, PcdEncoding, SensorPayload, SensorRecord,
    Timestamp,
};
use sync_engine::{sick_to_cartesian, PointScan};
use tracing::{debug, info, instrument};

/// Bytes per point: 3 × f32 + u8 + f64
const POINT_STEP: usize = 4 + 4 + 4 + 1 + 8;

/// One exported point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcdPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: u8,
    pub timestamp: f64,
}

/// Scales a `[0, 1]` intensity to `u8`, rounding to nearest
pub fn intensity_to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Converts a 4-column scan recorded at `timestamp` into PCD points
pub fn scan_to_points(scan: &PointScan, timestamp: Timestamp) -> Vec<PcdPoint> {
    scan.iter_rows()
        .map(|row| PcdPoint {
            x: row[0],
            y: row[1],
            z: row[2],
            intensity: intensity_to_u8(row[3]),
            timestamp: timestamp as f64,
        })
        .collect()
}

fn header(points: usize, data: &str) -> String {
    format!(
        "# .PCD v0.7 - Point Cloud Data file format\n\
         VERSION 0.7\n\
         FIELDS x y z intensity timestamp\n\
         SIZE 4 4 4 1 8\n\
         TYPE F F F U F\n\
         COUNT 1 1 1 1 1\n\
         WIDTH {points}\n\
         HEIGHT 1\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {points}\n\
         DATA {data}\n"
    )
}

fn encode_binary(points: &[PcdPoint]) -> Vec<u8> {
    let mut out = header(points.len(), "binary").into_bytes();
    out.reserve(points.len() * POINT_STEP);
    for p in points {
        out.extend_from_slice(&p.x.to_le_bytes());
        out.extend_from_slice(&p.y.to_le_bytes());
        out.extend_from_slice(&p.z.to_le_bytes());
        out.push(p.intensity);
        out.extend_from_slice(&p.timestamp.to_le_bytes());
    }
    out
}

/// Field-major block: all x, then all y, z, intensity, timestamp
fn column_block(points: &[PcdPoint]) -> Vec<u8> {
    let mut block = Vec::with_capacity(points.len() * POINT_STEP);
    for p in points {
        block.extend_from_slice(&p.x.to_le_bytes());
    }
    for p in points {
        block.extend_from_slice(&p.y.to_le_bytes());
    }
    for p in points {
        block.extend_from_slice(&p.z.to_le_bytes());
    }
    block.extend(points.iter().map(|p| p.intensity));
    for p in points {
        block.extend_from_slice(&p.timestamp.to_le_bytes());
    }
    block
}

/// Encodes `points` as a complete PCD file.
///
/// `BinaryCompressed` falls back to `binary` when the block does not compress
/// (which includes empty clouds).
pub fn encode_pcd(points: &[PcdPoint], encoding: PcdEncoding) -> Vec<u8> {
    if matches!(encoding, PcdEncoding::Binary) || points.is_empty() {
        return encode_binary(points);
    }

    let block = column_block(points);
    let Ok(compressed) = lzf::compress(&block) else {
        debug!(points = points.len(), "block not compressible, writing binary");
        return encode_binary(points);
    };

    let mut out = header(points.len(), "binary_compressed").into_bytes();
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    out.extend_from_slice(&(block.len() as u32).to_le_bytes());
    out.extend_from_slice(&compressed);
    out
}

/// Sink writing every lidar record to `<dir>/<frame>.pcd`, frames numbered from 0
pub struct PcdSink {
    name: String,
    dir: PathBuf,
    encoding: PcdEncoding,
    frames: Vec<Timestamp>,
    points: usize,
}

impl PcdSink {
    /// Creates the output directory if needed
    pub fn new(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        encoding: PcdEncoding,
    ) -> Result<Self, ContractError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.into(),
            dir,
            encoding,
            frames: Vec::new(),
            points: 0,
        })
    }

    /// Stamps of the frames written so far, in frame order
    pub fn frame_stamps(&self) -> &[Timestamp] {
        &self.frames
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one scan as the next frame and returns its path
    pub fn write_scan(
        &mut self,
        scan: &PointScan,
        timestamp: Timestamp,
    ) -> Result<PathBuf, ContractError> {
        if scan.columns() != 4 {
            return Err(ContractError::invalid_scan(format!(
                "PCD export needs 4 columns, got {}",
                scan.columns()
            )));
        }

        let path = self.dir.join(format!("{}.pcd", self.frames.len()));
        let bytes = encode_pcd(&scan_to_points(scan, timestamp), self.encoding);
        let mut file = fs::File::create(&path)?;
        file.write_all(&bytes)?;

        self.frames.push(timestamp);
        self.points += scan.rows();
        Ok(path)
    }

    fn load(&self, frame: &LidarFrame, timestamp: Timestamp) -> Result<PointScan, ContractError> {
        let path = frame.scan_path(timestamp);
        let scan = ingestion::load_scan(&path, frame.columns())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        match (frame.model, frame.merged) {
            (LidarModel::Sick, false) => sick_to_cartesian(&scan),
            _ => Ok(scan),
        }
    }
}

impl DataSink for PcdSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "pcd_sink_write",
        skip(self, record),
        fields(sink = %self.name, timestamp = record.timestamp)
    )]
    fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        let SensorPayload::Lidar(frame) = &record.payload else {
            return Err(ContractError::unsupported_record(
                &self.name,
                record.payload.kind_name(),
            ));
        };
        let scan = self.load(frame, record.timestamp)?;
        let path = self.write_scan(&scan, record.timestamp)?;
        debug!(path = %path.display(), points = scan.rows(), "pcd written");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "pcd_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            frames = self.frames.len(),
            points = self.points,
            dir = %self.dir.display(),
            "PcdSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_header(bytes: &[u8]) -> (String, &[u8]) {
        let marker = b"\nDATA ";
        let start = bytes.windows(marker.len()).position(|w| w == marker).unwrap();
        let end = start + 1 + bytes[start + 1..].iter().position(|&b| b == b'\n').unwrap();
        (
            String::from_utf8(bytes[..=end].to_vec()).unwrap(),
            &bytes[end + 1..],
        )
    }

    fn sample(n: usize) -> Vec<PcdPoint> {
        (0..n)
            .map(|i| PcdPoint {
                x: i as f32,
                y: 0.0,
                z: 1.0,
                intensity: 3,
                timestamp: 1e18,
            })
            .collect()
    }

    #[test]
    fn test_intensity_rounding() {
        assert_eq!(intensity_to_u8(0.0), 0);
        assert_eq!(intensity_to_u8(1.0), 255);
        assert_eq!(intensity_to_u8(0.5), 128);
        assert_eq!(intensity_to_u8(0.1), 26);
        assert_eq!(intensity_to_u8(2.0), 255);
        assert_eq!(intensity_to_u8(-0.5), 0);
    }

    #[test]
    fn test_binary_layout() {
        let bytes = encode_pcd(&sample(2), PcdEncoding::Binary);
        let (header, body) = split_header(&bytes);
        assert!(header.contains("FIELDS x y z intensity timestamp\n"));
        assert!(header.contains("TYPE F F F U F\n"));
        assert!(header.contains("POINTS 2\n"));
        assert!(header.ends_with("DATA binary\n"));
        assert_eq!(body.len(), 2 * POINT_STEP);
        assert_eq!(&body[POINT_STEP..POINT_STEP + 4], &1.0f32.to_le_bytes());
        assert_eq!(body[12], 3);
    }

    #[test]
    fn test_binary_compressed_decodes_to_columns() {
        let points = sample(500);
        let bytes = encode_pcd(&points, PcdEncoding::BinaryCompressed);
        let (header, body) = split_header(&bytes);
        assert!(header.ends_with("DATA binary_compressed\n"));
        assert!(header.contains("WIDTH 500\n"));

        let compressed = u32::from_le_bytes(body[0..4].try_into().unwrap()) as usize;
        let raw = u32::from_le_bytes(body[4..8].try_into().unwrap()) as usize;
        assert_eq!(raw, 500 * POINT_STEP);
        assert_eq!(body.len(), 8 + compressed);

        let block = lzf::decompress(&body[8..], raw).unwrap();
        assert_eq!(block, column_block(&points));
        // y column starts after 500 x values
        assert_eq!(&block[4 * 499..4 * 500], &499.0f32.to_le_bytes());
        assert_eq!(block[12 * 500], 3);
    }

    #[test]
    fn test_empty_cloud_written_as_binary() {
        let bytes = encode_pcd(&[], PcdEncoding::BinaryCompressed);
        let (header, body) = split_header(&bytes);
        assert!(header.contains("POINTS 0\n"));
        assert!(header.ends_with("DATA binary\n"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_sink_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PcdSink::new("pcd", dir.path().join("pcds"), PcdEncoding::Binary).unwrap();
        let scan = PointScan::new(4, [0.0f32, 0.0, 0.0, 1.0].repeat(4)).unwrap();

        let first = sink.write_scan(&scan, 100).unwrap();
        let second = sink.write_scan(&scan, 200).unwrap();
        assert!(first.ends_with("0.pcd"));
        assert!(second.ends_with("1.pcd"));
        assert_eq!(sink.frame_stamps(), &[100, 200]);

        let bytes = fs::read(&second).unwrap();
        let (header, body) = split_header(&bytes);
        assert!(header.contains("POINTS 4\n"));
        assert_eq!(body.len(), 4 * POINT_STEP);
        assert_eq!(body[12], 255);
        assert_eq!(&body[13..21], &200.0f64.to_le_bytes());
    }

    #[test]
    fn test_non_lidar_record_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PcdSink::new("pcd", dir.path(), PcdEncoding::Binary).unwrap();
        let record = SensorRecord::new(
            "altimeter".into(),
            1,
            SensorPayload::Altimeter(contracts::AltimeterData { altitude: 1.0 }),
        );
        assert!(matches!(
            sink.write(&record),
            Err(ContractError::UnsupportedRecord { .. })
        ));
    }
}
