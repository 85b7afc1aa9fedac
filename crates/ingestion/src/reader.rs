//! Raw file readers: stamp lists, binary / text scans and calibration files.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use contracts::{CalibrationTransform, ContractError, Timestamp};
use sync_engine::PointScan;
use tracing::trace;

use crate::error::{IngestionError, Result};

/// Reads a newline-delimited list of i64 stamps (first column of each row).
pub fn read_stamps(path: &Path) -> Result<Vec<Timestamp>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| IngestionError::csv(path, e))?;

    let mut stamps = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestionError::csv(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = record
            .get(0)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| IngestionError::malformed_row(path, line, "empty stamp row"))?;
        let stamp = field.parse::<Timestamp>().map_err(|e| {
            IngestionError::malformed_row(path, line, format!("invalid stamp '{field}': {e}"))
        })?;
        stamps.push(stamp);
    }

    trace!(path = %path.display(), count = stamps.len(), "stamps loaded");
    Ok(stamps)
}

/// Writes one stamp per line.
pub fn write_stamps(path: &Path, stamps: &[Timestamp]) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| IngestionError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for stamp in stamps {
        writeln!(writer, "{stamp}").map_err(|e| IngestionError::io(path, e))?;
    }
    writer.flush().map_err(|e| IngestionError::io(path, e))
}

/// Reads a little-endian float32 scan with `columns` values per row.
pub fn read_scan(path: &Path, columns: usize) -> Result<PointScan> {
    let bytes = fs::read(path).map_err(|e| IngestionError::io(path, e))?;
    if bytes.len() % std::mem::size_of::<f32>() != 0 {
        return Err(IngestionError::malformed_scan(
            path,
            format!("{} bytes is not a whole number of f32 values", bytes.len()),
        ));
    }

    // Copies into an aligned buffer; the file bytes carry no alignment guarantee
    let data: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
    PointScan::new(columns, data).map_err(|e| IngestionError::malformed_scan(path, e.to_string()))
}

/// Reads a whitespace separated text scan with `columns` values per row.
pub fn read_text_scan(path: &Path, columns: usize) -> Result<PointScan> {
    let content = fs::read_to_string(path).map_err(|e| IngestionError::io(path, e))?;
    let data = content
        .split_whitespace()
        .map(|token| {
            token.parse::<f32>().map_err(|e| {
                IngestionError::malformed_scan(path, format!("invalid value '{token}': {e}"))
            })
        })
        .collect::<Result<Vec<f32>>>()?;
    PointScan::new(columns, data).map_err(|e| IngestionError::malformed_scan(path, e.to_string()))
}

/// Loads a scan by extension: `.bin` (float32) or `.txt` (text).
///
/// # Errors
/// [`ContractError::UnsupportedExtension`] for any other extension.
pub fn load_scan(path: &Path, columns: usize) -> Result<PointScan> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match extension {
        "bin" => read_scan(path, columns),
        "txt" => read_text_scan(path, columns),
        other => Err(ContractError::UnsupportedExtension {
            path: path.display().to_string(),
            extension: other.to_string(),
            expected: ".bin, .txt",
        }
        .into()),
    }
}

/// Writes a scan as raw little-endian float32 values.
pub fn write_scan(path: &Path, scan: &PointScan) -> Result<()> {
    let bytes: &[u8] = bytemuck::cast_slice(scan.as_slice());
    fs::write(path, bytes).map_err(|e| IngestionError::io(path, e))
}

/// Reads a `Vehicle2<Head>.txt` calibration file.
///
/// The last two non-empty lines hold the rotation (9 values, row-major) and the
/// translation (3 values), each after a 3-character prefix such as `R: `.
pub fn read_calibration(path: &Path) -> Result<CalibrationTransform> {
    let content = fs::read_to_string(path).map_err(|e| IngestionError::io(path, e))?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let [.., rotation_line, translation_line] = lines.as_slice() else {
        return Err(IngestionError::malformed_row(
            path,
            lines.len() as u64,
            "calibration needs a rotation and a translation line",
        ));
    };

    let total = lines.len() as u64;
    let rotation: [f64; 9] = parse_calibration_values(path, total - 1, rotation_line)?;
    let translation: [f64; 3] = parse_calibration_values(path, total, translation_line)?;

    Ok(CalibrationTransform::from_slices(&rotation, &translation))
}

fn parse_calibration_values<const N: usize>(
    path: &Path,
    line_no: u64,
    line: &str,
) -> Result<[f64; N]> {
    let body = line.get(3..).unwrap_or_default();
    let values = body
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|e| {
                IngestionError::malformed_row(path, line_no, format!("invalid value '{token}': {e}"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let count = values.len();
    values.try_into().map_err(|_| {
        IngestionError::malformed_row(path, line_no, format!("expected {N} values, found {count}"))
    })
}
