//! Column schemas of the single-file sensors.
//!
//! Each file is comma separated, one measurement per row, with the nanosecond stamp
//! in the first column. IMU and VRS GPS files gained trailing columns in the second
//! revision of the dataset; the schema version selects which layout is expected.

use std::path::Path;
use std::str::FromStr;

use contracts::{
    AltimeterData, EncoderData, FogData, GpsData, ImuData, ImuInertial, Quaternion,
    SchemaVersion, SensorPayload, Timestamp, Vector3, VrsGpsData,
};
use csv::StringRecord;

use crate::error::{IngestionError, Result};

/// Sequential field reader over one CSV row
pub struct RowCursor<'a> {
    path: &'a Path,
    line: u64,
    record: &'a StringRecord,
    index: usize,
}

impl<'a> RowCursor<'a> {
    fn new(path: &'a Path, line: u64, record: &'a StringRecord) -> Self {
        Self {
            path,
            line,
            record,
            index: 0,
        }
    }

    fn next_field(&mut self) -> Result<&'a str> {
        let field = self.record.get(self.index).ok_or_else(|| {
            IngestionError::malformed_row(self.path, self.line, format!("missing column {}", self.index))
        })?;
        self.index += 1;
        Ok(field)
    }

    pub fn parse<T>(&mut self) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let column = self.index;
        let field = self.next_field()?;
        field.parse::<T>().map_err(|e| {
            IngestionError::malformed_row(
                self.path,
                self.line,
                format!("column {column}: invalid value '{field}': {e}"),
            )
        })
    }

    pub fn f64(&mut self) -> Result<f64> {
        self.parse()
    }

    /// Small integer flags are sometimes written as floats (`1.0`)
    pub fn i8(&mut self) -> Result<i8> {
        let column = self.index;
        let field = self.next_field()?;
        field
            .parse::<i8>()
            .or_else(|_| {
                field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && *v >= i8::MIN as f64 && *v <= i8::MAX as f64)
                    .map(|v| v as i8)
                    .ok_or(())
            })
            .map_err(|_| {
                IngestionError::malformed_row(
                    self.path,
                    self.line,
                    format!("column {column}: invalid flag '{field}'"),
                )
            })
    }

    pub fn string(&mut self) -> Result<String> {
        self.next_field().map(str::to_string)
    }

    pub fn vector3(&mut self) -> Result<Vector3> {
        Ok(Vector3::new(self.f64()?, self.f64()?, self.f64()?))
    }
}

/// Layout of one single-file sensor
pub trait RowSchema: Sized {
    /// File stem, also used in error messages
    const FILE: &'static str;

    /// Columns per row, stamp included
    fn columns(version: SchemaVersion) -> usize;

    /// Parses the fields after the stamp
    fn parse(row: &mut RowCursor<'_>, version: SchemaVersion) -> Result<Self>;
}

/// Row schema whose rows become dataset records
pub trait SensorRow: RowSchema {
    fn into_payload(self) -> SensorPayload;
}

macro_rules! sensor_rows {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SensorRow for $ty {
                fn into_payload(self) -> SensorPayload {
                    SensorPayload::$variant(self)
                }
            }
        )*
    };
}

sensor_rows! {
    AltimeterData => Altimeter,
    EncoderData => Encoder,
    FogData => Fog,
    GpsData => Gps,
    VrsGpsData => VrsGps,
    ImuData => Imu,
}

/// Reads every row of `path` as `(stamp, row)`.
pub fn read_rows<S: RowSchema>(path: &Path, version: SchemaVersion) -> Result<Vec<(Timestamp, S)>> {
    let expected = S::columns(version);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| IngestionError::csv(path, e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestionError::csv(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != expected {
            return Err(IngestionError::malformed_row(
                path,
                line,
                format!(
                    "{} row has {} columns, expected {expected} for {version:?}",
                    S::FILE,
                    record.len()
                ),
            ));
        }

        let mut cursor = RowCursor::new(path, line, &record);
        let stamp: Timestamp = cursor.parse()?;
        rows.push((stamp, S::parse(&mut cursor, version)?));
    }
    Ok(rows)
}

impl RowSchema for AltimeterData {
    const FILE: &'static str = "altimeter";

    fn columns(_: SchemaVersion) -> usize {
        2
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        Ok(Self { altitude: row.f64()? })
    }
}

impl RowSchema for EncoderData {
    const FILE: &'static str = "encoder";

    fn columns(_: SchemaVersion) -> usize {
        3
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        Ok(Self {
            left_count: row.parse()?,
            right_count: row.parse()?,
        })
    }
}

impl RowSchema for FogData {
    const FILE: &'static str = "fog";

    fn columns(_: SchemaVersion) -> usize {
        4
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        Ok(Self {
            delta_roll: row.f64()?,
            delta_pitch: row.f64()?,
            delta_yaw: row.f64()?,
        })
    }
}

impl RowSchema for GpsData {
    const FILE: &'static str = "gps";

    fn columns(_: SchemaVersion) -> usize {
        13
    }

    fn parse(row: &mut RowCursor<'_>, _: SchemaVersion) -> Result<Self> {
        let latitude = row.f64()?;
        let longitude = row.f64()?;
        let altitude = row.f64()?;
        let mut position_covariance = [0.0; 9];
        for value in &mut position_covariance {
            *value = row.f64()?;
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
            position_covariance,
        })
    }
}

impl RowSchema for VrsGpsData {
    const FILE: &'static str = "vrs_gps";

    fn columns(version: SchemaVersion) -> usize {
        match version {
            SchemaVersion::V1 => 17,
            SchemaVersion::V2 => 18,
        }
    }

    fn parse(row: &mut RowCursor<'_>, version: SchemaVersion) -> Result<Self> {
        Ok(Self {
            latitude: row.f64()?,
            longitude: row.f64()?,
            utm_x: row.f64()?,
            utm_y: row.f64()?,
            altitude: row.f64()?,
            fix_state: row.i8()?,
            num_satellites: row.i8()?,
            horizontal_precision: row.f64()?,
            latitude_std: row.f64()?,
            longitude_std: row.f64()?,
            altitude_std: row.f64()?,
            heading_validate_flag: row.i8()?,
            magnetic_global_heading: row.f64()?,
            speed_in_knot: row.f64()?,
            speed_in_km: row.f64()?,
            gnvtg_mode: row.string()?,
            orthometric_altitude: match version {
                SchemaVersion::V1 => None,
                SchemaVersion::V2 => Some(row.f64()?),
            },
        })
    }
}

impl RowSchema for ImuData {
    const FILE: &'static str = "xsens_imu";

    fn columns(version: SchemaVersion) -> usize {
        match version {
            SchemaVersion::V1 => 8,
            SchemaVersion::V2 => 17,
        }
    }

    fn parse(row: &mut RowCursor<'_>, version: SchemaVersion) -> Result<Self> {
        let orientation = Quaternion::new(row.f64()?, row.f64()?, row.f64()?, row.f64()?);
        let euler = row.vector3()?;
        let inertial = match version {
            SchemaVersion::V1 => None,
            SchemaVersion::V2 => Some(ImuInertial {
                gyroscope: row.vector3()?,
                acceleration: row.vector3()?,
                magnetic_field: row.vector3()?,
            }),
        };
        Ok(Self {
            orientation,
            euler,
            inertial,
        })
    }
}
