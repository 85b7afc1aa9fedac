//! DataSink trait - Exporter output interface

use crate::{ContractError, SensorRecord};

/// Export target for the fused record stream
///
/// Sinks receive records in global time order. Implementations decide per record
/// kind whether to export, skip or reject it.
pub trait DataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one record
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError>;

    /// Finalize output; no writes are accepted afterwards
    fn close(&mut self) -> Result<(), ContractError>;
}
