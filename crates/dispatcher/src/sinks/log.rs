//! LogSink - logs a record summary via tracing

use std::collections::BTreeMap;

use contracts::{ContractError, DataSink, SensorRecord, Timestamp};
use tracing::{debug, info, instrument};

/// Sink that logs record summaries, used for dry runs
pub struct LogSink {
    name: String,
    counts: BTreeMap<&'static str, u64>,
    first: Option<Timestamp>,
    last: Option<Timestamp>,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counts: BTreeMap::new(),
            first: None,
            last: None,
        }
    }

    /// Records seen per kind
    pub fn counts(&self) -> &BTreeMap<&'static str, u64> {
        &self.counts
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, record),
        fields(sink = %self.name, timestamp = record.timestamp)
    )]
    fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        let kind = record.payload.kind_name();
        *self.counts.entry(kind).or_default() += 1;
        self.first.get_or_insert(record.timestamp);
        self.last = Some(record.timestamp);

        debug!(sensor = %record.sensor_id, kind, "record received");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            records = self.counts.values().sum::<u64>(),
            kinds = ?self.counts,
            first = ?self.first,
            last = ?self.last,
            "LogSink closed"
        );
        Ok(())
    }
}
