//! Dispatcher - main loop for fan-out to sinks

use std::path::PathBuf;

use contracts::{DataSink, PcdEncoding, RecordCompression, SensorRecord};
use observability::{record_export_failure, record_record_exported};
use tracing::{debug, error, info, instrument};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{LogSink, PcdSink, RecordSink};

/// Sink to create
#[derive(Debug, Clone, PartialEq)]
pub enum SinkSpec {
    /// Record summary in the log
    Log { name: String },
    /// `<dir>/<frame>.pcd` per lidar record
    Pcd {
        name: String,
        dir: PathBuf,
        encoding: PcdEncoding,
    },
    /// MCAP recording
    Record {
        name: String,
        path: PathBuf,
        compression: RecordCompression,
    },
}

impl SinkSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Log { name } | Self::Pcd { name, .. } | Self::Record { name, .. } => name,
        }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkSpec>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Create every configured sink
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(sink_count = self.config.sinks.len())
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let sinks = self
            .config
            .sinks
            .iter()
            .map(create_sink)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dispatcher::with_sinks(sinks))
    }
}

/// Create a sink from its spec
#[instrument(name = "dispatcher_create_sink", skip(spec), fields(sink = %spec.name()))]
pub fn create_sink(spec: &SinkSpec) -> Result<Box<dyn DataSink>, DispatcherError> {
    let sink: Box<dyn DataSink> = match spec {
        SinkSpec::Log { name } => Box::new(LogSink::new(name)),
        SinkSpec::Pcd {
            name,
            dir,
            encoding,
        } => Box::new(
            PcdSink::new(name, dir, *encoding)
                .map_err(|e| DispatcherError::sink_creation(name, e.to_string()))?,
        ),
        SinkSpec::Record {
            name,
            path,
            compression,
        } => Box::new(
            RecordSink::create(name, path, *compression)
                .map_err(|e| DispatcherError::sink_creation(name, e.to_string()))?,
        ),
    };
    Ok(sink)
}

/// Outcome of a completed dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Records pulled from the input
    pub records: u64,
    /// Per-sink counters, in sink order
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Feeds every record to every sink in order, then flushes and closes them.
///
/// Fail-fast: the first write error stops the run and is returned with the sink
/// name and record stamp. Sinks are not closed in that case.
#[instrument(name = "dispatch", skip_all, fields(sinks = sinks.len()))]
pub fn dispatch<I>(
    records: I,
    sinks: &mut [&mut dyn DataSink],
) -> Result<DispatchSummary, DispatcherError>
where
    I: IntoIterator<Item = SensorRecord>,
{
    let mut metrics = vec![SinkMetrics::new(); sinks.len()];
    let mut count: u64 = 0;

    for record in records {
        count += 1;
        for (sink, metrics) in sinks.iter_mut().zip(metrics.iter_mut()) {
            if let Err(source) = sink.write(&record) {
                metrics.inc_failure_count();
                record_export_failure(sink.name());
                error!(
                    sink = sink.name(),
                    timestamp = record.timestamp,
                    error = %source,
                    "sink write failed"
                );
                return Err(DispatcherError::Sink {
                    sink_name: sink.name().to_string(),
                    timestamp: record.timestamp,
                    source,
                });
            }
            metrics.inc_write_count();
            record_record_exported(sink.name(), record.payload.kind_name());
        }

        if count.is_multiple_of(1000) {
            debug!(records = count, "dispatch progress");
        }
    }

    for sink in sinks.iter_mut() {
        sink.flush()?;
        sink.close()?;
    }

    info!(records = count, "dispatch complete");
    Ok(DispatchSummary {
        records: count,
        sinks: sinks
            .iter()
            .zip(&metrics)
            .map(|(sink, m)| (sink.name().to_string(), m.snapshot()))
            .collect(),
    })
}

/// Owns a set of sinks and fans records out to them
pub struct Dispatcher {
    sinks: Vec<Box<dyn DataSink>>,
}

impl Dispatcher {
    /// Create a dispatcher with already constructed sinks
    pub fn with_sinks(sinks: Vec<Box<dyn DataSink>>) -> Self {
        Self { sinks }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Run the dispatcher until `records` is exhausted
    #[instrument(name = "dispatcher_run", skip_all)]
    pub fn run<I>(mut self, records: I) -> Result<DispatchSummary, DispatcherError>
    where
        I: IntoIterator<Item = SensorRecord>,
    {
        info!(sinks = self.sinks.len(), "Dispatcher started");
        let mut sinks: Vec<&mut dyn DataSink> =
            self.sinks.iter_mut().map(|s| s.as_mut() as &mut dyn DataSink).collect();
        dispatch(records, &mut sinks)
    }
}

/// Convenience function to create a dispatcher from sink specs
pub fn create_dispatcher(sinks: Vec<SinkSpec>) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig { sinks }).build()
}
