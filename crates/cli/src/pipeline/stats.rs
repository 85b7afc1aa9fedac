//! Conversion statistics.

use std::time::Duration;

use dispatcher::DispatchSummary;
use serde::Serialize;

/// Per-sink counters of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct SinkStats {
    pub name: String,
    pub written: u64,
    pub failed: u64,
}

/// Statistics from one converting command
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    /// Command that produced the stats
    pub command: &'static str,

    /// Records pulled from the fused stream
    pub records: u64,

    /// Output written (file or directory)
    pub output: String,

    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,

    pub sinks: Vec<SinkStats>,
}

fn as_secs<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

impl ConversionStats {
    pub fn from_dispatch(
        command: &'static str,
        output: String,
        summary: &DispatchSummary,
        duration: Duration,
    ) -> Self {
        Self {
            command,
            records: summary.records,
            output,
            duration,
            sinks: summary
                .sinks
                .iter()
                .map(|(name, m)| SinkStats {
                    name: name.clone(),
                    written: m.write_count,
                    failed: m.failure_count,
                })
                .collect(),
        }
    }

    /// Records per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== {} summary ===", self.command);
        println!("   ├─ Output: {}", self.output);
        println!("   ├─ Records: {}", self.records);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   └─ Throughput: {:.1} records/s", self.throughput());

        if !self.sinks.is_empty() {
            println!("\n   Sinks");
            for (i, sink) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed",
                    prefix, sink.name, sink.written, sink.failed
                );
            }
        }
        println!();
    }
}
