//! Metric declarations for reader sessions.
//!
//! Metrics are declared as [`Metric`] constants and recorded through the
//! `metrics` facade; install a recorder to collect them. Every metric carries a
//! `session` label.

use metrics::{describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement.
    pub unit: Unit,
}

impl Metric {
    /// Declare a counter.
    pub const fn counter(name: &'static str, description: &'static str) -> Self {
        Metric {
            name,
            description,
            unit: Unit::Count,
        }
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        describe_counter!(self.name, self.unit, self.description);
    }

    /// Increment the counter for `session` by `value`.
    pub fn increment(&self, session: &str, value: u64) {
        metrics::counter!(self.name, "session" => session.to_string()).increment(value);
    }
}

/// Metric definitions.
pub mod metric_defs {
    use super::Metric;

    /// Inbound transport deliveries.
    pub const FRAMES_RECEIVED: Metric = Metric::counter(
        "rfidlink.frames_received",
        "Inbound transport deliveries processed",
    );

    /// Outbound commands accepted by the transport.
    pub const COMMANDS_SENT: Metric = Metric::counter(
        "rfidlink.commands_sent",
        "Commands accepted by the transport",
    );

    /// Batches decoded successfully.
    pub const BATCHES_EXTRACTED: Metric = Metric::counter(
        "rfidlink.batches_extracted",
        "Tag-read batches decoded successfully",
    );

    /// Batches dropped after a decode failure.
    pub const BATCHES_DISCARDED: Metric = Metric::counter(
        "rfidlink.batches_discarded",
        "Tag-read batches discarded after a decode failure",
    );

    /// Tag records reported.
    pub const TAGS_READ: Metric = Metric::counter("rfidlink.tags_read", "Tag records reported");

    /// All metrics, for registration.
    pub const ALL: &[Metric] = &[
        FRAMES_RECEIVED,
        COMMANDS_SENT,
        BATCHES_EXTRACTED,
        BATCHES_DISCARDED,
        TAGS_READ,
    ];
}

/// Register descriptions for every session metric.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_unique() {
        let mut names: Vec<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn test_recording_without_recorder() {
        // No recorder installed: calls are no-ops.
        describe_metrics();
        metric_defs::TAGS_READ.increment("test", 3);
    }
}
