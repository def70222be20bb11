//! Telemetry sync
//!
//! Periodically flattens station stats and KPIs into `{entity, metric, value}`
//! records and hands them to a sink. Best effort: a failed push is logged and
//! dropped, and the next attempt waits for the following interval.

use std::io::Write;

use serde::Serialize;

use crate::consts::*;
use crate::kpi::KpiId;
use crate::sim::{ConfigError, FactoryState};
use crate::stations::STATIONS;

/// Failure reported by a sink
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize telemetry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("telemetry rejected: {0}")]
    Rejected(String),
}

/// One flattened metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub entity_id: String,
    pub metric_name: String,
    pub value: f64,
}

impl TelemetryRecord {
    pub fn new(entity_id: impl Into<String>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            metric_name: metric_name.into(),
            value,
        }
    }
}

/// Destination for telemetry batches
pub trait TelemetrySink {
    fn send(&mut self, records: &[TelemetryRecord]) -> Result<(), TelemetryError>;
}

/// Logs a batch summary, one debug line per record
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn send(&mut self, records: &[TelemetryRecord]) -> Result<(), TelemetryError> {
        log::info!("Telemetry batch: {} records", records.len());
        for r in records {
            log::debug!("  {}.{} = {}", r.entity_id, r.metric_name, r.value);
        }
        Ok(())
    }
}

/// One JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn send(&mut self, records: &[TelemetryRecord]) -> Result<(), TelemetryError> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Station nominal stats followed by the current KPIs
pub fn collect_records(state: &FactoryState) -> Vec<TelemetryRecord> {
    let mut records: Vec<TelemetryRecord> = STATIONS
        .iter()
        .flat_map(|station| {
            station
                .stats
                .iter()
                .map(|stat| TelemetryRecord::new(station.id.as_str(), stat.label, stat.numeric_value()))
        })
        .collect();

    let values = &state.kpis().values;
    records.extend(KpiId::ALL.iter().map(|&id| {
        TelemetryRecord::new(TELEMETRY_FACTORY_ID, id.as_str(), crate::round1(values.get(id)))
    }));
    records
}

/// Fixed-interval push scheduler, driven by frame deltas
#[derive(Debug, Clone)]
pub struct TelemetrySync {
    interval_secs: f64,
    elapsed_secs: f64,
    sent_batches: u64,
    failed_batches: u64,
}

impl TelemetrySync {
    pub fn new(interval_secs: f64) -> Result<Self, ConfigError> {
        if interval_secs <= 0.0 || !interval_secs.is_finite() {
            return Err(ConfigError::NonPositiveInterval(interval_secs));
        }
        Ok(Self {
            interval_secs,
            elapsed_secs: 0.0,
            sent_batches: 0,
            failed_batches: 0,
        })
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    pub fn sent_batches(&self) -> u64 {
        self.sent_batches
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches
    }

    /// Advance the timer. When an interval elapses and data is flowing, one
    /// batch is sent. Returns true if a batch was delivered.
    pub fn poll(&mut self, dt: f64, state: &FactoryState, sink: &mut dyn TelemetrySink) -> bool {
        self.elapsed_secs += dt.max(0.0);
        if self.elapsed_secs < self.interval_secs {
            return false;
        }
        // Missed intervals collapse into one push
        self.elapsed_secs %= self.interval_secs;

        if !state.data_flowing() {
            return false;
        }

        let records = collect_records(state);
        match sink.send(&records) {
            Ok(()) => {
                self.sent_batches += 1;
                true
            }
            Err(e) => {
                self.failed_batches += 1;
                log::warn!("Telemetry push failed, skipping until next interval: {}", e);
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.elapsed_secs = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[derive(Default)]
    struct Recorder {
        batches: Vec<Vec<TelemetryRecord>>,
    }

    impl TelemetrySink for Recorder {
        fn send(&mut self, records: &[TelemetryRecord]) -> Result<(), TelemetryError> {
            self.batches.push(records.to_vec());
            Ok(())
        }
    }

    struct Offline;

    impl TelemetrySink for Offline {
        fn send(&mut self, _: &[TelemetryRecord]) -> Result<(), TelemetryError> {
            Err(TelemetryError::Rejected("backend unreachable".into()))
        }
    }

    fn running_factory() -> FactoryState {
        let mut state = FactoryState::new(&Settings::default()).unwrap();
        state.start();
        state
    }

    #[test]
    fn test_records_cover_stations_and_kpis() {
        let state = running_factory();
        let records = collect_records(&state);

        let stat_count: usize = STATIONS.iter().map(|s| s.stats.len()).sum();
        assert_eq!(records.len(), stat_count + KpiId::ALL.len());

        let force = records
            .iter()
            .find(|r| r.entity_id == "press" && r.metric_name == "Press Force")
            .unwrap();
        assert_eq!(force.value, 2500.0);

        let kpis: Vec<_> = records.iter().filter(|r| r.entity_id == TELEMETRY_FACTORY_ID).collect();
        assert_eq!(kpis.len(), 6);
        assert_eq!(kpis[0].metric_name, KpiId::ALL[0].as_str());
    }

    #[test]
    fn test_push_only_on_interval() {
        let state = running_factory();
        let mut sync = TelemetrySync::new(5.0).unwrap();
        let mut sink = Recorder::default();

        for _ in 0..4 {
            assert!(!sync.poll(1.0, &state, &mut sink));
        }
        assert!(sync.poll(1.0, &state, &mut sink));
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sync.sent_batches(), 1);
    }

    #[test]
    fn test_no_push_while_stopped() {
        let state = FactoryState::new(&Settings::default()).unwrap();
        let mut sync = TelemetrySync::new(5.0).unwrap();
        let mut sink = Recorder::default();

        assert!(!sync.poll(12.0, &state, &mut sink));
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn test_failure_waits_for_next_interval() {
        let state = running_factory();
        let mut sync = TelemetrySync::new(5.0).unwrap();

        assert!(!sync.poll(5.0, &state, &mut Offline));
        assert_eq!(sync.failed_batches(), 1);

        // No immediate retry
        assert!(!sync.poll(0.1, &state, &mut Offline));
        assert_eq!(sync.failed_batches(), 1);

        let mut sink = Recorder::default();
        assert!(sync.poll(4.9, &state, &mut sink));
        assert_eq!(sink.batches.len(), 1);
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        for interval in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                TelemetrySync::new(interval),
                Err(ConfigError::NonPositiveInterval(_))
            ));
        }
    }

    #[test]
    fn test_json_lines_output() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.send(&[
            TelemetryRecord::new("press", "Vibration", 0.8),
            TelemetryRecord::new("factory", "oee", 45.2),
        ])
        .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"entityId":"press","metricName":"Vibration","value":0.8}"#);
    }
}
