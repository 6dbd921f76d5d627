//! Sample records, CSV persistence and the in-memory plot history.

use crate::types::GaugeStatus;
use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Samples the in-memory history holds before evicting the oldest, about
/// six hours at the default 100 ms poll cadence.
pub const DEFAULT_HISTORY_CAPACITY: usize = 216_000;

/// One polled measurement, as consumed by the plot and the CSV sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Wall-clock time of the poll
    pub time: DateTime<Local>,
    /// Minutes since the monitoring session started; the plot's x axis
    pub elapsed_min: f64,
    /// Advisory measurement status
    pub status: GaugeStatus,
    /// Pressure in the controller's configured unit
    pub pressure: f64,
}

/// Append-only CSV sink, one file per monitoring session.
pub struct PressureLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl PressureLog {
    /// File name stem shared with the sibling acquisition controllers.
    const STEM: &'static str = "TPG261_pressure_controller";

    /// Create `<dir>/<Y_m_d-H_M_S>_TPG261_pressure_controller.csv`,
    /// stamped with the session start time.
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y_%m_%d-%H_%M_%S");
        let path = dir.join(format!("{}_{}.csv", stamp, Self::STEM));
        let writer = csv::Writer::from_writer(File::create(&path)?);
        info!("logging pressure samples to '{}'", path.display());
        Ok(Self { path, writer })
    }

    /// Append one sample. The header row is written with the first sample.
    pub fn append(&mut self, sample: &Sample) -> io::Result<()> {
        self.writer.serialize(sample)?;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Bounded in-memory sample buffer backing the plot views.
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once at capacity.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// `[elapsed_min, pressure]` points over the whole history.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .map(|s| [s.elapsed_min, s.pressure])
            .collect()
    }

    /// Points within the trailing `minutes` window.
    pub fn window_points(&self, minutes: f64) -> Vec<[f64; 2]> {
        let cutoff = match self.samples.back() {
            Some(last) => last.elapsed_min - minutes,
            None => return Vec::new(),
        };
        self.samples
            .iter()
            .filter(|s| s.elapsed_min >= cutoff)
            .map(|s| [s.elapsed_min, s.pressure])
            .collect()
    }

    /// `log10` of the positive pressures, for the logarithmic view.
    /// Non-positive readings cannot be plotted on a log axis and are
    /// skipped.
    pub fn log_points(&self) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .filter(|s| s.pressure > 0.0)
            .map(|s| [s.elapsed_min, s.pressure.log10()])
            .collect()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elapsed_min: f64, pressure: f64) -> Sample {
        Sample {
            time: Local::now(),
            elapsed_min,
            status: GaugeStatus::Passed,
            pressure,
        }
    }

    #[test]
    fn log_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = PressureLog::create(dir.path()).unwrap();
        log.append(&sample(0.0, 0.5)).unwrap();
        log.append(&sample(1.5, 0.25)).unwrap();
        log.flush().unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "time,elapsed_min,status,pressure");
        let first = lines.next().unwrap();
        assert!(first.contains("Passed"));
        assert!(first.ends_with(",0.5"));
        assert!(lines.next().unwrap().starts_with(|c: char| c.is_ascii_digit()));
        assert!(lines.next().is_none());
    }

    #[test]
    fn log_file_name_carries_the_session_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let log = PressureLog::create(dir.path()).unwrap();
        let name = log.path().file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_TPG261_pressure_controller.csv"));
        // Stamp shape: 2024_01_31-23_59_59
        assert_eq!(name.split('_').next().unwrap().len(), 4);
    }

    #[test]
    fn log_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs").join("today");
        let log = PressureLog::create(&nested).unwrap();
        assert!(log.path().starts_with(&nested));
        assert!(nested.is_dir());
    }

    #[test]
    fn history_evicts_oldest_at_capacity() {
        let mut history = SampleHistory::with_capacity(3);
        for i in 0..5 {
            history.push(sample(i as f64, 1.0));
        }
        assert_eq!(history.len(), 3);
        let points = history.points();
        assert_eq!(points[0][0], 2.0);
        assert_eq!(points[2][0], 4.0);
        assert_eq!(history.latest().unwrap().elapsed_min, 4.0);
    }

    #[test]
    fn zero_capacity_history_stays_bounded() {
        let mut history = SampleHistory::with_capacity(0);
        for i in 0..10 {
            history.push(sample(i as f64, 1.0));
        }
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().elapsed_min, 9.0);
    }

    #[test]
    fn window_points_trim_to_the_trailing_minutes() {
        let mut history = SampleHistory::new();
        for i in 0..=20 {
            history.push(sample(i as f64, 1.0e-6));
        }
        let points = history.window_points(5.0);
        assert_eq!(points.len(), 6);
        assert_eq!(points[0][0], 15.0);
        assert_eq!(points[5][0], 20.0);
    }

    #[test]
    fn window_of_empty_history_is_empty() {
        let history = SampleHistory::new();
        assert!(history.window_points(10.0).is_empty());
        assert!(history.points().is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn log_points_skip_non_positive_pressures() {
        let mut history = SampleHistory::new();
        history.push(sample(0.0, 1.0e-6));
        history.push(sample(1.0, 0.0));
        history.push(sample(2.0, 1.0e-4));
        let points = history.log_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0][1], -6.0);
        assert_eq!(points[1][1], -4.0);
    }
}
