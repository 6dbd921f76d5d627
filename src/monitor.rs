//! Polling worker that owns the controller client.
//!
//! The protocol is half-duplex with no transaction identifiers, so exactly
//! one thread may drive the client. The monitor owns it, polls gauge 1 on
//! a fixed cadence, appends every sample to the session CSV and publishes
//! updates over a channel. Everything else, the GUI included, talks to the
//! worker through [`MonitorCommand`] and [`MonitorEvent`].

use crate::error::Tpg261Error;
use crate::protocol::Tpg261;
use crate::storage::{PressureLog, Sample};
use crate::types::Gauge;
use chrono::Local;
use log::{info, warn};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Requests the GUI sends to the polling thread.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorCommand {
    /// Write one gauge's calibration factor; the other stays at unity
    SetCalibration(Gauge, f64),
    /// Stop polling, close the client and flush the log
    Shutdown,
}

/// Updates the polling thread publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A fresh pressure sample
    Sample(Sample),
    /// Both calibration factors as last reported by the controller
    Calibration { gauge1: String, gauge2: String },
    /// The poll loop stopped on an error; the client has been closed
    Fault(String),
}

/// Handle on the polling thread.
pub struct Monitor {
    commands: Sender<MonitorCommand>,
    events: Receiver<MonitorEvent>,
    worker: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Move `client` to a worker thread polling every `interval`.
    pub fn spawn(
        client: Tpg261,
        interval: Duration,
        log: Option<PressureLog>,
    ) -> io::Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("tpg261-monitor".into())
            .spawn(move || run(client, interval, log, command_rx, event_tx))?;
        Ok(Self {
            commands: command_tx,
            events: event_rx,
            worker: Some(worker),
        })
    }

    /// Ask the worker to write a calibration factor.
    pub fn set_calibration(&self, gauge: Gauge, factor: f64) {
        let _ = self
            .commands
            .send(MonitorCommand::SetCalibration(gauge, factor));
    }

    /// Drain whatever events arrived since the last call.
    pub fn poll_events(&self) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_event(&self, timeout: Duration) -> Option<MonitorEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stop the worker and wait for it to finish. Safe to call more than
    /// once.
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(MonitorCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut client: Tpg261,
    interval: Duration,
    mut log: Option<PressureLog>,
    commands: Receiver<MonitorCommand>,
    events: Sender<MonitorEvent>,
) {
    info!("monitor polling every {:?}", interval);
    let started = Instant::now();
    let mut log_failed = false;

    'poll: loop {
        // Apply pending requests before touching the instrument.
        loop {
            match commands.try_recv() {
                Ok(MonitorCommand::SetCalibration(gauge, factor)) => {
                    if let Err(e) = client.set_calibration_factor(gauge, factor) {
                        fault(&events, &e);
                        break 'poll;
                    }
                }
                Ok(MonitorCommand::Shutdown) => break 'poll,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'poll,
            }
        }

        let tick = Instant::now();

        let reading = match client.pressure(Gauge::One) {
            Ok(reading) => reading,
            Err(e) => {
                fault(&events, &e);
                break 'poll;
            }
        };
        let sample = Sample {
            time: Local::now(),
            elapsed_min: started.elapsed().as_secs_f64() / 60.0,
            status: reading.status,
            pressure: reading.value,
        };
        if let Some(log) = log.as_mut() {
            if let Err(e) = log.append(&sample) {
                if !log_failed {
                    warn!("CSV log failed, dropping further rows: {}", e);
                    log_failed = true;
                }
            }
        }
        let _ = events.send(MonitorEvent::Sample(sample));

        match client.calibration_factors() {
            Ok((gauge1, gauge2)) => {
                let _ = events.send(MonitorEvent::Calibration { gauge1, gauge2 });
            }
            Err(e) => {
                fault(&events, &e);
                break 'poll;
            }
        }

        if let Some(remaining) = interval.checked_sub(tick.elapsed()) {
            thread::sleep(remaining);
        }
    }

    client.close();
    if let Some(log) = log.as_mut() {
        let _ = log.flush();
    }
    info!("monitor stopped");
}

fn fault(events: &Sender<MonitorEvent>, error: &Tpg261Error) {
    warn!("poll loop stopping: {}", error);
    let _ = events.send(MonitorEvent::Fault(error.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_channel::MockChannel;
    use crate::sim::SimulatedGauge;
    use crate::storage::PressureLog;

    const STEP: Duration = Duration::from_millis(5);
    const PATIENCE: Duration = Duration::from_secs(2);

    fn sim_client(seed: u64) -> Tpg261 {
        Tpg261::from_channel(Box::new(SimulatedGauge::with_seed(seed))).unwrap()
    }

    #[test]
    fn publishes_samples_and_calibration() {
        let mut monitor = Monitor::spawn(sim_client(1), STEP, None).unwrap();

        let deadline = Instant::now() + PATIENCE;
        let mut saw_sample = false;
        let mut saw_calibration = false;
        while Instant::now() < deadline && !(saw_sample && saw_calibration) {
            match monitor.recv_event(Duration::from_millis(200)) {
                Some(MonitorEvent::Sample(sample)) => {
                    assert!(sample.pressure > 0.0);
                    assert!(sample.elapsed_min >= 0.0);
                    saw_sample = true;
                }
                Some(MonitorEvent::Calibration { gauge1, gauge2 }) => {
                    assert_eq!(gauge1, "1.000");
                    assert_eq!(gauge2, "1.000");
                    saw_calibration = true;
                }
                Some(MonitorEvent::Fault(message)) => panic!("unexpected fault: {}", message),
                None => {}
            }
        }
        assert!(saw_sample && saw_calibration);
        monitor.shutdown();
    }

    #[test]
    fn calibration_request_reaches_the_controller() {
        let mut monitor = Monitor::spawn(sim_client(2), STEP, None).unwrap();
        monitor.set_calibration(Gauge::One, 2.0);

        let deadline = Instant::now() + PATIENCE;
        let mut confirmed = false;
        while Instant::now() < deadline && !confirmed {
            if let Some(MonitorEvent::Calibration { gauge1, .. }) =
                monitor.recv_event(Duration::from_millis(200))
            {
                confirmed = gauge1 == "2.000";
            }
        }
        assert!(confirmed);
        monitor.shutdown();
    }

    #[test]
    fn fault_is_published_when_the_channel_dies() {
        // Script only the initialization; the first poll then times out.
        let mut mock = MockChannel::new();
        mock.push_init_sequence();
        let client = Tpg261::from_channel(Box::new(mock)).unwrap();

        let mut monitor = Monitor::spawn(client, STEP, None).unwrap();
        let deadline = Instant::now() + PATIENCE;
        let mut fault = None;
        while Instant::now() < deadline && fault.is_none() {
            if let Some(MonitorEvent::Fault(message)) =
                monitor.recv_event(Duration::from_millis(200))
            {
                fault = Some(message);
            }
        }
        let message = fault.expect("no fault event");
        assert!(message.contains("PR1"));
        monitor.shutdown();
    }

    #[test]
    fn samples_land_in_the_session_csv() {
        let dir = tempfile::tempdir().unwrap();
        let log = PressureLog::create(dir.path()).unwrap();
        let path = log.path().to_path_buf();

        let mut monitor = Monitor::spawn(sim_client(3), STEP, Some(log)).unwrap();
        let deadline = Instant::now() + PATIENCE;
        let mut samples = 0;
        while Instant::now() < deadline && samples < 3 {
            if let Some(MonitorEvent::Sample(_)) = monitor.recv_event(Duration::from_millis(200)) {
                samples += 1;
            }
        }
        monitor.shutdown();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "time,elapsed_min,status,pressure");
        assert!(lines.count() >= 3);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut monitor = Monitor::spawn(sim_client(4), STEP, None).unwrap();
        monitor.shutdown();
        monitor.shutdown();
    }
}
