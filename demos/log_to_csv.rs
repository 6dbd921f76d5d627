//! Headless Logging Example
//!
//! Polls gauge 1 at a fixed cadence and appends every sample to a session
//! CSV, without starting the GUI. Pass `demo` instead of a port name to run
//! against the simulated gauge.
//!
//! Usage:
//!   cargo run --example log_to_csv -- /dev/ttyUSB0        # 50 samples
//!   cargo run --example log_to_csv -- /dev/ttyUSB0 200    # 200 samples
//!   cargo run --example log_to_csv -- demo

use chrono::Local;
use log::info;
use std::path::Path;
use std::time::{Duration, Instant};
use tpg261_protocol::sim::SimulatedGauge;
use tpg261_protocol::storage::{PressureLog, Sample};
use tpg261_protocol::{Gauge, Result, Tpg261};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let target = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: log_to_csv <port|demo> [samples]");
        std::process::exit(2);
    });
    let samples: usize = std::env::args()
        .nth(2)
        .and_then(|n| n.parse().ok())
        .unwrap_or(50);

    let mut gauge = if target == "demo" {
        info!("Using the simulated gauge");
        let mut sim = SimulatedGauge::new();
        sim.set_base_pressure(4.0e-7);
        Tpg261::from_channel(Box::new(sim))?
    } else {
        info!("Connecting to TPG261 on {}...", target);
        Tpg261::open(&target)?
    };

    let mut log = PressureLog::create(Path::new("."))?;
    info!("Logging {} samples to {}", samples, log.path().display());

    let started = Instant::now();
    for _ in 0..samples {
        let tick = Instant::now();
        let reading = gauge.pressure(Gauge::One)?;
        log.append(&Sample {
            time: Local::now(),
            elapsed_min: started.elapsed().as_secs_f64() / 60.0,
            status: reading.status,
            pressure: reading.value,
        })?;
        if let Some(remaining) = POLL_INTERVAL.checked_sub(tick.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    log.flush()?;
    gauge.close();
    info!("Done: {}", log.path().display());
    Ok(())
}
