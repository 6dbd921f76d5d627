//! Desktop pressure monitor for the Pfeiffer TPG261 gauge controller.
//!
//! Opens the controller (or the simulated gauge with `--demo`), performs
//! the startup reads, optionally coordinates with sibling instrument
//! controllers over a shared readiness marker, then hands the polling
//! worker to the GUI.

use chrono::Local;
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tpg261_protocol::gui::{MonitorApp, StartupInfo};
use tpg261_protocol::monitor::Monitor;
use tpg261_protocol::readiness::ReadyFile;
use tpg261_protocol::sim::SimulatedGauge;
use tpg261_protocol::storage::{PressureLog, Sample};
use tpg261_protocol::{Gauge, PortSettings, PressureUnit, Tpg261};

#[derive(Parser)]
#[command(
    name = "tpg261-monitor",
    about = "Pressure monitor for the Pfeiffer TPG261 single gauge controller"
)]
struct Cli {
    /// Serial port of the controller (e.g. /dev/ttyUSB0 or COM23)
    #[arg(long, conflicts_with = "demo")]
    port: Option<String>,

    /// Run against a simulated gauge instead of hardware
    #[arg(long)]
    demo: bool,

    /// Serial baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Pressure unit to select at startup (mbar, torr or pascal)
    #[arg(long, default_value = "torr")]
    units: PressureUnit,

    /// Directory for the session CSV log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Disable CSV logging
    #[arg(long)]
    no_log: bool,

    /// Shared readiness marker coordinating sibling controllers
    #[arg(long)]
    ready_file: Option<PathBuf>,

    /// Name announced in the readiness marker
    #[arg(long, default_value = "TPG261_Controller")]
    controller_name: String,

    /// Peer controller names to wait for before polling starts
    #[arg(long)]
    wait_for: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = PortSettings {
        baud_rate: cli.baud,
        ..PortSettings::default()
    };

    let (mut client, port_label) = if cli.demo {
        info!("running against the simulated gauge");
        let client = Tpg261::from_channel(Box::new(SimulatedGauge::new()))?;
        (client, "simulated gauge".to_string())
    } else {
        let port = match cli.port {
            Some(port) => port,
            None => {
                eprintln!("--port is required unless --demo is given; available ports:");
                for port in Tpg261::list_ports()? {
                    eprintln!("  {}", port.port_name);
                }
                std::process::exit(2);
            }
        };
        let client = Tpg261::open_with(&port, &settings)?;
        (client, port)
    };

    let unit_label = client.set_units(cli.units)?.label().to_string();

    // Startup reads shown in the window before the first polled sample.
    let reading = client.pressure(Gauge::One)?;
    let (sensor1, sensor2) = client.gauge_type()?;
    let calibration = client.calibration_factors()?;
    let initial = Sample {
        time: Local::now(),
        elapsed_min: 0.0,
        status: reading.status,
        pressure: reading.value,
    };
    info!(
        "gauge {} reads {:.3e} {} ({})",
        sensor1, initial.pressure, unit_label, initial.status
    );

    let ready_file = cli
        .ready_file
        .map(|path| ReadyFile::new(path, cli.controller_name));
    if let Some(ready) = &ready_file {
        ready.announce()?;
        if !cli.wait_for.is_empty() {
            ready.wait_for_peers(&cli.wait_for, Duration::from_millis(10), None)?;
        }
    }

    let log = if cli.no_log {
        None
    } else {
        Some(PressureLog::create(&cli.log_dir)?)
    };
    let monitor = Monitor::spawn(client, Duration::from_millis(cli.interval_ms), log)?;

    let app = MonitorApp::new(
        monitor,
        ready_file,
        StartupInfo {
            port_label,
            unit_label,
            sensor1,
            sensor2,
            initial,
            calibration,
        },
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([780.0, 720.0])
            .with_min_inner_size([560.0, 520.0])
            .with_title("TPG261 Pfeiffer Vacuum Single Gauge"),
        ..Default::default()
    };
    eframe::run_native(
        "TPG261 Monitor",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
