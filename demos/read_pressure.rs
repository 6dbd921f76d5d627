//! Read Pressure Example
//!
//! This example demonstrates the core functionality of the TPG261 protocol
//! library:
//! - Listing and selecting serial ports
//! - Opening the controller (which runs the initialization sequence)
//! - Reading gauge identification and calibration factors
//! - Reading the pressure of both sensor channels
//!
//! Usage:
//!   cargo run --example read_pressure                  # Interactive mode
//!   cargo run --example read_pressure -- COM23         # Specify port
//!   cargo run --example read_pressure -- /dev/ttyUSB0
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example read_pressure
//!   RUST_LOG=trace cargo run --example read_pressure   # Wire-level bytes

use inquire::Select;
use log::info;
use tpg261_protocol::{Gauge, Result, Tpg261};

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = Tpg261::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports
        .iter()
        .map(|p| format!("{} - {:?}", p.port_name, p.port_type))
        .collect();

    let selection = Select::new("Select a serial port:", port_names)
        .prompt()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Selection cancelled: {}", e),
            )
        })?;

    // Extract just the port name (before " - ")
    let port_name = selection.split(" - ").next().unwrap().to_string();
    Ok(port_name)
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Get port name from command line argument or interactive selection
    let port_name = std::env::args()
        .nth(1)
        .map(Ok)
        .unwrap_or_else(select_port)?;

    info!("Connecting to TPG261 on {}...", port_name);
    let mut gauge = Tpg261::open(&port_name)?;
    info!("Controller initialized");

    let (sensor1, sensor2) = gauge.gauge_type()?;
    info!("Sensor 1: {}", sensor1);
    info!("Sensor 2: {}", sensor2);

    let (factor1, factor2) = gauge.calibration_factors()?;
    info!("Calibration factors: {} / {}", factor1, factor2);

    for channel in [Gauge::One, Gauge::Two] {
        let reading = gauge.pressure(channel)?;
        info!(
            "Gauge {}: {:.3e} ({})",
            channel,
            reading.value,
            reading.status.label()
        );
    }

    gauge.close();
    Ok(())
}
