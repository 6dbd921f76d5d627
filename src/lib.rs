//! # TPG261 Protocol Library
//!
//! A Rust library for interfacing with the Pfeiffer TPG261 single gauge
//! vacuum controller over its RS-232 port, plus the polling worker and
//! desktop window the lab's pressure monitor is built on.
//!
//! The controller speaks a half-duplex request/acknowledge protocol: every
//! ASCII command line is answered by a single ACK or NAK byte, and a
//! positive acknowledgement is followed by one ENQ-triggered response line
//! of comma-separated fields. The [`Tpg261`] client owns the serial channel
//! and performs that exchange for every typed operation.
//!
//! ## Features
//!
//! - Typed, validated readings: pressure with its advisory measurement
//!   status, gauge identification, calibration factors
//! - Controller configuration: pressure unit, filter speed, display
//!   resolution, per-gauge calibration
//! - Fixed initialization sequence at construction
//! - CSV session logging and a bounded in-memory history for plotting
//! - Simulated gauge for running demos and the GUI without hardware
//! - `gui` feature: eframe desktop monitor (the `tpg261-monitor` binary)
//!
//! ## Example
//!
//! ```no_run
//! use tpg261_protocol::{Gauge, Tpg261};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut gauge = Tpg261::open("/dev/ttyUSB0")?;
//!     let reading = gauge.pressure(Gauge::One)?;
//!     println!("{}: {:.3e}", reading.status, reading.value);
//!     gauge.close();
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod constants;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod readiness;
pub mod sim;
pub mod storage;
pub mod types;

#[cfg(feature = "gui")]
pub mod gui;

#[cfg(test)]
mod mock_channel;

pub use channel::{Channel, SerialChannel};
pub use command::Command;
pub use error::{Result, Tpg261Error};
pub use protocol::Tpg261;
pub use types::*;
