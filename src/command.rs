//! Typed construction of controller commands.
//!
//! Each operation of the protocol client is backed by one [`Command`]
//! variant. The variant knows its wire spelling and how many fields the
//! matching response line must carry, so the exchange logic never touches
//! raw command strings.

use crate::constants::LINE_TERMINATOR;
use crate::types::{FilterSpeed, Gauge, PressureUnit};

/// One controller command, parameters included.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Read the pressure of one channel (`PR1` / `PR2`)
    ReadPressure(Gauge),
    /// Read both transmitter identifications (`TID`)
    Identify,
    /// Read both calibration factors (`CAl`)
    QueryCalibration,
    /// Write both calibration factors (`CAL,<g1>,<g2>`)
    SetCalibration { gauge1: f64, gauge2: f64 },
    /// Select the pressure unit (`UNI,<code>`)
    SetUnits(PressureUnit),
    /// Select the filter speed of both channels (`FIL,<c1>,<c2>`)
    SetFilter(FilterSpeed, FilterSpeed),
    /// Select the display resolution in digits (`DCD,<digits>`)
    SetDisplayResolution(u8),
}

impl Command {
    /// Mnemonic used in error reports. Pressure reads include the channel
    /// digit so a failing `PR2` is distinguishable from a failing `PR1`.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::ReadPressure(Gauge::One) => "PR1",
            Command::ReadPressure(Gauge::Two) => "PR2",
            Command::Identify => "TID",
            Command::QueryCalibration => "CAl",
            Command::SetCalibration { .. } => "CAL",
            Command::SetUnits(_) => "UNI",
            Command::SetFilter(..) => "FIL",
            Command::SetDisplayResolution(_) => "DCD",
        }
    }

    /// Number of comma-separated fields the response line must carry.
    pub fn expected_fields(&self) -> usize {
        match self {
            Command::ReadPressure(_) => 2,
            Command::Identify => 2,
            Command::QueryCalibration => 2,
            Command::SetCalibration { .. } => 2,
            Command::SetUnits(_) => 1,
            Command::SetFilter(..) => 2,
            Command::SetDisplayResolution(_) => 1,
        }
    }

    /// Serialize to the on-wire byte sequence, CR LF terminator included.
    ///
    /// Calibration factors are formatted to three decimals and the
    /// calibration query keeps the lowercase `l` spelling; both match what
    /// the controller firmware accepts.
    pub fn encode(&self) -> Vec<u8> {
        let text = match self {
            Command::ReadPressure(gauge) => format!("PR{}", gauge.index()),
            Command::Identify => "TID".to_string(),
            Command::QueryCalibration => "CAl".to_string(),
            Command::SetCalibration { gauge1, gauge2 } => {
                format!("CAL,{:.3},{:.3}", gauge1, gauge2)
            }
            Command::SetUnits(unit) => format!("UNI,{}", unit.code()),
            Command::SetFilter(first, second) => {
                format!("FIL,{},{}", first.code(), second.code())
            }
            Command::SetDisplayResolution(digits) => format!("DCD,{}", digits),
        };
        let mut bytes = text.into_bytes();
        bytes.extend_from_slice(&LINE_TERMINATOR);
        bytes
    }
}
