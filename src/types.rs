//! Typed values exchanged with the TPG261 controller.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Sensor channel selector.
///
/// The TPG261 fronts two measurement channels even when only the first one
/// carries a gauge; the second then identifies as `noSEn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    One,
    Two,
}

impl Gauge {
    /// Channel digit used on the wire (`PR1`, `PR2`) and for picking the
    /// matching calibration field.
    pub fn index(self) -> u8 {
        match self {
            Gauge::One => 1,
            Gauge::Two => 2,
        }
    }
}

impl fmt::Display for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Status code outside the documented range.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown measurement status code {0}")]
pub struct UnknownStatus(pub u8);

/// Measurement status transmitted with every pressure reading.
///
/// Only `Passed` marks a value the gauge trusts. The other states are
/// advisory: the numeric reading is still reported alongside them and the
/// caller decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeStatus {
    Passed,
    Underrange,
    Overrange,
    SensorError,
    SensorOff,
    NoSensor,
    IdError,
}

impl GaugeStatus {
    /// Wire status code.
    pub fn code(self) -> u8 {
        match self {
            GaugeStatus::Passed => 0,
            GaugeStatus::Underrange => 1,
            GaugeStatus::Overrange => 2,
            GaugeStatus::SensorError => 3,
            GaugeStatus::SensorOff => 4,
            GaugeStatus::NoSensor => 5,
            GaugeStatus::IdError => 6,
        }
    }

    /// Human-readable label, matching the controller front panel.
    pub fn label(self) -> &'static str {
        match self {
            GaugeStatus::Passed => "Passed",
            GaugeStatus::Underrange => "Underrange",
            GaugeStatus::Overrange => "Overrange",
            GaugeStatus::SensorError => "Sensor Error",
            GaugeStatus::SensorOff => "Sensor Off",
            GaugeStatus::NoSensor => "No Sensor",
            GaugeStatus::IdError => "ID Error",
        }
    }

    /// True when the reading carries a measurement the gauge trusts.
    pub fn is_passed(self) -> bool {
        matches!(self, GaugeStatus::Passed)
    }
}

impl TryFrom<u8> for GaugeStatus {
    type Error = UnknownStatus;

    fn try_from(code: u8) -> Result<Self, UnknownStatus> {
        match code {
            0 => Ok(GaugeStatus::Passed),
            1 => Ok(GaugeStatus::Underrange),
            2 => Ok(GaugeStatus::Overrange),
            3 => Ok(GaugeStatus::SensorError),
            4 => Ok(GaugeStatus::SensorOff),
            5 => Ok(GaugeStatus::NoSensor),
            6 => Ok(GaugeStatus::IdError),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl fmt::Display for GaugeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GaugeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Unit code outside the documented range.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown pressure unit code {0}")]
pub struct UnknownUnit(pub u8);

/// Unit name that does not match any selectable unit.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unrecognized pressure unit {0:?} (expected mbar, torr or pascal)")]
pub struct ParseUnitError(String);

/// Pressure units selectable on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    MbarBar,
    Torr,
    Pascal,
}

impl PressureUnit {
    /// Wire unit code used by `UNI`.
    pub fn code(self) -> u8 {
        match self {
            PressureUnit::MbarBar => 0,
            PressureUnit::Torr => 1,
            PressureUnit::Pascal => 2,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            PressureUnit::MbarBar => "mbar/bar",
            PressureUnit::Torr => "Torr",
            PressureUnit::Pascal => "Pascal",
        }
    }
}

impl TryFrom<u8> for PressureUnit {
    type Error = UnknownUnit;

    fn try_from(code: u8) -> Result<Self, UnknownUnit> {
        match code {
            0 => Ok(PressureUnit::MbarBar),
            1 => Ok(PressureUnit::Torr),
            2 => Ok(PressureUnit::Pascal),
            other => Err(UnknownUnit(other)),
        }
    }
}

impl FromStr for PressureUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, ParseUnitError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "mbar" | "bar" | "mbar/bar" => Ok(PressureUnit::MbarBar),
            "1" | "torr" => Ok(PressureUnit::Torr),
            "2" | "pa" | "pascal" => Ok(PressureUnit::Pascal),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter code outside the documented range.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown filter speed code {0}")]
pub struct UnknownFilter(pub u8);

/// Measurement filter time constants selectable per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSpeed {
    Fast,
    Medium,
    Slow,
}

impl FilterSpeed {
    /// Wire filter code used by `FIL`.
    pub fn code(self) -> u8 {
        match self {
            FilterSpeed::Fast => 0,
            FilterSpeed::Medium => 1,
            FilterSpeed::Slow => 2,
        }
    }
}

impl TryFrom<u8> for FilterSpeed {
    type Error = UnknownFilter;

    fn try_from(code: u8) -> Result<Self, UnknownFilter> {
        match code {
            0 => Ok(FilterSpeed::Fast),
            1 => Ok(FilterSpeed::Medium),
            2 => Ok(FilterSpeed::Slow),
            other => Err(UnknownFilter(other)),
        }
    }
}

impl fmt::Display for FilterSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterSpeed::Fast => "fast",
            FilterSpeed::Medium => "medium",
            FilterSpeed::Slow => "slow",
        };
        f.write_str(name)
    }
}

/// One pressure measurement with its advisory status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureReading {
    /// Measurement status reported with the value
    pub status: GaugeStatus,
    /// Pressure in the controller's configured unit
    pub value: f64,
}

impl PressureReading {
    /// True when the status marks the value as trustworthy.
    pub fn is_valid(&self) -> bool {
        self.status.is_passed()
    }
}

/// Serial line settings. Framing is fixed at 8-N-1 by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    /// Baud rate of the RS-232 link
    pub baud_rate: u32,
    /// How long a read waits for the controller before giving up
    pub read_timeout: Duration,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            baud_rate: crate::constants::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(crate::constants::DEFAULT_TIMEOUT_MS),
        }
    }
}
