//! TPG261 gauge controller client.
//!
//! Every operation is one half-duplex exchange: the command line goes out,
//! the controller answers with a single ACK or NAK byte on its own line,
//! and a positive acknowledgement is followed by one ENQ-triggered response
//! line of comma-separated fields. The controller carries no transaction
//! identifiers, so the client owns its channel exclusively and finishes
//! each exchange before starting the next.

use crate::channel::{Channel, SerialChannel};
use crate::command::Command;
use crate::constants::{ACK, DEFAULT_DISPLAY_DIGITS, ENQ, NAK, UNITY_CALIBRATION};
use crate::error::{Result, Tpg261Error};
use crate::types::{
    FilterSpeed, Gauge, GaugeStatus, PortSettings, PressureReading, PressureUnit,
};
use log::{debug, info, trace};
use std::fmt;

/// Client for the TPG261 single gauge vacuum controller.
pub struct Tpg261 {
    channel: Option<Box<dyn Channel>>,
}

impl Tpg261 {
    /// Open `path` with default settings and initialize the controller.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, &PortSettings::default())
    }

    /// Open `path` with explicit settings and initialize the controller.
    pub fn open_with(path: &str, settings: &PortSettings) -> Result<Self> {
        info!("opening TPG261 on {} at {} baud", path, settings.baud_rate);
        let channel = SerialChannel::open(path, settings)?;
        Self::from_channel(Box::new(channel))
    }

    /// Build a client over an already open channel and initialize the
    /// controller: medium filter on both channels, unity calibration on
    /// both gauges, three digit display resolution. Each step is a full
    /// exchange and construction fails if the controller refuses any of
    /// them.
    ///
    /// This is also the seam the simulated gauge plugs into.
    pub fn from_channel(channel: Box<dyn Channel>) -> Result<Self> {
        let mut client = Self {
            channel: Some(channel),
        };
        client.set_filter(FilterSpeed::Medium, FilterSpeed::Medium)?;
        client.set_calibration_factor(Gauge::One, UNITY_CALIBRATION)?;
        client.set_calibration_factor(Gauge::Two, UNITY_CALIBRATION)?;
        client.set_display_resolution()?;
        debug!("controller initialized");
        Ok(client)
    }

    /// List available serial ports.
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }

    /// Read the pressure of one channel.
    ///
    /// The status is advisory: the numeric value is returned whatever the
    /// status says, and interpretation is left to the caller.
    pub fn pressure(&mut self, gauge: Gauge) -> Result<PressureReading> {
        let command = Command::ReadPressure(gauge);
        let name = command.mnemonic();
        let fields = self.transact(&command)?;
        let code: u8 = parse_field(name, &fields[0], "status code")?;
        let status = GaugeStatus::try_from(code).map_err(|e| malformed(name, e))?;
        let value: f64 = parse_field(name, &fields[1], "pressure value")?;
        Ok(PressureReading { status, value })
    }

    /// Read the transmitter identification of both sensor channels.
    pub fn gauge_type(&mut self) -> Result<(String, String)> {
        let fields = self.transact(&Command::Identify)?;
        Ok((fields[0].clone(), fields[1].clone()))
    }

    /// Read both calibration factors as the controller reports them.
    pub fn calibration_factors(&mut self) -> Result<(String, String)> {
        let fields = self.transact(&Command::QueryCalibration)?;
        Ok((fields[0].clone(), fields[1].clone()))
    }

    /// Write the calibration factor of one gauge, holding the other at
    /// unity. Returns the factor the controller echoes for the targeted
    /// gauge.
    pub fn set_calibration_factor(&mut self, gauge: Gauge, factor: f64) -> Result<String> {
        let command = match gauge {
            Gauge::One => Command::SetCalibration {
                gauge1: factor,
                gauge2: UNITY_CALIBRATION,
            },
            Gauge::Two => Command::SetCalibration {
                gauge1: UNITY_CALIBRATION,
                gauge2: factor,
            },
        };
        let fields = self.transact(&command)?;
        let echoed = match gauge {
            Gauge::One => fields[0].clone(),
            Gauge::Two => fields[1].clone(),
        };
        Ok(echoed)
    }

    /// Select the pressure unit. Returns the unit the controller confirms.
    pub fn set_units(&mut self, unit: PressureUnit) -> Result<PressureUnit> {
        let command = Command::SetUnits(unit);
        let name = command.mnemonic();
        let fields = self.transact(&command)?;
        let code: u8 = parse_field(name, &fields[0], "unit code")?;
        PressureUnit::try_from(code).map_err(|e| malformed(name, e))
    }

    /// Select the measurement filter speed of both channels. Returns the
    /// speeds the controller confirms.
    pub fn set_filter(
        &mut self,
        gauge1: FilterSpeed,
        gauge2: FilterSpeed,
    ) -> Result<(FilterSpeed, FilterSpeed)> {
        let command = Command::SetFilter(gauge1, gauge2);
        let name = command.mnemonic();
        let fields = self.transact(&command)?;
        let first: u8 = parse_field(name, &fields[0], "filter code")?;
        let second: u8 = parse_field(name, &fields[1], "filter code")?;
        Ok((
            FilterSpeed::try_from(first).map_err(|e| malformed(name, e))?,
            FilterSpeed::try_from(second).map_err(|e| malformed(name, e))?,
        ))
    }

    /// Select the three digit display resolution. Returns the digit count
    /// the controller confirms.
    pub fn set_display_resolution(&mut self) -> Result<u8> {
        let command = Command::SetDisplayResolution(DEFAULT_DISPLAY_DIGITS);
        let name = command.mnemonic();
        let fields = self.transact(&command)?;
        parse_field(name, &fields[0], "digit count")
    }

    /// Release the serial channel. Safe to call more than once; operations
    /// after the first call fail with [`Tpg261Error::Closed`].
    pub fn close(&mut self) {
        if self.channel.take().is_some() {
            info!("TPG261 channel closed");
        }
    }

    /// True until `close()` releases the channel.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// One request/acknowledge/data exchange, shared by every operation.
    ///
    /// On NAK or a garbled acknowledgement the exchange stops before ENQ
    /// is sent. The returned fields are already counted against the
    /// command's expected arity.
    fn transact(&mut self, command: &Command) -> Result<Vec<String>> {
        let name = command.mnemonic();
        let channel = self.channel.as_mut().ok_or(Tpg261Error::Closed)?;

        channel.send(&command.encode()).map_err(|e| io_error(name, e))?;

        let ack = channel.read_line().map_err(|e| io_error(name, e))?;
        match ack.as_slice() {
            [byte] if *byte == ACK => {}
            [byte] if *byte == NAK => {
                return Err(Tpg261Error::Rejected {
                    command: name.to_string(),
                })
            }
            other => {
                return Err(Tpg261Error::UnexpectedAck {
                    command: name.to_string(),
                    response: other.to_vec(),
                })
            }
        }

        channel.send(&[ENQ]).map_err(|e| io_error(name, e))?;

        let raw = channel.read_line().map_err(|e| io_error(name, e))?;
        let line = decode_ascii(name, raw)?;
        let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
        if fields.len() != command.expected_fields() {
            return Err(Tpg261Error::FieldCount {
                command: name.to_string(),
                expected: command.expected_fields(),
                actual: fields.len(),
                line,
            });
        }
        trace!("{} -> {:?}", name, fields);
        Ok(fields)
    }
}

impl fmt::Debug for Tpg261 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tpg261")
            .field("open", &self.is_open())
            .finish()
    }
}

fn io_error(command: &str, err: std::io::Error) -> Tpg261Error {
    if err.kind() == std::io::ErrorKind::TimedOut {
        Tpg261Error::Timeout {
            command: command.to_string(),
        }
    } else {
        Tpg261Error::Io(err)
    }
}

fn malformed(command: &str, detail: impl fmt::Display) -> Tpg261Error {
    Tpg261Error::Malformed {
        command: command.to_string(),
        detail: detail.to_string(),
    }
}

fn decode_ascii(command: &str, raw: Vec<u8>) -> Result<String> {
    match String::from_utf8(raw) {
        Ok(text) if text.is_ascii() => Ok(text),
        _ => Err(malformed(command, "response is not ASCII text")),
    }
}

fn parse_field<T: std::str::FromStr>(command: &str, field: &str, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| malformed(command, format!("{} {:?} does not parse", what, field)))
}
