//! Simulated controller for demos, GUI work and tests without hardware.

use crate::channel::Channel;
use crate::constants::{ACK, CR, ENQ, LF, NAK};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io;

/// Device-side protocol state machine with a jittered pressure source.
///
/// Speaks the same exchange the real controller does: one ACK or NAK line
/// per command, one response line per ENQ. Configuration commands update
/// internal state so confirmations echo what was set, and calibration
/// factors scale the simulated readings.
pub struct SimulatedGauge {
    base_pressure: f64,
    jitter: f64,
    calibration: (f64, f64),
    units: u8,
    filter: (u8, u8),
    resolution: u8,
    pending: VecDeque<Vec<u8>>,
    response: Option<Vec<u8>>,
    rng: StdRng,
}

impl SimulatedGauge {
    /// Gauge sitting at 2.5e-6 with one percent of multiplicative jitter.
    pub fn new() -> Self {
        Self::build(StdRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(StdRng::seed_from_u64(seed))
    }

    fn build(rng: StdRng) -> Self {
        Self {
            base_pressure: 2.5e-6,
            jitter: 0.01,
            calibration: (1.0, 1.0),
            units: 1,
            filter: (1, 1),
            resolution: 3,
            pending: VecDeque::new(),
            response: None,
            rng,
        }
    }

    /// Change the pressure the simulated chamber sits at.
    pub fn set_base_pressure(&mut self, pressure: f64) {
        self.base_pressure = pressure;
    }

    fn reading(&mut self, channel: u8) -> f64 {
        let factor = if channel == 1 {
            self.calibration.0
        } else {
            self.calibration.1
        };
        let noise = 1.0 + self.jitter * (self.rng.gen::<f64>() - 0.5);
        self.base_pressure * factor * noise
    }

    fn handle_command(&mut self, line: &str) {
        match self.dispatch(line) {
            Some(data) => {
                self.pending.push_back(vec![ACK]);
                self.response = Some(data.into_bytes());
            }
            None => {
                self.pending.push_back(vec![NAK]);
                self.response = None;
            }
        }
    }

    /// Execute one command line. `None` means NAK.
    fn dispatch(&mut self, line: &str) -> Option<String> {
        let (mnemonic, params) = match line.split_once(',') {
            Some((m, p)) => (m, Some(p)),
            None => (line, None),
        };
        match mnemonic {
            "PR1" | "PR2" => {
                let channel = if mnemonic == "PR1" { 1 } else { 2 };
                let value = self.reading(channel);
                Some(format!("0,{:.4E}", value))
            }
            "TID" => Some("PKR,noSEn".to_string()),
            "CAl" => Some(format!(
                "{:.3},{:.3}",
                self.calibration.0, self.calibration.1
            )),
            "CAL" => {
                let (first, second) = params?.split_once(',')?;
                let gauge1: f64 = first.trim().parse().ok()?;
                let gauge2: f64 = second.trim().parse().ok()?;
                self.calibration = (gauge1, gauge2);
                Some(format!("{:.3},{:.3}", gauge1, gauge2))
            }
            // A bare configuration mnemonic reads the current value, with
            // parameters it writes.
            "UNI" => match params {
                None => Some(self.units.to_string()),
                Some(p) => {
                    let code: u8 = p.trim().parse().ok()?;
                    if code > 2 {
                        return None;
                    }
                    self.units = code;
                    Some(code.to_string())
                }
            },
            "FIL" => match params {
                None => Some(format!("{},{}", self.filter.0, self.filter.1)),
                Some(p) => {
                    let (first, second) = p.split_once(',')?;
                    let code1: u8 = first.trim().parse().ok()?;
                    let code2: u8 = second.trim().parse().ok()?;
                    if code1 > 2 || code2 > 2 {
                        return None;
                    }
                    self.filter = (code1, code2);
                    Some(format!("{},{}", code1, code2))
                }
            },
            "DCD" => match params {
                None => Some(self.resolution.to_string()),
                Some(p) => {
                    let digits: u8 = p.trim().parse().ok()?;
                    if !(2..=3).contains(&digits) {
                        return None;
                    }
                    self.resolution = digits;
                    Some(digits.to_string())
                }
            },
            _ => None,
        }
    }
}

impl Channel for SimulatedGauge {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.len() == 1 && bytes[0] == ENQ {
            // Without a positive acknowledgement there is nothing queued
            // and the following read times out, like the real device.
            if let Some(data) = self.response.take() {
                self.pending.push_back(data);
            }
            return Ok(());
        }

        let mut line = bytes.to_vec();
        while matches!(line.last(), Some(&CR) | Some(&LF)) {
            line.pop();
        }
        match String::from_utf8(line) {
            Ok(text) => self.handle_command(&text),
            Err(_) => {
                self.pending.push_back(vec![NAK]);
                self.response = None;
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        self.pending.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::TimedOut, "simulated gauge has nothing to say")
        })
    }
}

impl Default for SimulatedGauge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Tpg261Error;
    use crate::protocol::Tpg261;
    use crate::types::{Gauge, PressureUnit};

    #[test]
    fn full_protocol_cycle_through_the_client() {
        let mut client = Tpg261::from_channel(Box::new(SimulatedGauge::with_seed(7))).unwrap();

        let reading = client.pressure(Gauge::One).unwrap();
        assert!(reading.is_valid());
        assert!((reading.value - 2.5e-6).abs() < 2.5e-6 * 0.01);

        let (sensor1, sensor2) = client.gauge_type().unwrap();
        assert_eq!(sensor1, "PKR");
        assert_eq!(sensor2, "noSEn");

        let (factor1, factor2) = client.calibration_factors().unwrap();
        assert_eq!(factor1, "1.000");
        assert_eq!(factor2, "1.000");

        assert_eq!(
            client.set_units(PressureUnit::Pascal).unwrap(),
            PressureUnit::Pascal
        );
    }

    #[test]
    fn calibration_scales_the_reading() {
        let mut client = Tpg261::from_channel(Box::new(SimulatedGauge::with_seed(21))).unwrap();
        let echoed = client.set_calibration_factor(Gauge::One, 2.0).unwrap();
        assert_eq!(echoed, "2.000");

        let reading = client.pressure(Gauge::One).unwrap();
        let expected = 2.0 * 2.5e-6;
        assert!((reading.value - expected).abs() < expected * 0.01);
    }

    #[test]
    fn base_pressure_moves_the_reading() {
        let mut sim = SimulatedGauge::with_seed(9);
        sim.set_base_pressure(4.0e-7);
        let mut client = Tpg261::from_channel(Box::new(sim)).unwrap();

        let reading = client.pressure(Gauge::One).unwrap();
        assert!((reading.value - 4.0e-7).abs() < 4.0e-7 * 0.01);
    }

    #[test]
    fn unknown_commands_are_rejected() {
        let mut sim = SimulatedGauge::with_seed(3);
        sim.send(b"XYZ\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [NAK]);

        // ENQ after a NAK produces nothing to read.
        sim.send(&[ENQ]).unwrap();
        let err = sim.read_line().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn out_of_range_unit_is_rejected() {
        let mut sim = SimulatedGauge::with_seed(3);
        sim.send(b"UNI,9\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [NAK]);
    }

    #[test]
    fn bare_mnemonics_read_back_configured_state() {
        let mut sim = SimulatedGauge::with_seed(5);

        sim.send(b"UNI,2\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [ACK]);
        sim.send(&[ENQ]).unwrap();
        assert_eq!(sim.read_line().unwrap(), b"2");

        sim.send(b"UNI\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [ACK]);
        sim.send(&[ENQ]).unwrap();
        assert_eq!(sim.read_line().unwrap(), b"2");

        sim.send(b"FIL\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [ACK]);
        sim.send(&[ENQ]).unwrap();
        assert_eq!(sim.read_line().unwrap(), b"1,1");

        sim.send(b"DCD\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [ACK]);
        sim.send(&[ENQ]).unwrap();
        assert_eq!(sim.read_line().unwrap(), b"3");
    }

    #[test]
    fn pressure_exchange_at_the_byte_level() {
        let mut sim = SimulatedGauge::with_seed(11);
        sim.send(b"PR1\r\n").unwrap();
        assert_eq!(sim.read_line().unwrap(), [ACK]);
        sim.send(&[ENQ]).unwrap();
        let line = String::from_utf8(sim.read_line().unwrap()).unwrap();
        let (status, value) = line.split_once(',').unwrap();
        assert_eq!(status, "0");
        assert!(value.parse::<f64>().unwrap() > 0.0);
    }

    #[test]
    fn rejected_init_surfaces_from_the_client() {
        // A gauge that NAKs everything makes construction fail on the
        // first initialization step.
        struct Mute;
        impl Channel for Mute {
            fn send(&mut self, _bytes: &[u8]) -> io::Result<()> {
                Ok(())
            }
            fn read_line(&mut self) -> io::Result<Vec<u8>> {
                Ok(vec![NAK])
            }
        }
        let err = Tpg261::from_channel(Box::new(Mute)).unwrap_err();
        assert!(matches!(err, Tpg261Error::Rejected { .. }));
    }
}
