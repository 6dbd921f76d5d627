//! Byte transport under the protocol client.
//!
//! The client drives a [`Channel`]: writes go out verbatim, reads hand back
//! one terminator-stripped line at a time. [`SerialChannel`] is the real
//! RS-232 implementation; the simulated gauge and the test doubles plug in
//! behind the same trait.

use crate::constants::{CR, LF};
use crate::types::PortSettings;
use log::trace;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Byte transport the protocol client runs on.
pub trait Channel: Send {
    /// Write raw bytes to the device.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one response line with the CR/LF terminator stripped.
    ///
    /// A line is everything up to the next LF; trailing CR bytes are
    /// removed before the line is returned. Implementations must fail with
    /// [`io::ErrorKind::TimedOut`] when no complete line arrives in time.
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
}

/// Synchronous serial connection with the controller framing (8-N-1, no
/// flow control).
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
}

impl SerialChannel {
    /// Open and configure the port.
    pub fn open(path: &str, settings: &PortSettings) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.read_timeout)
            .open()?;
        Ok(Self {
            port,
            read_timeout: settings.read_timeout,
        })
    }
}

impl Channel for SerialChannel {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        // Stale bytes from an aborted exchange would be mistaken for the
        // acknowledgement of this one.
        self.port.clear(serialport::ClearBuffer::Input)?;
        self.port.write_all(bytes)?;
        trace!("tx {:02X?}", bytes);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let line = read_line_bounded(&mut *self.port, self.read_timeout)?;
        trace!("rx {:02X?}", line);
        Ok(line)
    }
}

/// Read bytes until LF, enforcing `timeout` across the whole line rather
/// than per byte. A device dribbling bytes slower than the port timeout
/// would otherwise hold the caller indefinitely.
pub(crate) fn read_line_bounded<R: Read + ?Sized>(
    reader: &mut R,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "channel yielded no data",
                ))
            }
            Ok(_) => {
                if byte[0] == LF {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "response line exceeded the read timeout",
            ));
        }
    }
    while line.last() == Some(&CR) {
        line.pop();
    }
    Ok(line)
}
