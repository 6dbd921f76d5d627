//! Protocol constants for TPG261 gauge controller communication.
//!
//! This module defines the control bytes and timing parameters of the
//! controller's RS-232 request/acknowledge protocol, plus the fixed values
//! written during initialization.

/// Carriage return, first byte of the line terminator
pub const CR: u8 = 0x0D;

/// Line feed, second byte of the line terminator
pub const LF: u8 = 0x0A;

/// Enquiry byte; asks the controller to transmit the queued response
pub const ENQ: u8 = 0x05;

/// Positive acknowledgement byte
pub const ACK: u8 = 0x06;

/// Negative acknowledgement byte
pub const NAK: u8 = 0x15;

/// Terminator appended to every command line (CR then LF)
pub const LINE_TERMINATOR: [u8; 2] = [CR, LF];

/// Factory default baud rate of the controller's RS-232 port
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Display resolution in digits requested during initialization
pub const DEFAULT_DISPLAY_DIGITS: u8 = 3;

/// Calibration factor written to both gauges during initialization
pub const UNITY_CALIBRATION: f64 = 1.0;
