//! Error types for TPG261 protocol operations.

use thiserror::Error;

/// Result type alias for TPG261 operations.
pub type Result<T> = std::result::Result<T, Tpg261Error>;

/// Error types for TPG261 gauge controller communication.
///
/// `SerialPort` and `Io` cover connection and transport failures. The
/// remaining variants are protocol violations: the controller answered,
/// but not in the shape the exchange requires. A timeout counts as a
/// protocol violation, not a transport failure.
#[derive(Error, Debug)]
pub enum Tpg261Error {
    /// Serial port open or configuration error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error on the channel
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No response within the read timeout window
    #[error("Timeout waiting for reply to '{command}'")]
    Timeout {
        /// Command that went unanswered
        command: String,
    },

    /// Controller answered NAK; the command was not executed
    #[error("Command '{command}' rejected by controller (NAK)")]
    Rejected {
        /// Command that was refused
        command: String,
    },

    /// First reply line was neither a lone ACK nor a lone NAK
    #[error("Unexpected acknowledgement to '{command}': {response:02X?}")]
    UnexpectedAck {
        /// Command that was being acknowledged
        command: String,
        /// Raw bytes of the reply line, terminator stripped
        response: Vec<u8>,
    },

    /// Response line carried the wrong number of comma-separated fields
    #[error("Malformed response to '{command}': expected {expected} fields, got {actual} in {line:?}")]
    FieldCount {
        /// Command whose response was malformed
        command: String,
        /// Field count the command requires
        expected: usize,
        /// Field count actually received
        actual: usize,
        /// Full response line
        line: String,
    },

    /// Response text failed ASCII decoding or numeric parsing
    #[error("Malformed response to '{command}': {detail}")]
    Malformed {
        /// Command whose response was malformed
        command: String,
        /// What failed to parse
        detail: String,
    },

    /// Operation attempted after `close()`
    #[error("Channel is closed")]
    Closed,
}
