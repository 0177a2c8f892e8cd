//! # Error Types
//!
//! Custom error types for the Ally gamepad core using `thiserror`.
//!
//! Errors are split by where they originate:
//! - [`ValidationError`] never leaves the host; nothing is sent.
//! - [`ProtocolError`] is raised while framing or checking a command.
//! - [`TransportError`] comes back from the transport unchanged.

use thiserror::Error;

use crate::hid::protocol::CommandId;

/// Main error type for the gamepad core
#[derive(Debug, Error)]
pub enum AllyError {
    /// Input rejected before anything was encoded
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Framing, length or acknowledgement failure
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport round-trip failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// hidapi failure while opening a node
    #[error("hidapi error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// No hidraw node could be opened
    #[error("gamepad device not found (tried: {0})")]
    DeviceNotFound(String),

    /// The configuration store has not been initialized yet
    #[error("device not ready: gamepad configuration is not initialized")]
    DeviceNotReady,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected input values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Action name missing from the action table
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// Numeric value outside its field range
    #[error("{field} = {value} is out of range ({min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Textual input that could not be parsed
    #[error("malformed input for {field}: '{input}'")]
    Malformed { field: &'static str, input: String },

    /// Index outside the addressable range (e.g. curve point 5)
    #[error("{what} index {index} is out of bounds")]
    Bounds { what: &'static str, index: usize },

    /// The button pair has no slot in the turbo block
    #[error("button pair '{0}' has no turbo slot")]
    TurboUnsupported(&'static str),

    /// Key combination that cannot be represented in one action record
    #[error("invalid key combination '{0}'")]
    InvalidCombo(String),

    /// Attribute path not in the attribute table
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// Attribute can only be stored, not shown
    #[error("attribute '{0}' is write-only")]
    WriteOnly(String),
}

/// Protocol level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload size differs from the fixed size of the command
    #[error("{command:?} expects a {expected}-byte payload, got {actual}")]
    PayloadLength {
        command: CommandId,
        expected: usize,
        actual: usize,
    },

    /// Argument byte supplied to (or missing from) a command
    #[error("{command:?} argument mismatch")]
    Argument { command: CommandId },

    /// Device answered without acknowledging the command
    #[error("{command:?} was not acknowledged")]
    Nack { command: CommandId },

    /// Echoed argument or payload differs from the request
    #[error("{command:?} echo does not match the request")]
    EchoMismatch { command: CommandId },

    /// Response or block could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Block and report decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer length differs from the declared block length
    #[error("{what}: expected {expected} bytes, got {actual}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Field value outside its valid range
    #[error("{field} = {value} is out of range ({min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },

    /// Reserved byte that should be zero
    #[error("{what}: reserved byte at offset {offset} is 0x{value:02X}")]
    Reserved {
        what: &'static str,
        offset: usize,
        value: u8,
    },

    /// Unknown action kind or code inside an action record
    #[error("unknown action record {0:02X?}")]
    UnknownAction(Vec<u8>),

    /// Unknown command id in a report header
    #[error("unknown command id 0x{0:02X}")]
    UnknownCommand(u8),

    /// Report header does not carry the expected report id / code page
    #[error("bad report header {0:02X?}")]
    Header([u8; 2]),
}

/// Errors returned by a transport collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response within the allotted time
    #[error("timed out waiting for a response")]
    Timeout,

    /// Underlying I/O failure
    #[error("I/O failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Result type alias for the gamepad core
pub type Result<T> = std::result::Result<T, AllyError>;
