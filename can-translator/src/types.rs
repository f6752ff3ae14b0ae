//! Core types for the CAN translator library
//!
//! This module defines the values that flow through the translator: raw CAN
//! messages on the bus side, typed values on the host side, and the error type
//! shared by every fallible operation.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for translator operations
pub type Result<T> = std::result::Result<T, TranslatorError>;

/// Number of payload bytes in a classic CAN frame
pub const FRAME_SIZE: usize = 8;

/// A CAN message: frame identifier plus a 64-bit payload
///
/// The payload is stored big-endian: byte 0 of the frame is the most
/// significant byte of `data`. This matches the MSB-first bit numbering used
/// by [`crate::bitfield`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanMessage {
    /// CAN message ID (11-bit or 29-bit)
    pub id: u32,
    /// Frame payload, byte 0 in the most significant position
    pub data: u64,
}

impl CanMessage {
    /// Create a message from an ID and an already packed payload
    pub fn new(id: u32, data: u64) -> Self {
        Self { id, data }
    }

    /// Build a message from up to 8 payload bytes
    ///
    /// Short frames are zero-padded on the right, so byte 0 always lands in
    /// the most significant position. Bytes past the eighth are ignored.
    pub fn from_bytes(id: u32, bytes: &[u8]) -> Self {
        let mut payload = [0u8; FRAME_SIZE];
        let len = bytes.len().min(FRAME_SIZE);
        payload[..len].copy_from_slice(&bytes[..len]);
        Self {
            id,
            data: BigEndian::read_u64(&payload),
        }
    }

    /// Payload as frame bytes, byte 0 first
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut payload = [0u8; FRAME_SIZE];
        BigEndian::write_u64(&mut payload, self.data);
        payload
    }
}

impl fmt::Display for CanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}#", self.id)?;
        for byte in self.to_bytes() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// A frame received from a bus driver, tagged with the bus it arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// Index of the bus in the signal table
    pub bus: usize,
    /// The received message
    pub message: CanMessage,
}

impl CanFrame {
    pub fn new(bus: usize, id: u32, data: u64) -> Self {
        Self {
            bus,
            message: CanMessage::new(id, data),
        }
    }
}

/// Errors that can occur while loading tables or driving a bus
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    #[error("Failed to parse signal table: {0}")]
    TableParseError(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to transmit CAN message 0x{id:X}: {reason}")]
    TransmitError { id: u32, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// An application-level value, as exchanged with the host
///
/// Serialized untagged so it maps directly onto a JSON number, boolean or
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value (after scaling/offset)
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// String value, e.g. the name of an enumerated state
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

impl Value {
    /// Numeric view of this value, if it is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view of this value, if it is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of this value, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// One unit handed to a [`MessageEmitter`]: a named value with an optional event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedMessage {
    /// Generic signal (or command) name
    pub name: String,
    /// Translated value
    pub value: Value,
    /// Optional secondary value, e.g. the event of a button press
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
}

impl TranslatedMessage {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            event: None,
        }
    }

    /// Builder method: attach an event value
    pub fn with_event(mut self, event: impl Into<Value>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Receiver of translated values
///
/// Serialization and delivery to the host are the emitter's business; the
/// translator only hands over one message per emission.
pub trait MessageEmitter {
    /// Accept a translated signal or command value
    fn emit(&mut self, message: TranslatedMessage);

    /// Accept a raw frame passed through untranslated
    ///
    /// Only called when raw frame emission is enabled in the
    /// [`crate::TranslatorConfig`]. Ignored by default.
    fn emit_raw(&mut self, _message: &CanMessage) {}
}

/// Emitter that keeps everything it receives, in order
#[derive(Debug, Clone, Default)]
pub struct CollectingEmitter {
    pub messages: Vec<TranslatedMessage>,
    pub raw: Vec<CanMessage>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything collected so far
    pub fn clear(&mut self) {
        self.messages.clear();
        self.raw.clear();
    }
}

impl MessageEmitter for CollectingEmitter {
    fn emit(&mut self, message: TranslatedMessage) {
        self.messages.push(message);
    }

    fn emit_raw(&mut self, message: &CanMessage) {
        self.raw.push(*message);
    }
}
