//! Text frame input
//!
//! One frame per line, `ID#DATA` or `BUS:ID#DATA`, with the ID and payload in
//! hex (`7E0#0211223344`). The bus defaults to 0.

use can_translator::{CanFrame, CanMessage};
use thiserror::Error;

/// Maximum payload length of a classic CAN frame
const MAX_DATA_BYTES: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameParseError {
    #[error("missing '#' between ID and data")]
    MissingSeparator,

    #[error("invalid bus number: {0:?}")]
    InvalidBus(String),

    #[error("invalid message ID: {0:?}")]
    InvalidId(String),

    #[error("invalid payload: {0:?}")]
    InvalidData(String),

    #[error("payload of {0} bytes exceeds 8")]
    TooLong(usize),
}

/// Parse one frame line
pub fn parse_frame(line: &str) -> Result<CanFrame, FrameParseError> {
    let line = line.trim();
    let (address, data) = line.split_once('#').ok_or(FrameParseError::MissingSeparator)?;

    let (bus, id) = match address.split_once(':') {
        Some((bus, id)) => {
            let bus = bus
                .trim()
                .parse::<usize>()
                .map_err(|_| FrameParseError::InvalidBus(bus.to_string()))?;
            (bus, id)
        }
        None => (0, address),
    };

    let id = u32::from_str_radix(id.trim(), 16)
        .map_err(|_| FrameParseError::InvalidId(id.to_string()))?;

    let bytes = parse_payload(data.trim())?;
    Ok(CanFrame {
        bus,
        message: CanMessage::from_bytes(id, &bytes),
    })
}

fn parse_payload(data: &str) -> Result<Vec<u8>, FrameParseError> {
    if data.len() % 2 != 0 || !data.is_ascii() {
        return Err(FrameParseError::InvalidData(data.to_string()));
    }
    if data.len() / 2 > MAX_DATA_BYTES {
        return Err(FrameParseError::TooLong(data.len() / 2));
    }

    (0..data.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&data[i..i + 2], 16)
                .map_err(|_| FrameParseError::InvalidData(data.to_string()))
        })
        .collect()
}
