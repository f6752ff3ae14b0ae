//! Signal encoding pipeline (host -> bus)
//!
//! A host value is converted to raw bits by the signal's writer, embedded in
//! a payload, and queued on the signal's bus. The queue is drained separately
//! by [`process_write_queue`], which hands each message to a [`BusDriver`].

use crate::bitfield;
use crate::signals::lookup::lookup_signal_state;
use crate::signals::{CanBus, Signal};
use crate::types::{CanMessage, Result, Value};
use serde::{Deserialize, Serialize};

/// Built-in writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterKind {
    /// `true` -> 1, anything else -> 0
    Boolean,
    /// Inverse of the signal's scaling
    Number,
    /// Raw value of the state with the given name
    State,
}

impl WriterKind {
    /// The signal's configured writer, or one picked from whether it has states
    pub fn for_signal(signal: &Signal) -> Self {
        signal.write_handler.unwrap_or(if signal.states.is_empty() {
            WriterKind::Number
        } else {
            WriterKind::State
        })
    }

    /// Convert `value` and embed it into `data`, clearing `send` if it must not go out
    pub fn write(self, signal: &Signal, value: &Value, send: &mut bool, data: u64) -> u64 {
        match self {
            WriterKind::Boolean => boolean_writer(signal, value, send, data),
            WriterKind::Number => number_writer(signal, value, send, data),
            WriterKind::State => state_writer(signal, value, send, data),
        }
    }
}

/// Result of asking for a signal to be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message is on the bus's send queue
    Queued,
    /// The writer or the permission check decided not to send
    Suppressed,
    /// The message could not be queued (queue full or no such bus)
    Dropped,
}

impl SendOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, SendOutcome::Queued)
    }
}

/// Physical transmitter for a bus
pub trait BusDriver {
    /// Put one message on the wire
    fn send_message(&mut self, bus: &CanBus, message: &CanMessage) -> Result<()>;
}

/// Clear `send` if the host may not write this signal
pub fn check_write_permission(signal: &Signal, send: &mut bool) {
    if !signal.writable {
        log::debug!("Signal '{}' is not writable", signal.name);
        *send = false;
    }
}

/// Embed an already computed raw value into the signal's field
pub fn encode_raw(signal: &Signal, raw: u64, mut data: u64) -> u64 {
    let bit_size = usize::from(signal.bit_size);
    if !bitfield::fits(raw, bit_size) {
        log::warn!(
            "Raw value {} of '{}' does not fit in {} bits, truncating",
            raw as i64,
            signal.name,
            bit_size
        );
    }
    bitfield::set_field(&mut data, raw, usize::from(signal.bit_position), bit_size);
    data
}

/// Invert the signal's scaling and embed the result into `data`
///
/// Positive raw values are rounded half up; zero and negative ones are
/// truncated toward zero.
pub fn encode_signal(signal: &Signal, value: f64, data: u64) -> u64 {
    let mut raw = (value - signal.offset) / signal.factor;
    if raw > 0.0 {
        raw += 0.5;
    }
    encode_raw(signal, raw as i64 as u64, data)
}

pub fn boolean_writer(signal: &Signal, value: &Value, send: &mut bool, data: u64) -> u64 {
    check_write_permission(signal, send);
    let raw = match value {
        Value::Boolean(true) => 1.0,
        _ => 0.0,
    };
    encode_signal(signal, raw, data)
}

pub fn number_writer(signal: &Signal, value: &Value, send: &mut bool, data: u64) -> u64 {
    check_write_permission(signal, send);
    match value.as_number() {
        Some(number) => encode_signal(signal, number, data),
        None => {
            log::warn!("Expected a number for '{}', got {}", signal.name, value);
            *send = false;
            data
        }
    }
}

/// Look the state up by name and embed its raw value, bypassing scaling
///
/// An unknown name leaves `data` untouched and clears `send`.
pub fn state_writer(signal: &Signal, value: &Value, send: &mut bool, data: u64) -> u64 {
    let state = value
        .as_str()
        .and_then(|name| lookup_signal_state(name, signal));

    match state {
        Some(state) => {
            check_write_permission(signal, send);
            encode_raw(signal, state.value as u64, data)
        }
        None => {
            log::warn!("No state of '{}' named {}", signal.name, value);
            *send = false;
            data
        }
    }
}

/// Queue `data` as a message for the signal if `send` is still set
pub fn enqueue_message(signal: &Signal, data: u64, send: bool, buses: &mut [CanBus]) -> SendOutcome {
    if !send {
        log::debug!("Not sending requested message 0x{:X}", signal.message_id);
        return SendOutcome::Suppressed;
    }

    let Some(bus) = buses.get_mut(signal.bus) else {
        log::warn!("Signal '{}' refers to missing bus {}", signal.name, signal.bus);
        return SendOutcome::Dropped;
    };

    match bus.send_queue.push(CanMessage::new(signal.message_id, data)) {
        Ok(()) => SendOutcome::Queued,
        Err(message) => {
            log::warn!("Send queue of bus {} is full, dropping {}", signal.bus, message);
            SendOutcome::Dropped
        }
    }
}

/// Encode `value` with the signal's writer into an empty payload and queue it
pub fn send_signal(signal: &Signal, value: &Value, buses: &mut [CanBus]) -> SendOutcome {
    send_signal_with(signal, value, WriterKind::for_signal(signal), 0, buses)
}

/// Encode `value` with an explicit writer into `data` and queue it
pub fn send_signal_with(
    signal: &Signal,
    value: &Value,
    writer: WriterKind,
    data: u64,
    buses: &mut [CanBus],
) -> SendOutcome {
    let mut send = true;
    let data = writer.write(signal, value, &mut send, data);
    enqueue_message(signal, data, send, buses)
}

/// Drain a bus's send queue into the driver, oldest first
///
/// Failed transmissions are logged and not retried. Returns the number of
/// messages the driver accepted.
pub fn process_write_queue<D>(bus: &mut CanBus, driver: &mut D) -> usize
where
    D: BusDriver + ?Sized,
{
    let mut sent = 0;
    while let Some(message) = bus.send_queue.pop() {
        log::debug!("Sending CAN message {}", message);
        match driver.send_message(bus, &message) {
            Ok(()) => sent += 1,
            Err(e) => log::warn!("Unable to send CAN message: {}", e),
        }
    }
    sent
}
