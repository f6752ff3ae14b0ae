//! Signal decoding pipeline (bus -> host)
//!
//! For every signal carried by a received frame:
//! 1. extract the raw field and apply `raw * factor + offset`
//! 2. decide whether this cycle may emit (send frequency divider and
//!    change detection)
//! 3. run the signal's handler to produce a host value
//! 4. emit the value if the send decision survived
//! 5. remember the decoded value for the next change check
//!
//! The runtime slice passed alongside the signal table must be indexed the
//! same way as the table.

use crate::bitfield;
use crate::config::TranslatorConfig;
use crate::signals::lookup::{lookup_signal_index, lookup_signal_state_by_value};
use crate::signals::{Signal, SignalRuntime};
use crate::types::{CanFrame, MessageEmitter, TranslatedMessage, Value};
use serde::{Deserialize, Serialize};

/// Read-only view of the whole signal table, handed to handlers so they can
/// compute values from sibling signals
#[derive(Debug, Clone, Copy)]
pub struct SignalSet<'a> {
    pub signals: &'a [Signal],
    pub runtime: &'a [SignalRuntime],
}

impl<'a> SignalSet<'a> {
    pub fn new(signals: &'a [Signal], runtime: &'a [SignalRuntime]) -> Self {
        Self { signals, runtime }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Signal named `name` with its runtime state
    pub fn get(&self, name: &str) -> Option<(&'a Signal, &'a SignalRuntime)> {
        let index = lookup_signal_index(name, self.signals)?;
        Some((&self.signals[index], self.runtime.get(index)?))
    }

    /// Most recently decoded value of the signal named `name`
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|(_, runtime)| runtime.last_value)
    }
}

/// Turns a decoded value into a host value
///
/// Clearing `send` suppresses emission for this cycle. Returning `None` means
/// the handler could not produce a value; nothing is emitted either way.
pub trait SignalHandler {
    fn handle(
        &self,
        signal: &Signal,
        signals: &SignalSet<'_>,
        value: f64,
        send: &mut bool,
    ) -> Option<Value>;
}

/// Built-in decode handlers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeHandler {
    /// Send the scaled value as a number
    #[default]
    PassThrough,
    /// Send `value != 0` as a boolean
    Boolean,
    /// Never send; the signal only feeds other computed signals
    Ignore,
    /// Send the name of the state whose raw value matches
    State,
}

impl SignalHandler for DecodeHandler {
    fn handle(
        &self,
        signal: &Signal,
        _signals: &SignalSet<'_>,
        value: f64,
        send: &mut bool,
    ) -> Option<Value> {
        match self {
            DecodeHandler::PassThrough => Some(Value::Number(value)),
            DecodeHandler::Boolean => Some(Value::Boolean(value != 0.0)),
            DecodeHandler::Ignore => {
                *send = false;
                Some(Value::Number(value))
            }
            DecodeHandler::State => {
                match lookup_signal_state_by_value(value as i64, signal) {
                    Some(state) => Some(Value::String(state.name.clone())),
                    None => {
                        log::debug!("No state of '{}' found for value {}", signal.name, value);
                        *send = false;
                        None
                    }
                }
            }
        }
    }
}

/// Extract a signal's raw field and scale it
pub fn decode_signal(signal: &Signal, data: u64) -> f64 {
    let raw = bitfield::get_field(
        data,
        usize::from(signal.bit_position),
        usize::from(signal.bit_size),
    );
    raw as f64 * signal.factor + signal.offset
}

/// Decode a signal and apply the send frequency divider and change detection
///
/// Clears `send` when this cycle must not emit. `runtime.last_value` is left
/// alone; see [`post_translate`].
pub fn pre_translate(
    signal: &Signal,
    runtime: &mut SignalRuntime,
    data: u64,
    send: &mut bool,
) -> f64 {
    let value = decode_signal(signal, data);
    let changed = runtime.last_value != Some(value);

    let on_boundary = runtime.send_clock + 1 >= signal.send_frequency;
    if !runtime.received || on_boundary || (signal.force_send_changed && changed) {
        if !runtime.received || signal.send_same || changed {
            runtime.received = true;
        } else {
            *send = false;
        }
        runtime.send_clock = 0;
    } else {
        *send = false;
        runtime.send_clock += 1;
    }
    value
}

/// Record the decoded value for the next change check, sent or not
pub fn post_translate(runtime: &mut SignalRuntime, value: f64) {
    runtime.last_value = Some(value);
}

/// Run the full pipeline for the signal at `index` using its configured handler
///
/// Returns whether a message was emitted.
pub fn translate_signal<E>(
    emitter: &mut E,
    index: usize,
    data: u64,
    signals: &[Signal],
    runtime: &mut [SignalRuntime],
) -> bool
where
    E: MessageEmitter + ?Sized,
{
    let Some(signal) = signals.get(index) else {
        log::warn!("No signal at index {}", index);
        return false;
    };
    translate_signal_with(emitter, index, data, &signal.decoder, signals, runtime)
}

/// Run the full pipeline for the signal at `index` with an explicit handler
///
/// Returns whether a message was emitted.
pub fn translate_signal_with<E, H>(
    emitter: &mut E,
    index: usize,
    data: u64,
    handler: &H,
    signals: &[Signal],
    runtime: &mut [SignalRuntime],
) -> bool
where
    E: MessageEmitter + ?Sized,
    H: SignalHandler + ?Sized,
{
    let (Some(signal), true) = (signals.get(index), index < runtime.len()) else {
        log::warn!("No signal at index {}", index);
        return false;
    };

    let mut send = true;
    let value = pre_translate(signal, &mut runtime[index], data, &mut send);
    let output = handler.handle(signal, &SignalSet::new(signals, runtime), value, &mut send);

    let emitted = match output {
        Some(output) if send => {
            emitter.emit(TranslatedMessage::new(signal.name.clone(), output));
            true
        }
        Some(_) => false,
        None => {
            log::debug!("No valid value returned from handler for '{}'", signal.name);
            false
        }
    };

    post_translate(&mut runtime[index], value);
    emitted
}

/// Translate every signal carried by `frame`, in table order
///
/// Returns the number of messages emitted, not counting a raw passthrough.
pub fn translate_frame<E>(
    emitter: &mut E,
    frame: &CanFrame,
    config: &TranslatorConfig,
    signals: &[Signal],
    runtime: &mut [SignalRuntime],
) -> usize
where
    E: MessageEmitter + ?Sized,
{
    let id = frame.message.id;
    if !config.should_process_frame(frame.bus, id) {
        log::trace!("Filtered frame 0x{:X} on bus {}", id, frame.bus);
        return 0;
    }

    if config.emit_raw_frames {
        emitter.emit_raw(&frame.message);
    }

    let mut emitted = 0;
    for (index, signal) in signals.iter().enumerate() {
        if signal.bus != frame.bus || signal.message_id != id {
            continue;
        }
        if translate_signal(emitter, index, frame.message.data, signals, runtime) {
            emitted += 1;
        }
    }
    emitted
}
