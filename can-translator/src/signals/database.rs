//! Signal, bus and command tables
//!
//! Configuration (bit layout, scaling, states) lives in [`Signal`] and never
//! changes once loaded. The per-signal debounce state the decoder mutates
//! lives in a parallel [`SignalRuntime`] slice indexed the same way.

use crate::bitfield::PAYLOAD_BITS;
use crate::queue::Queue;
use crate::signal_decoder::DecodeHandler;
use crate::signal_encoder::WriterKind;
use crate::types::{CanMessage, Result, TranslatorError, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Capacity of each bus's outbound message queue
pub const SEND_QUEUE_SIZE: usize = 32;

pub type SendQueue = Queue<CanMessage, SEND_QUEUE_SIZE>;

/// An enumerated raw value <-> name mapping owned by one signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    /// Raw value in the frame
    pub value: i64,
    /// Symbolic name sent to the host
    pub name: String,
}

impl SignalState {
    pub fn new(value: i64, name: impl Into<String>) -> Self {
        Self {
            value,
            name: name.into(),
        }
    }
}

/// One decodable/encodable field of a CAN frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Index of the owning bus in the table
    #[serde(default)]
    pub bus: usize,
    /// ID of the message carrying this signal
    pub message_id: u32,
    /// Generic name sent to the host
    pub name: String,
    /// First bit of the field, MSB-first numbering
    pub bit_position: u16,
    /// Width of the field in bits
    pub bit_size: u16,
    /// Scale factor to convert raw value to physical value
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Offset to add after scaling
    #[serde(default)]
    pub offset: f64,
    /// Minimum physical value (informational)
    #[serde(default)]
    pub min_value: f64,
    /// Maximum physical value (informational)
    #[serde(default)]
    pub max_value: f64,
    /// Emit at most once every `send_frequency` decoded frames
    #[serde(default = "default_send_frequency")]
    pub send_frequency: u32,
    /// Emit even if the value did not change since the last decode
    #[serde(default = "default_true")]
    pub send_same: bool,
    /// Emit a changed value immediately, ignoring `send_frequency`
    #[serde(default)]
    pub force_send_changed: bool,
    /// Enumerated states, first match wins
    #[serde(default)]
    pub states: Vec<SignalState>,
    /// Whether the host may write this signal
    #[serde(default)]
    pub writable: bool,
    /// How decoded values are turned into host values
    #[serde(default)]
    pub decoder: DecodeHandler,
    /// How host values are turned into raw bits (None = pick from states)
    #[serde(default)]
    pub write_handler: Option<WriterKind>,
}

fn default_factor() -> f64 {
    1.0
}

fn default_send_frequency() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Signal {
    /// Create a signal with unit scaling that is sent on every frame
    pub fn new(name: impl Into<String>, message_id: u32, bit_position: u16, bit_size: u16) -> Self {
        Self {
            bus: 0,
            message_id,
            name: name.into(),
            bit_position,
            bit_size,
            factor: default_factor(),
            offset: 0.0,
            min_value: 0.0,
            max_value: 0.0,
            send_frequency: default_send_frequency(),
            send_same: true,
            force_send_changed: false,
            states: Vec::new(),
            writable: false,
            decoder: DecodeHandler::default(),
            write_handler: None,
        }
    }

    /// Builder method: set the owning bus
    pub fn on_bus(mut self, bus: usize) -> Self {
        self.bus = bus;
        self
    }

    /// Builder method: set factor and offset
    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    /// Builder method: set the informational value range
    pub fn with_range(mut self, min_value: f64, max_value: f64) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    /// Builder method: set the send frequency divider
    pub fn with_send_frequency(mut self, send_frequency: u32) -> Self {
        self.send_frequency = send_frequency;
        self
    }

    /// Builder method: enable or disable sending unchanged values
    pub fn with_send_same(mut self, send_same: bool) -> Self {
        self.send_same = send_same;
        self
    }

    /// Builder method: send changed values regardless of frequency
    pub fn with_force_send_changed(mut self, force: bool) -> Self {
        self.force_send_changed = force;
        self
    }

    /// Builder method: set the enumerated states
    pub fn with_states(mut self, states: Vec<SignalState>) -> Self {
        self.states = states;
        self
    }

    /// Builder method: allow or deny host writes
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Builder method: set the decode handler
    pub fn with_decoder(mut self, decoder: DecodeHandler) -> Self {
        self.decoder = decoder;
        self
    }

    /// Builder method: set an explicit writer
    pub fn with_writer(mut self, writer: WriterKind) -> Self {
        self.write_handler = Some(writer);
        self
    }

    /// Check the bit layout and rate settings against a table with `bus_count` buses
    pub fn validate(&self, bus_count: usize) -> Result<()> {
        let bit_size = usize::from(self.bit_size);
        let bit_position = usize::from(self.bit_position);

        if !(1..=PAYLOAD_BITS).contains(&bit_size) {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' has a bit size of {}, expected 1 to {}",
                self.name, bit_size, PAYLOAD_BITS
            )));
        }
        if bit_position + bit_size > PAYLOAD_BITS {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' ends at bit {}, past the {}-bit payload",
                self.name,
                bit_position + bit_size,
                PAYLOAD_BITS
            )));
        }
        if self.send_frequency == 0 {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' has a send frequency of 0",
                self.name
            )));
        }
        if self.factor == 0.0 {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' has a scale factor of 0",
                self.name
            )));
        }
        if self.bus >= bus_count {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' refers to bus {} but only {} bus(es) are defined",
                self.name, self.bus, bus_count
            )));
        }
        Ok(())
    }
}

/// Mutable per-signal decode state, parallel to the signal table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalRuntime {
    /// Whether the signal has been decoded at least once
    pub received: bool,
    /// Value from the most recent decode, before any handler ran
    pub last_value: Option<f64>,
    /// Frames seen since the last eligible cycle
    pub send_clock: u32,
}

/// A logical CAN channel and its outbound queue
#[derive(Debug, Default)]
pub struct CanBus {
    /// Bus speed in bits per second
    pub speed: u32,
    /// Controller address
    pub address: u32,
    /// Messages waiting for the bus driver
    pub send_queue: SendQueue,
}

impl CanBus {
    pub fn new(speed: u32, address: u32) -> Self {
        Self {
            speed,
            address,
            send_queue: SendQueue::new(),
        }
    }
}

/// Bus settings as they appear in a signal table file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    pub speed: u32,
    #[serde(default)]
    pub address: u32,
}

impl From<BusConfig> for CanBus {
    fn from(config: BusConfig) -> Self {
        CanBus::new(config.speed, config.address)
    }
}

/// Handler bound to a command: gets the command name, value, optional event
/// and the signal table; returns whether the command was handled
pub type CommandHandler = fn(&str, &Value, Option<&Value>, &[Signal]) -> bool;

/// A named application-level operation that is not a plain signal write
#[derive(Clone, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(skip)]
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }

    /// Builder method: bind a handler
    pub fn with_handler(mut self, handler: CommandHandler) -> Self {
        self.handler = Some(handler);
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("bound", &self.handler.is_some())
            .finish()
    }
}

/// A complete table as loaded from a TOML file
///
/// ```toml
/// [[buses]]
/// speed = 500000
///
/// [[signals]]
/// message_id = 0x100
/// name = "transmission_gear_position"
/// bit_position = 1
/// bit_size = 3
/// decoder = "state"
/// states = [{ value = 1, name = "reverse" }, { value = 5, name = "neutral" }]
///
/// [[commands]]
/// name = "turn_signal_status"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalTable {
    #[serde(default)]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl SignalTable {
    /// Parse and validate a table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: SignalTable = toml::from_str(content)
            .map_err(|e| TranslatorError::TableParseError(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading signal table: {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&content).map_err(|e| match e {
            TranslatorError::TableParseError(msg) => {
                TranslatorError::TableParseError(format!("{:?}: {}", path, msg))
            }
            other => other,
        })?;

        log::info!(
            "Loaded {} signals and {} commands from {:?}",
            table.signals.len(),
            table.commands.len(),
            path
        );
        Ok(table)
    }

    /// Validate every signal against the table's buses
    pub fn validate(&self) -> Result<()> {
        for signal in &self.signals {
            signal.validate(self.buses.len())?;
        }
        Ok(())
    }

    /// Get table statistics
    pub fn stats(&self) -> TableStats {
        TableStats::collect(self.buses.len(), &self.signals, self.commands.len())
    }
}

/// Table statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Number of buses
    pub num_buses: usize,
    /// Total number of signals
    pub num_signals: usize,
    /// Signals the host may write
    pub num_writable: usize,
    /// Signals with enumerated states
    pub num_stateful: usize,
    /// Number of commands
    pub num_commands: usize,
}

impl TableStats {
    pub fn collect(num_buses: usize, signals: &[Signal], num_commands: usize) -> Self {
        Self {
            num_buses,
            num_signals: signals.len(),
            num_writable: signals.iter().filter(|s| s.writable).count(),
            num_stateful: signals.iter().filter(|s| !s.states.is_empty()).count(),
            num_commands,
        }
    }
}
