//! Main translator API
//!
//! The [`Translator`] owns the signal table, the parallel runtime state, the
//! buses with their send queues, and the command table. It is the entry point
//! for both directions: frames from the bus become host messages, and host
//! write requests become queued CAN messages.

use crate::config::TranslatorConfig;
use crate::signal_decoder::translate_frame;
use crate::signal_encoder::{process_write_queue, send_signal, BusDriver, SendOutcome};
use crate::signals::lookup::{lookup_command, lookup_signal, lookup_signal_writable};
use crate::signals::{
    CanBus, Command, CommandHandler, Signal, SignalRuntime, SignalTable, TableStats,
};
use crate::types::{CanFrame, MessageEmitter, Result, TranslatorError, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A write request from the host: a signal or command name plus a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub event: Option<Value>,
}

impl WriteRequest {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            event: None,
        }
    }
}

/// What became of a [`WriteRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The name matched a signal
    Signal(SendOutcome),
    /// The name matched a command; true if its handler accepted it
    Command(bool),
}

/// The translator - entry point for all translation operations
pub struct Translator {
    config: TranslatorConfig,
    signals: Vec<Signal>,
    /// Decode state, one entry per signal
    runtime: Vec<SignalRuntime>,
    buses: Vec<CanBus>,
    commands: Vec<Command>,
}

impl Translator {
    /// Create a translator with no buses, signals or commands
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            signals: Vec::new(),
            runtime: Vec::new(),
            buses: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Create a translator from a loaded signal table
    pub fn from_table(table: SignalTable, config: TranslatorConfig) -> Result<Self> {
        let mut translator = Self::new(config);
        translator.add_table(table)?;
        Ok(translator)
    }

    /// Load a TOML signal table and add its contents
    ///
    /// # Example
    /// ```no_run
    /// use can_translator::{Translator, TranslatorConfig};
    /// use std::path::Path;
    ///
    /// let mut translator = Translator::new(TranslatorConfig::new());
    /// translator.load_table(Path::new("signals.toml")).unwrap();
    /// ```
    pub fn load_table(&mut self, path: &Path) -> Result<()> {
        let table = SignalTable::load(path)?;
        self.add_table(table)
    }

    /// Add a table's buses, signals and commands
    ///
    /// Bus indices in the table are relative to the table, so they are
    /// shifted past any buses already present.
    pub fn add_table(&mut self, table: SignalTable) -> Result<()> {
        table.validate()?;

        let bus_offset = self.buses.len();
        self.buses.extend(table.buses.into_iter().map(CanBus::from));
        for mut signal in table.signals {
            signal.bus += bus_offset;
            self.push_signal(signal);
        }
        self.commands.extend(table.commands);
        Ok(())
    }

    /// Import the big-endian signals of a DBC file onto an existing bus
    ///
    /// Returns the number of signals added.
    pub fn add_dbc(&mut self, path: &Path, bus: usize) -> Result<usize> {
        if bus >= self.buses.len() {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "DBC file {:?} assigned to bus {} but only {} bus(es) are defined",
                path,
                bus,
                self.buses.len()
            )));
        }

        let signals = crate::signals::dbc::parse_dbc_file(path, bus)?;
        let count = signals.len();
        for signal in signals {
            self.push_signal(signal);
        }
        Ok(count)
    }

    /// Add a bus and return its index
    pub fn add_bus(&mut self, bus: CanBus) -> usize {
        self.buses.push(bus);
        self.buses.len() - 1
    }

    /// Add a single signal and return its index
    pub fn add_signal(&mut self, signal: Signal) -> Result<usize> {
        signal.validate(self.buses.len())?;
        self.push_signal(signal);
        Ok(self.signals.len() - 1)
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Bind a handler to every command named `name`
    pub fn bind_command(&mut self, name: &str, handler: CommandHandler) -> Result<()> {
        let mut found = false;
        for command in self.commands.iter_mut().filter(|c| c.name == name) {
            command.handler = Some(handler);
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(TranslatorError::CommandNotFound(name.to_string()))
        }
    }

    fn push_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
        self.runtime.push(SignalRuntime::default());
    }

    /// Translate a received frame, handing results to `emitter`
    ///
    /// Returns the number of messages emitted.
    pub fn receive_frame<E>(&mut self, frame: &CanFrame, emitter: &mut E) -> usize
    where
        E: MessageEmitter + ?Sized,
    {
        translate_frame(emitter, frame, &self.config, &self.signals, &mut self.runtime)
    }

    /// Encode `value` into the signal named `name` and queue it on its bus
    ///
    /// The writable entry wins when a name is listed twice; a read-only
    /// signal is still looked up so the permission check can refuse it.
    pub fn send_signal(&mut self, name: &str, value: &Value) -> Result<SendOutcome> {
        let signal = lookup_signal_writable(name, &self.signals, true)
            .or_else(|| lookup_signal(name, &self.signals))
            .ok_or_else(|| TranslatorError::SignalNotFound(name.to_string()))?;

        Ok(send_signal(signal, value, &mut self.buses))
    }

    /// Run the handler bound to the command named `name`
    ///
    /// Returns whether the handler accepted the command; a command without a
    /// bound handler is not accepted.
    pub fn handle_command(&self, name: &str, value: &Value, event: Option<&Value>) -> Result<bool> {
        let command = lookup_command(name, &self.commands)
            .ok_or_else(|| TranslatorError::CommandNotFound(name.to_string()))?;

        match command.handler {
            Some(handler) => Ok(handler(name, value, event, &self.signals)),
            None => {
                log::warn!("Command '{}' has no handler bound", name);
                Ok(false)
            }
        }
    }

    /// Dispatch a host write request to a signal, or failing that a command
    pub fn handle_write(&mut self, request: &WriteRequest) -> Result<WriteOutcome> {
        if lookup_signal(&request.name, &self.signals).is_some() {
            return self
                .send_signal(&request.name, &request.value)
                .map(WriteOutcome::Signal);
        }
        if lookup_command(&request.name, &self.commands).is_some() {
            return self
                .handle_command(&request.name, &request.value, request.event.as_ref())
                .map(WriteOutcome::Command);
        }
        Err(TranslatorError::SignalNotFound(request.name.clone()))
    }

    /// Drain every bus's send queue into `driver`
    ///
    /// Returns the number of messages the driver accepted.
    pub fn flush<D>(&mut self, driver: &mut D) -> usize
    where
        D: BusDriver + ?Sized,
    {
        self.buses
            .iter_mut()
            .map(|bus| process_write_queue(bus, driver))
            .sum()
    }

    /// Forget every signal's decode history
    pub fn reset(&mut self) {
        self.runtime.fill(SignalRuntime::default());
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn runtime(&self) -> &[SignalRuntime] {
        &self.runtime
    }

    pub fn buses(&self) -> &[CanBus] {
        &self.buses
    }

    pub fn bus(&self, index: usize) -> Option<&CanBus> {
        self.buses.get(index)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Get statistics about the loaded tables
    pub fn stats(&self) -> TableStats {
        TableStats::collect(self.buses.len(), &self.signals, self.commands.len())
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}
