//! Signal tables, lookups and the DBC importer
//!
//! This module contains the signal/bus/command definitions, the lookups the
//! pipelines use to find them, and a parser for Vector DBC files.

pub mod database;
pub mod dbc;
pub mod lookup;

// Re-export key types for convenience
pub use database::{
    BusConfig, CanBus, Command, CommandHandler, SendQueue, Signal, SignalRuntime,
    SignalState, SignalTable, TableStats, SEND_QUEUE_SIZE,
};
pub use lookup::{
    lookup_command, lookup_signal, lookup_signal_index, lookup_signal_state,
    lookup_signal_state_by_value, lookup_signal_writable,
};
