//! Signal, state and command lookups
//!
//! Linear scans over the static tables; the first match wins and a miss is
//! `None`.

use super::database::{Command, Signal, SignalState};

/// First signal named `name`
pub fn lookup_signal<'a>(name: &str, signals: &'a [Signal]) -> Option<&'a Signal> {
    signals.iter().find(|signal| signal.name == name)
}

/// Index of the first signal named `name`
pub fn lookup_signal_index(name: &str, signals: &[Signal]) -> Option<usize> {
    signals.iter().position(|signal| signal.name == name)
}

/// First signal named `name` whose writable flag equals `writable`
///
/// Tables may list the same name twice, once read-only and once writable; this
/// picks the intended entry.
pub fn lookup_signal_writable<'a>(
    name: &str,
    signals: &'a [Signal],
    writable: bool,
) -> Option<&'a Signal> {
    signals
        .iter()
        .find(|signal| signal.name == name && signal.writable == writable)
}

/// State of `signal` named `name`
pub fn lookup_signal_state<'a>(name: &str, signal: &'a Signal) -> Option<&'a SignalState> {
    signal.states.iter().find(|state| state.name == name)
}

/// State of `signal` whose raw value is `value`
pub fn lookup_signal_state_by_value(value: i64, signal: &Signal) -> Option<&SignalState> {
    signal.states.iter().find(|state| state.value == value)
}

/// First command named `name`
pub fn lookup_command<'a>(name: &str, commands: &'a [Command]) -> Option<&'a Command> {
    commands.iter().find(|command| command.name == name)
}
