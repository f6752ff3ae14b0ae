// Signal, state and command lookups over a small powertrain table

use can_translator::signals::{
    lookup_command, lookup_signal, lookup_signal_state, lookup_signal_state_by_value,
    lookup_signal_writable,
};
use can_translator::{Command, Signal, SignalState};

fn signals() -> Vec<Signal> {
    vec![
        Signal::new("torque_at_transmission", 0, 2, 4).with_scaling(1001.0, -30000.0),
        Signal::new("transmission_gear_position", 1, 1, 3).with_states(vec![
            SignalState::new(1, "first"),
            SignalState::new(2, "second"),
            SignalState::new(3, "third"),
            SignalState::new(4, "fourth"),
            SignalState::new(5, "reverse"),
            SignalState::new(6, "neutral"),
        ]),
        Signal::new("brake_pedal_status", 2, 0, 1),
        Signal::new("command", 3, 0, 8),
        Signal::new("command", 3, 8, 8).with_writable(true),
    ]
}

fn commands() -> Vec<Command> {
    vec![Command::new("turn_signal_status")]
}

#[test]
fn test_lookup_signal() {
    let signals = signals();
    let signal = lookup_signal("brake_pedal_status", &signals).unwrap();
    assert_eq!(signal.message_id, 2);
    assert_eq!(signal.bit_size, 1);
}

#[test]
fn test_missing_signal() {
    let signals = signals();
    assert!(lookup_signal("does_not_exist", &signals).is_none());
    assert!(lookup_signal_writable("does_not_exist", &signals, true).is_none());
}

#[test]
fn test_lookup_writable_signal() {
    let signals = signals();

    let read_only = lookup_signal_writable("command", &signals, false).unwrap();
    assert!(!read_only.writable);
    assert_eq!(read_only.bit_position, 0);

    let writable = lookup_signal_writable("command", &signals, true).unwrap();
    assert!(writable.writable);
    assert_eq!(writable.bit_position, 8);

    // Plain lookup takes the first entry
    assert!(!lookup_signal("command", &signals).unwrap().writable);
}

#[test]
fn test_lookup_state() {
    let signals = signals();
    let gear = lookup_signal("transmission_gear_position", &signals).unwrap();

    assert_eq!(lookup_signal_state("reverse", gear).unwrap().value, 5);
    assert_eq!(lookup_signal_state_by_value(6, gear).unwrap().name, "neutral");
    assert!(lookup_signal_state("park", gear).is_none());
    assert!(lookup_signal_state_by_value(0, gear).is_none());
}

#[test]
fn test_lookup_command() {
    let commands = commands();
    assert!(lookup_command("turn_signal_status", &commands).is_some());
    assert!(lookup_command("does_not_exist", &commands).is_none());
}
