// Loads the demo signal table and replays a short drive through it

use can_translator::{
    CanFrame, CollectingEmitter, SendOutcome, TranslatedMessage, Translator, TranslatorConfig,
    Value,
};
use std::path::PathBuf;

fn demo_table() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("examples/signals.toml")
}

fn demo_translator() -> Translator {
    let mut translator = Translator::new(TranslatorConfig::new());
    translator.load_table(&demo_table()).unwrap();
    translator
}

#[test]
fn test_load_demo_table() {
    let stats = demo_translator().stats();
    assert_eq!(stats.num_buses, 1);
    assert_eq!(stats.num_signals, 5);
    assert_eq!(stats.num_writable, 1);
    assert_eq!(stats.num_stateful, 1);
    assert_eq!(stats.num_commands, 1);
}

#[test]
fn test_replay_frames() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut translator = demo_translator();
    let mut emitter = CollectingEmitter::new();
    let frames = [
        CanFrame::new(0, 0x100, 0x2710_A000_0000_0000),
        CanFrame::new(0, 0x100, 0x2710_A000_0000_0000),
        CanFrame::new(0, 0x200, 0x6000_0000_0000_0000),
        CanFrame::new(0, 0x300, 0x0800_0000_0000_0000),
        CanFrame::new(0, 0x100, 0x2774_F000_0000_0000),
        CanFrame::new(0, 0x200, 0x5000_0000_0000_0000),
    ];
    let counts: Vec<usize> = frames
        .iter()
        .map(|frame| translator.receive_frame(frame, &mut emitter))
        .collect();

    // The unchanged speed is held back on the second frame; ignition is never sent
    assert_eq!(counts, vec![2, 1, 1, 1, 2, 1]);

    let names: Vec<&str> = emitter.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "vehicle_speed",
            "torque_at_transmission",
            "torque_at_transmission",
            "transmission_gear_position",
            "headlamp_status",
            "vehicle_speed",
            "torque_at_transmission",
            "transmission_gear_position",
        ]
    );

    let speed = emitter.messages[0].value.as_number().unwrap();
    assert!((speed - 100.0).abs() < 1e-9);
    assert_eq!(emitter.messages[1].value, Value::Number(-21992.0));
    assert_eq!(
        emitter.messages[3],
        TranslatedMessage::new("transmission_gear_position", "neutral")
    );
    assert_eq!(emitter.messages[4].value, Value::Boolean(true));
    assert_eq!(emitter.messages[6].value, Value::Number(-17988.0));
    assert_eq!(emitter.messages[7].value, Value::from("reverse"));
}

#[test]
fn test_only_writable_signals_are_queued() {
    let mut translator = demo_translator();

    assert_eq!(
        translator
            .send_signal("headlamp_status", &Value::Boolean(true))
            .unwrap(),
        SendOutcome::Queued
    );
    assert_eq!(
        translator
            .send_signal("vehicle_speed", &Value::Number(88.0))
            .unwrap(),
        SendOutcome::Suppressed
    );
    assert_eq!(translator.bus(0).unwrap().send_queue.len(), 1);
}
