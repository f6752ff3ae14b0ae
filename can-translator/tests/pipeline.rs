// End-to-end decode and encode behaviour through the public API

use can_translator::bitfield::get_field;
use can_translator::signal_decoder::{translate_signal, translate_signal_with};
use can_translator::signal_encoder::encode_signal;
use can_translator::{
    BusDriver, CanBus, CanFrame, CanMessage, CollectingEmitter, DecodeHandler, Result,
    SendOutcome, Signal, SignalHandler, SignalRuntime, SignalSet, TranslatedMessage, Translator,
    TranslatorConfig, Value, WriteOutcome, WriteRequest, WriterKind,
};

const SPEED_ID: u32 = 0x100;

fn translator_with(signal: Signal) -> Translator {
    let mut translator = Translator::new(TranslatorConfig::new());
    translator.add_bus(CanBus::new(500_000, 0));
    translator.add_signal(signal).unwrap();
    translator
}

fn frame(value: u8) -> CanFrame {
    CanFrame::new(0, SPEED_ID, u64::from(value) << 56)
}

/// Feed one frame per value and return the 1-based frames that emitted
fn emitting_frames(translator: &mut Translator, values: &[u8]) -> Vec<usize> {
    let mut emitter = CollectingEmitter::new();
    let mut frames = Vec::new();
    for (i, value) in values.iter().enumerate() {
        if translator.receive_frame(&frame(*value), &mut emitter) > 0 {
            frames.push(i + 1);
        }
    }
    frames
}

#[test]
fn test_first_frame_always_emits() {
    for send_same in [true, false] {
        let mut translator = translator_with(
            Signal::new("vehicle_speed", SPEED_ID, 0, 8).with_send_same(send_same),
        );
        assert_eq!(emitting_frames(&mut translator, &[42]), vec![1]);
    }
}

#[test]
fn test_send_same_every_frame() {
    let mut translator = translator_with(Signal::new("vehicle_speed", SPEED_ID, 0, 8));
    assert_eq!(emitting_frames(&mut translator, &[7, 7, 7]), vec![1, 2, 3]);
}

#[test]
fn test_debounce_unchanged_value() {
    let mut translator = translator_with(
        Signal::new("vehicle_speed", SPEED_ID, 0, 8)
            .with_send_frequency(3)
            .with_send_same(false),
    );
    // After the first emission an unchanged value never goes out again
    assert_eq!(emitting_frames(&mut translator, &[9; 9]), vec![1]);
}

#[test]
fn test_debounce_changing_value() {
    let mut translator = translator_with(
        Signal::new("vehicle_speed", SPEED_ID, 0, 8)
            .with_send_frequency(3)
            .with_send_same(false),
    );
    // One emission per window of three frames, starting with the first
    assert_eq!(
        emitting_frames(&mut translator, &[1, 2, 3, 4, 5, 6, 7, 8, 9]),
        vec![1, 4, 7]
    );
}

#[test]
fn test_force_send_changed_bypasses_divider() {
    let mut translator = translator_with(
        Signal::new("vehicle_speed", SPEED_ID, 0, 8)
            .with_send_frequency(10)
            .with_force_send_changed(true),
    );
    assert_eq!(emitting_frames(&mut translator, &[1, 1, 2, 2, 3]), vec![1, 3, 5]);
}

#[test]
fn test_filtered_frames_are_ignored() {
    let mut translator = Translator::new(TranslatorConfig::new().with_bus_filter(vec![1]));
    translator.add_bus(CanBus::new(500_000, 0));
    translator
        .add_signal(Signal::new("vehicle_speed", SPEED_ID, 0, 8))
        .unwrap();

    let mut emitter = CollectingEmitter::new();
    assert_eq!(translator.receive_frame(&frame(1), &mut emitter), 0);
    assert!(!translator.runtime()[0].received);
}

#[test]
fn test_raw_passthrough() {
    let mut translator = Translator::new(TranslatorConfig::new().with_raw_frames(true));
    translator.add_bus(CanBus::new(500_000, 0));

    let mut emitter = CollectingEmitter::new();
    let frame = CanFrame::new(0, 0x7E0, 0x0102_0304_0506_0708);
    assert_eq!(translator.receive_frame(&frame, &mut emitter), 0);
    assert_eq!(emitter.raw, vec![frame.message]);
    assert!(emitter.messages.is_empty());
}

#[test]
fn test_encode_round_trip_extremes() {
    let torque = Signal::new("torque_at_transmission", 0, 2, 4).with_scaling(1001.0, -30000.0);

    let data = encode_signal(&torque, -30000.0, 0);
    assert_eq!(get_field(data, 2, 4), 0);

    let data = encode_signal(&torque, -30000.0 + 15.0 * 1001.0, 0);
    assert_eq!(get_field(data, 2, 4), 15);
}

/// Reports the mean of the left wheel's last value and this signal's value
struct WheelAverage;

impl SignalHandler for WheelAverage {
    fn handle(
        &self,
        _signal: &Signal,
        signals: &SignalSet<'_>,
        value: f64,
        send: &mut bool,
    ) -> Option<Value> {
        match signals.last_value("wheel_speed_left") {
            Some(left) => Some(Value::Number((left + value) / 2.0)),
            None => {
                *send = false;
                None
            }
        }
    }
}

#[test]
fn test_cross_signal_handler() {
    let signals = vec![
        Signal::new("wheel_speed_left", 0x10, 0, 8),
        Signal::new("wheel_speed_right", 0x10, 8, 8).with_decoder(DecodeHandler::Ignore),
    ];
    let mut runtime = vec![SignalRuntime::default(); signals.len()];
    let mut emitter = CollectingEmitter::new();
    let data = 0x0A14_0000_0000_0000;

    // Nothing to average before the left wheel has been decoded
    assert!(!translate_signal_with(&mut emitter, 1, data, &WheelAverage, &signals, &mut runtime));

    assert!(translate_signal(&mut emitter, 0, data, &signals, &mut runtime));
    assert!(translate_signal_with(&mut emitter, 1, data, &WheelAverage, &signals, &mut runtime));

    assert_eq!(
        emitter.messages,
        vec![
            TranslatedMessage::new("wheel_speed_left", 10.0),
            TranslatedMessage::new("wheel_speed_right", 15.0),
        ]
    );
}

#[derive(Default)]
struct RecordingDriver {
    sent: Vec<CanMessage>,
}

impl BusDriver for RecordingDriver {
    fn send_message(&mut self, _bus: &CanBus, message: &CanMessage) -> Result<()> {
        self.sent.push(*message);
        Ok(())
    }
}

#[test]
fn test_write_requests_reach_the_driver() {
    let mut translator = translator_with(
        Signal::new("headlamp_status", 0x300, 4, 1)
            .with_writable(true)
            .with_writer(WriterKind::Boolean),
    );
    translator
        .add_signal(Signal::new("odometer", 0x301, 0, 16))
        .unwrap();

    let on = WriteRequest::new("headlamp_status", true);
    assert_eq!(
        translator.handle_write(&on).unwrap(),
        WriteOutcome::Signal(SendOutcome::Queued)
    );

    // Read-only signals are encoded but never queued
    let odometer = WriteRequest::new("odometer", 12.0);
    assert_eq!(
        translator.handle_write(&odometer).unwrap(),
        WriteOutcome::Signal(SendOutcome::Suppressed)
    );

    assert!(translator
        .handle_write(&WriteRequest::new("does_not_exist", 1.0))
        .is_err());

    let mut driver = RecordingDriver::default();
    assert_eq!(translator.flush(&mut driver), 1);
    assert_eq!(driver.sent, vec![CanMessage::new(0x300, 1 << 59)]);
}
