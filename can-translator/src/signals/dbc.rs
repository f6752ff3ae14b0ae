//! DBC file importer
//!
//! Parses Vector DBC files and converts their signals into [`Signal`] table
//! entries. Only big-endian (Motorola) signals map onto the MSB-first bit
//! numbering used by the translator; little-endian and multiplexed signals are
//! skipped with a warning.

use crate::signal_decoder::DecodeHandler;
use crate::signals::database::{Signal, SignalState};
use crate::types::{Result, TranslatorError};
use std::path::Path;

/// Parse a DBC file and return its signals, all assigned to `bus`
pub fn parse_dbc_file(path: &Path, bus: usize) -> Result<Vec<Signal>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        TranslatorError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Try UTF-8 first, then fall back to Latin-1 (compatible with Windows-1252)
    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let signals = parse_dbc_str(&dbc_content, bus).map_err(|e| match e {
        TranslatorError::DbcParseError(msg) => {
            TranslatorError::DbcParseError(format!("{:?}: {}", path, msg))
        }
        other => other,
    })?;

    log::info!("Imported {} signals from {:?}", signals.len(), path);
    Ok(signals)
}

/// Parse DBC text and return its signals, all assigned to `bus`
pub fn parse_dbc_str(content: &str, bus: usize) -> Result<Vec<Signal>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes())
        .map_err(|e| TranslatorError::DbcParseError(format!("{:?}", e)))?;

    let mut signals = Vec::new();
    for dbc_msg in dbc.messages() {
        for dbc_sig in dbc_msg.signals() {
            if let Some(signal) = convert_signal(&dbc, dbc_msg, dbc_sig, bus) {
                signals.push(signal);
            }
        }
    }
    Ok(signals)
}

/// Convert a DBC start bit of a big-endian signal to MSB-first numbering
///
/// DBC counts bits LSB-first within each byte and points at the signal's
/// most significant bit.
pub fn motorola_to_msb_first(start_bit: u64) -> u64 {
    let byte = start_bit / 8;
    let bit_in_byte = start_bit % 8;
    byte * 8 + (7 - bit_in_byte)
}

/// Convert a can-dbc signal, or `None` if it cannot be represented
fn convert_signal(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    dbc_sig: &can_dbc::Signal,
    bus: usize,
) -> Option<Signal> {
    if let can_dbc::ByteOrder::LittleEndian = *dbc_sig.byte_order() {
        log::warn!(
            "Skipping little-endian signal '{}' in message '{}'",
            dbc_sig.name(),
            dbc_msg.message_name()
        );
        return None;
    }

    if let can_dbc::MultiplexIndicator::MultiplexedSignal(_) = *dbc_sig.multiplexer_indicator() {
        log::warn!(
            "Skipping multiplexed signal '{}' in message '{}'",
            dbc_sig.name(),
            dbc_msg.message_name()
        );
        return None;
    }

    if let can_dbc::ValueType::Signed = *dbc_sig.value_type() {
        log::warn!(
            "Signal '{}' is signed but will be decoded as unsigned",
            dbc_sig.name()
        );
    }

    let bit_position = motorola_to_msb_first(*dbc_sig.start_bit());
    let bit_position = match u16::try_from(bit_position) {
        Ok(position) => position,
        Err(_) => {
            log::warn!("Skipping signal '{}': start bit out of range", dbc_sig.name());
            return None;
        }
    };
    let bit_size = u16::try_from(*dbc_sig.signal_size()).unwrap_or(u16::MAX);

    let mut states: Vec<SignalState> = dbc
        .value_descriptions_for_signal(can_dbc::MessageId(dbc_msg.message_id().0), dbc_sig.name())
        .map(|descriptions| {
            descriptions
                .iter()
                .map(|d| SignalState::new(*d.a() as i64, d.b().clone()))
                .collect()
        })
        .unwrap_or_default();

    // Value descriptions are raw values, while states are matched against the
    // scaled value. They only agree under unit scaling.
    let unit_scaling = *dbc_sig.factor() == 1.0 && *dbc_sig.offset() == 0.0;
    if !states.is_empty() && !unit_scaling {
        log::warn!(
            "Ignoring value descriptions of scaled signal '{}' (factor {}, offset {})",
            dbc_sig.name(),
            dbc_sig.factor(),
            dbc_sig.offset()
        );
        states.clear();
    }

    let decoder = if states.is_empty() {
        DecodeHandler::PassThrough
    } else {
        DecodeHandler::State
    };

    let signal = Signal::new(
        dbc_sig.name().clone(),
        dbc_msg.message_id().0,
        bit_position,
        bit_size,
    )
    .on_bus(bus)
    .with_scaling(*dbc_sig.factor(), *dbc_sig.offset())
    .with_range(*dbc_sig.min(), *dbc_sig.max())
    .with_states(states)
    .with_decoder(decoder);

    // Layouts that do not fit a classic frame are dropped here rather than
    // failing the whole file.
    match signal.validate(bus + 1) {
        Ok(()) => Some(signal),
        Err(e) => {
            log::warn!("Skipping signal: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DBC: &str = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    BA_
    VAL_

BS_:

BU_: ECU1 ECU2

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 7|16@0+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 23|8@0+ (1,-40) [-40|215] "C" ECU2
 SG_ OilLevel : 32|8@1+ (1,0) [0|255] "" ECU2

BO_ 512 Transmission: 8 ECU1
 SG_ GearPosition : 5|3@0+ (1,0) [0|7] "" ECU2
 SG_ ShiftRequest : 15|8@0+ (1,-1) [-1|254] "" ECU2

VAL_ 512 GearPosition 1 "reverse" 2 "third" 5 "neutral" ;
VAL_ 512 ShiftRequest 1 "reverse" 2 "neutral" ;
"#;

    #[test]
    fn test_motorola_start_bit_conversion() {
        assert_eq!(motorola_to_msb_first(7), 0);
        assert_eq!(motorola_to_msb_first(0), 7);
        assert_eq!(motorola_to_msb_first(23), 16);
        assert_eq!(motorola_to_msb_first(5), 2);
    }

    #[test]
    fn test_parse_big_endian_signals() {
        let signals = parse_dbc_str(DBC, 0).unwrap();

        // OilLevel is little-endian and skipped
        assert_eq!(signals.len(), 4);
        assert!(signals.iter().all(|s| s.name != "OilLevel"));

        let speed = &signals[0];
        assert_eq!(speed.name, "EngineSpeed");
        assert_eq!(speed.message_id, 291);
        assert_eq!(speed.bit_position, 0);
        assert_eq!(speed.bit_size, 16);
        assert_eq!(speed.max_value, 8000.0);

        let temp = &signals[1];
        assert_eq!(temp.bit_position, 16);
        assert_eq!(temp.offset, -40.0);
    }

    #[test]
    fn test_value_descriptions_become_states() {
        let signals = parse_dbc_str(DBC, 1).unwrap();
        let gear = signals.iter().find(|s| s.name == "GearPosition").unwrap();
        assert_eq!(gear.bus, 1);
        assert_eq!(gear.decoder, DecodeHandler::State);
        assert_eq!(gear.states.len(), 3);
        assert_eq!(gear.states[0], SignalState::new(1, "reverse"));
    }

    #[test]
    fn test_scaled_signal_drops_value_descriptions() {
        let signals = parse_dbc_str(DBC, 0).unwrap();
        let shift = signals.iter().find(|s| s.name == "ShiftRequest").unwrap();
        assert_eq!(shift.bit_position, 8);
        assert_eq!(shift.offset, -1.0);
        assert!(shift.states.is_empty());
        assert_eq!(shift.decoder, DecodeHandler::PassThrough);
    }

    #[test]
    fn test_scaled_signal_decodes_as_number() {
        use crate::signal_decoder::translate_signal;
        use crate::signals::SignalRuntime;
        use crate::types::{CollectingEmitter, TranslatedMessage};

        let signals = parse_dbc_str(DBC, 0).unwrap();
        let index = signals.iter().position(|s| s.name == "ShiftRequest").unwrap();
        let mut runtime = vec![SignalRuntime::default(); signals.len()];
        let mut emitter = CollectingEmitter::new();

        // Raw 2 is "neutral" in the file but scales to 1.0
        let data = 0x0002_0000_0000_0000;
        assert!(translate_signal(&mut emitter, index, data, &signals, &mut runtime));
        assert_eq!(
            emitter.messages,
            vec![TranslatedMessage::new("ShiftRequest", 1.0)]
        );
    }

    #[test]
    fn test_parse_dbc_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(DBC.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let signals = parse_dbc_file(temp_file.path(), 0).unwrap();
        assert_eq!(signals.len(), 4);
    }

    #[test]
    fn test_missing_file() {
        let result = parse_dbc_file(Path::new("does_not_exist.dbc"), 0);
        assert!(matches!(result, Err(TranslatorError::DbcParseError(_))));
    }
}
