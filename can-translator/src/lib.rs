//! CAN Translator Library
//!
//! Translates between raw CAN frames and named, human-meaningful signal
//! values, in both directions.
//!
//! # Architecture
//!
//! - Bit fields are addressed MSB-first on a 64-bit payload ([`bitfield`])
//! - Signal definitions come from TOML signal tables or DBC files
//! - Received frames are decoded, debounced per signal and handed to a
//!   [`MessageEmitter`]
//! - Host writes are encoded, permission-checked and queued per bus until a
//!   [`BusDriver`] drains them
//!
//! The library does NOT:
//! - Talk to CAN hardware (that is the [`BusDriver`]'s job)
//! - Handle little-endian or multiplexed signals
//! - Reassemble multi-frame transport protocols
//!
//! # Example Usage
//!
//! ```no_run
//! use can_translator::{CanFrame, CollectingEmitter, Translator, TranslatorConfig, Value};
//! use std::path::Path;
//!
//! let mut translator = Translator::new(TranslatorConfig::new());
//! translator.load_table(Path::new("signals.toml")).unwrap();
//!
//! // Bus to host
//! let mut emitter = CollectingEmitter::new();
//! translator.receive_frame(&CanFrame::new(0, 0x123, 0x5000_0000_0000_0000), &mut emitter);
//! for message in &emitter.messages {
//!     println!("{} = {}", message.name, message.value);
//! }
//!
//! // Host to bus
//! translator
//!     .send_signal("transmission_gear_position", &Value::from("neutral"))
//!     .unwrap();
//! ```

// Public modules
pub mod bitfield;
pub mod bytebuffer;
pub mod config;
pub mod queue;
pub mod signal_decoder;
pub mod signal_encoder;
pub mod signals;
pub mod translator;
pub mod types;

// Re-export main types for convenience
pub use config::TranslatorConfig;
pub use queue::Queue;
pub use signal_decoder::{DecodeHandler, SignalHandler, SignalSet};
pub use signal_encoder::{BusDriver, SendOutcome, WriterKind};
pub use signals::{
    BusConfig, CanBus, Command, CommandHandler, Signal, SignalRuntime, SignalState, SignalTable,
    TableStats,
};
pub use translator::{Translator, WriteOutcome, WriteRequest};
pub use types::{
    CanFrame, CanMessage, CollectingEmitter, MessageEmitter, Result, TranslatedMessage,
    TranslatorError, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a translator
        let translator = Translator::default();
        let stats = translator.stats();
        assert_eq!(stats.num_signals, 0);
        assert!(!VERSION.is_empty());
    }
}
