//! Translator configuration types
//!
//! Runtime switches that apply to every frame. Signal-level behaviour (rates,
//! handlers, states) lives in the signal table instead.

use serde::{Deserialize, Serialize};

/// Configuration for the translator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Whether to pass every received frame through to the emitter untranslated
    #[serde(default)]
    pub emit_raw_frames: bool,

    /// Optional: only translate frames from these buses
    #[serde(default)]
    pub bus_filter: Option<Vec<usize>>,

    /// Optional: only translate these CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

impl TranslatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable raw frame emission
    pub fn with_raw_frames(mut self, enabled: bool) -> Self {
        self.emit_raw_frames = enabled;
        self
    }

    /// Builder method: set bus filter
    pub fn with_bus_filter(mut self, buses: Vec<usize>) -> Self {
        self.bus_filter = Some(buses);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a bus should be processed
    pub fn should_process_bus(&self, bus: usize) -> bool {
        match &self.bus_filter {
            Some(buses) => buses.contains(&bus),
            None => true,
        }
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&id),
            None => true,
        }
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, bus: usize, id: u32) -> bool {
        self.should_process_bus(bus) && self.should_process_message(id)
    }
}
