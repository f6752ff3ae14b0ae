//! Bus driver that logs outgoing frames instead of transmitting them

use can_translator::{BusDriver, CanBus, CanMessage, Result};

#[derive(Debug, Default)]
pub struct LoggingDriver {
    pub sent: Vec<CanMessage>,
}

impl LoggingDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BusDriver for LoggingDriver {
    fn send_message(&mut self, bus: &CanBus, message: &CanMessage) -> Result<()> {
        log::info!(
            "TX bus 0x{:X} @ {} bps: {}",
            bus.address,
            bus.speed,
            message
        );
        self.sent.push(*message);
        Ok(())
    }
}
