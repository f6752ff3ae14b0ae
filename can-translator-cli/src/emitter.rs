//! JSON emitter for translated messages
//!
//! Each message becomes one JSON object followed by CRLF. Output is staged in
//! a [`ByteQueue`] and written out whenever the next message would not fit.

use can_translator::bitfield::nth_byte;
use can_translator::bytebuffer::{conditional_enqueue, ByteQueue};
use can_translator::types::FRAME_SIZE;
use can_translator::{CanMessage, MessageEmitter, TranslatedMessage};
use serde::Serialize;
use std::io::{self, Write};

/// Raw frame as sent to the host
#[derive(Debug, Serialize)]
struct RawFrame {
    id: u32,
    data: String,
}

impl From<&CanMessage> for RawFrame {
    fn from(message: &CanMessage) -> Self {
        let data = (0..FRAME_SIZE)
            .map(|n| format!("{:02X}", nth_byte(message.data, n)))
            .collect::<String>();
        Self {
            id: message.id,
            data: format!("0x{}", data),
        }
    }
}

pub struct JsonEmitter<W: Write> {
    out: W,
    buffer: ByteQueue,
    emitted: usize,
    write_errors: usize,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buffer: ByteQueue::new(),
            emitted: 0,
            write_errors: 0,
        }
    }

    /// Number of messages accepted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn write_errors(&self) -> usize {
        self.write_errors
    }

    /// Write out everything staged so far
    pub fn flush(&mut self) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(self.buffer.len());
        while let Some(byte) = self.buffer.pop() {
            bytes.push(byte);
        }
        self.out.write_all(&bytes)?;
        self.out.flush()
    }

    /// Flush and hand back the writer
    pub fn finish(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.out)
    }

    fn send<T: Serialize>(&mut self, value: &T) {
        let json = match serde_json::to_vec(value) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Unable to serialize message: {}", e);
                return;
            }
        };

        if !conditional_enqueue(&mut self.buffer, &json) {
            if let Err(e) = self.flush() {
                log::warn!("Unable to write output: {}", e);
                self.write_errors += 1;
            }
            if !conditional_enqueue(&mut self.buffer, &json) {
                log::warn!("Dropped a {} byte message larger than the output buffer", json.len());
                return;
            }
        }
        self.emitted += 1;
    }
}

impl<W: Write> MessageEmitter for JsonEmitter<W> {
    fn emit(&mut self, message: TranslatedMessage) {
        self.send(&message);
    }

    fn emit_raw(&mut self, message: &CanMessage) {
        self.send(&RawFrame::from(message));
    }
}
