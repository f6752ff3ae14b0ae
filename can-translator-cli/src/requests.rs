//! Host write request reader
//!
//! The host sends newline-terminated JSON objects such as
//! `{"name": "headlamp_status", "value": true}`. Bytes are buffered in a
//! [`ByteQueue`] until a full line is present.

use can_translator::bytebuffer::{process_queue, ByteQueue};
use can_translator::WriteRequest;

#[derive(Debug, Default)]
pub struct RequestReader {
    buffer: ByteQueue,
}

impl RequestReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `bytes` and hand every complete request to `on_request`
    ///
    /// Lines that are not valid requests are logged and skipped.
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_request: F)
    where
        F: FnMut(WriteRequest),
    {
        for &byte in bytes {
            if self.buffer.push(byte).is_err() {
                // Full without a newline; let process_queue discard it
                process_queue(&mut self.buffer, |_| false);
                let _ = self.buffer.push(byte);
            }
            if byte == b'\n' {
                process_queue(&mut self.buffer, |line| {
                    if let Some(request) = parse_request(line) {
                        on_request(request);
                    }
                    true
                });
            }
        }
    }

    /// Bytes received but not yet terminated by a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_request(line: &[u8]) -> Option<WriteRequest> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<WriteRequest>(line) {
        Ok(request) => Some(request),
        Err(e) => {
            log::warn!(
                "Ignoring malformed request {:?}: {}",
                String::from_utf8_lossy(line),
                e
            );
            None
        }
    }
}
