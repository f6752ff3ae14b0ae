//! Byte queues for host I/O
//!
//! Incoming bytes from the host accumulate in a [`ByteQueue`] until a complete
//! message can be parsed out of them; outgoing messages are appended with a
//! CRLF terminator.

use crate::queue::Queue;

/// Capacity of a host I/O byte queue
pub const BYTE_QUEUE_SIZE: usize = 512;

pub type ByteQueue = Queue<u8, BYTE_QUEUE_SIZE>;

const MESSAGE_TERMINATOR: &[u8] = b"\r\n";

/// Hand the buffered bytes to `callback` and reset the queue if it is done
///
/// The callback returns true when it found and processed a complete message;
/// the queue is then emptied. Otherwise the bytes are kept so more can arrive,
/// unless the queue is full or holds a NUL byte, in which case no message can
/// ever be found and the queue is emptied as well.
pub fn process_queue<F, const N: usize>(queue: &mut Queue<u8, N>, mut callback: F)
where
    F: FnMut(&[u8]) -> bool,
{
    if queue.is_empty() {
        return;
    }

    let mut snapshot = vec![0u8; queue.len()];
    let len = queue.snapshot(&mut snapshot);
    let bytes = &snapshot[..len];

    if callback(bytes) {
        queue.clear();
    } else if queue.is_full() {
        log::warn!("Incoming message is too long, dropping {} buffered bytes", len);
        queue.clear();
    } else if bytes.contains(&0) {
        log::warn!("Incoming buffer is corrupted, dropping {} buffered bytes", len);
        queue.clear();
    }
}

/// Append `message` plus CRLF to the queue, but only if all of it fits
///
/// Returns true if the message was added.
pub fn conditional_enqueue<const N: usize>(queue: &mut Queue<u8, N>, message: &[u8]) -> bool {
    if queue.available() < message.len() + MESSAGE_TERMINATOR.len() {
        log::debug!(
            "Not enough room for a {} byte message ({} free)",
            message.len(),
            queue.available()
        );
        return false;
    }

    for &byte in message.iter().chain(MESSAGE_TERMINATOR) {
        // Room was checked above, so this cannot fail.
        let _ = queue.push(byte);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(queue: &mut ByteQueue, bytes: &[u8]) {
        for &b in bytes {
            queue.push(b).unwrap();
        }
    }

    #[test]
    fn test_processed_message_clears_queue() {
        let mut queue = ByteQueue::new();
        fill(&mut queue, b"{\"name\": \"x\"}\n");
        let mut seen = Vec::new();
        process_queue(&mut queue, |bytes| {
            seen.extend_from_slice(bytes);
            true
        });
        assert!(queue.is_empty());
        assert_eq!(seen, b"{\"name\": \"x\"}\n");
    }

    #[test]
    fn test_partial_message_is_kept() {
        let mut queue = ByteQueue::new();
        fill(&mut queue, b"{\"name\":");
        process_queue(&mut queue, |_| false);
        assert_eq!(queue.len(), 8);
    }

    #[test]
    fn test_corrupted_buffer_is_dropped() {
        let mut queue = ByteQueue::new();
        fill(&mut queue, b"ab\0cd");
        process_queue(&mut queue, |_| false);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_buffer_without_message_is_dropped() {
        let mut queue: Queue<u8, 4> = Queue::new();
        for b in b"abcd" {
            queue.push(*b).unwrap();
        }
        process_queue(&mut queue, |_| false);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue_skips_callback() {
        let mut queue = ByteQueue::new();
        let mut called = false;
        process_queue(&mut queue, |_| {
            called = true;
            true
        });
        assert!(!called);
    }

    #[test]
    fn test_conditional_enqueue_appends_crlf() {
        let mut queue = ByteQueue::new();
        assert!(conditional_enqueue(&mut queue, b"hello"));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), b"hello\r\n");
    }

    #[test]
    fn test_conditional_enqueue_is_all_or_nothing() {
        let mut queue: Queue<u8, 6> = Queue::new();
        assert!(!conditional_enqueue(&mut queue, b"hello"));
        assert!(queue.is_empty());
        assert!(conditional_enqueue(&mut queue, b"hi"));
        assert_eq!(queue.len(), 4);
    }
}
