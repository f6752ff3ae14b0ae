//! Fixed-capacity FIFO queue
//!
//! A ring buffer holding up to `N` elements of `T` by value. Used for the byte
//! streams exchanged with the host and for each bus's outbound message queue.
//!
//! The queue does no internal synchronization. When producer and consumer run
//! in contexts that can preempt each other (e.g. an interrupt handler and the
//! main loop), wrap the queue in a critical section or a lock.

use std::fmt;

pub struct Queue<T, const N: usize> {
    elements: [Option<T>; N],
    head: usize,
    len: usize,
}

impl<T, const N: usize> Queue<T, N> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            elements: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of elements the queue can hold
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append `value` at the back
    ///
    /// A full queue is left unchanged and the value is handed back.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let tail = (self.head + self.len) % N;
        self.elements[tail] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the element at the front, or `None` if empty
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.elements[self.head].take();
        self.head = (self.head + 1) % N;
        self.len -= 1;
        value
    }

    /// Element at the front, without removing it
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.elements[self.head].as_ref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Free slots left before `push` starts failing
    pub fn available(&self) -> usize {
        N - self.len
    }

    /// Drop every queued element
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
    }

    /// Iterate over queued elements front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.elements[(self.head + i) % N].as_ref())
    }

    /// Copy queued elements, front first, into `out` without consuming them
    ///
    /// Copies at most `out.len()` elements and returns how many were written.
    pub fn snapshot(&self, out: &mut [T]) -> usize
    where
        T: Clone,
    {
        let mut written = 0;
        for (slot, value) in out.iter_mut().zip(self.iter()) {
            *slot = value.clone();
            written += 1;
        }
        written
    }
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for Queue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
