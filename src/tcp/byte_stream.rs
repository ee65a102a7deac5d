use log::trace;
use std::collections::VecDeque;

/// A capacity-bounded, in-memory byte pipe.
///
/// Bytes are written at one end and read in the same order at the other.
/// The writer may push at most `available_capacity()` bytes at any time; the
/// excess is dropped, since a full pipe is ordinary back-pressure. Closing
/// and erroring are one-way and sticky.
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_pushed: 0,
            bytes_popped: 0,
            closed: false,
            error: false,
        }
    }

    // Writer side

    /// Append as much of `data` as fits.
    pub fn push(&mut self, data: &[u8]) {
        if self.closed {
            return;
        }
        let len = data.len().min(self.available_capacity());
        if len < data.len() {
            trace!(
                "byte stream full, truncating push of {} bytes to {}",
                data.len(),
                len
            );
        }
        self.buffer.extend(&data[..len]);
        self.bytes_pushed += len as u64;
    }

    /// Signal that no further bytes will be written.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    // Reader side

    /// The next readable bytes, without consuming them.
    ///
    /// This is the longest contiguous run currently held and may be shorter
    /// than `bytes_buffered()`; pop it and peek again for the rest.
    pub fn peek(&self) -> &[u8] {
        self.buffer.as_slices().0
    }

    /// Discard the first `len` buffered bytes. Clamped to what is buffered.
    pub fn pop(&mut self, len: usize) {
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
        self.bytes_popped += len as u64;
    }

    /// Pop up to `len` bytes into an owned buffer.
    pub fn read(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len.min(self.buffer.len()));
        while out.len() < len {
            let chunk = self.peek();
            if chunk.is_empty() {
                break;
            }
            let take = chunk.len().min(len - out.len());
            out.extend_from_slice(&chunk[..take]);
            self.pop(take);
        }
        out
    }

    /// Closed and fully drained.
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn bytes_buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
