/*
 * Ring Buffer for Logging
 *
 * Fixed-size byte ring holding the most recent kernel log output until
 * someone drains it (the debug shell, a serial flusher, a test).
 *
 * Design:
 * - Fixed-size circular buffer (8KB), no heap
 * - Overwrite on overflow (loses the oldest bytes)
 * - Not synchronized by itself: the logger keeps it behind a spin::Mutex
 */

use heapless::Deque;

/// Size of the ring buffer
pub const BUFFER_SIZE: usize = 8 * 1024;

/// Ring buffer for log messages
pub struct RingBuffer {
    bytes: Deque<u8, BUFFER_SIZE>,
    /// Bytes dropped to make room since the last drain
    overwritten: usize,
}

impl RingBuffer {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            bytes: Deque::new(),
            overwritten: 0,
        }
    }

    /// Append `data`, dropping the oldest bytes if the buffer is full
    ///
    /// Returns the number of bytes written.
    pub fn write(&mut self, data: &str) -> usize {
        for &byte in data.as_bytes() {
            if self.bytes.is_full() {
                self.bytes.pop_front();
                self.overwritten += 1;
            }
            // Room was made above
            let _ = self.bytes.push_back(byte);
        }
        data.len()
    }

    /// Move up to `dest.len()` of the oldest bytes into `dest`
    ///
    /// Returns the number of bytes read.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let mut count = 0;
        while count < dest.len() {
            match self.bytes.pop_front() {
                Some(byte) => {
                    dest[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        if self.bytes.is_empty() {
            self.overwritten = 0;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes currently in the buffer
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes lost to overflow since the buffer was last emptied
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read() {
        let mut rb = RingBuffer::new();

        let written = rb.write("Hello, World!");
        assert_eq!(written, 13);

        let mut buf = [0u8; 20];
        let read = rb.read(&mut buf);
        assert_eq!(read, 13);
        assert_eq!(&buf[..13], b"Hello, World!");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_overflow_keeps_newest_bytes() {
        let mut rb = RingBuffer::new();

        rb.write(&"x".repeat(BUFFER_SIZE - 2));
        rb.write("WRAP");

        assert_eq!(rb.len(), BUFFER_SIZE);
        assert_eq!(rb.overwritten(), 2);

        let mut buf = std::vec![0u8; BUFFER_SIZE];
        rb.read(&mut buf);
        assert_eq!(&buf[BUFFER_SIZE - 4..], b"WRAP");
        assert_eq!(rb.overwritten(), 0);
    }
}
