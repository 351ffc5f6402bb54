/*
 * Kernel Logging System
 *
 * `log` backend for the timer layer. Records at or below the configured level
 * are formatted as "[LEVEL] message" into an in-memory ring buffer, which a
 * console or serial flusher drains when it gets to run.
 *
 * Why a ring buffer:
 * - Expirations are logged from the timer-service task, which must not block
 *   on a slow serial port
 * - No heap allocations
 * - Old output is overwritten instead of stalling the kernel
 */

use core::fmt::{self, Write};

use lazy_static::lazy_static;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Mutex;

use super::ring_buffer::RingBuffer;

lazy_static! {
    /// Log output not yet drained
    static ref LOG_RING: Mutex<RingBuffer> = Mutex::new(RingBuffer::new());
}

/// fmt::Write adapter over the ring
struct RingWriter<'r>(&'r mut RingBuffer);

impl Write for RingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write(s);
        Ok(())
    }
}

/// Logger writing into LOG_RING
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut ring = LOG_RING.lock();
            let _ = writeln!(RingWriter(&mut *ring), "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Install the kernel logger with `level` as the maximum level
///
/// Fails if another logger was installed first. The level is applied either
/// way.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let result = log::set_logger(&LOGGER);
    log::set_max_level(level);
    result
}

/// Move buffered log output into `dest`, returning the number of bytes copied
pub fn drain(dest: &mut [u8]) -> usize {
    LOG_RING.lock().read(dest)
}

/// Bytes of log output waiting to be drained
pub fn pending() -> usize {
    LOG_RING.lock().len()
}
