/*
 * Time Units
 *
 * Timestamp and duration types shared by the timer layer, plus the conversion
 * from POSIX seconds+nanoseconds pairs to the tick counts understood by the
 * timer-service task.
 */

pub mod unit;

pub use unit::{ITimerSpec, Ticks, Timespec};
