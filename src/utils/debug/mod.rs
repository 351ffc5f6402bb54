/*
 * Debugging and Logging Utilities
 */

pub mod logger;
pub mod ring_buffer;
