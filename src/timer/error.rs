/*
 * Timer Layer Errors
 */

use core::fmt;

use crate::syscall::numbers::{EAGAIN, EBUSY, EINVAL};

/// Errors returned by the timer API
///
/// A momentarily full command queue is not an error: the command protocol
/// absorbs it by retrying. `ServiceBusy` only shows up when the kernel was
/// configured with a bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Null/unknown timer, unsupported clock, unsupported arming flag,
    /// malformed timespec, or operation on a timer that was never armed
    InvalidArgument,
    /// The timer-service task kept rejecting a command past the retry bound
    ServiceBusy,
    /// The timer-service task has no free primitive timer left
    NoPrimitive,
}

impl TimerError {
    /// Positive errno value for the syscall layer
    pub fn errno(&self) -> isize {
        match self {
            TimerError::InvalidArgument => EINVAL,
            TimerError::ServiceBusy => EBUSY,
            TimerError::NoPrimitive => EAGAIN,
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidArgument => write!(f, "Invalid argument"),
            TimerError::ServiceBusy => write!(f, "Timer service busy"),
            TimerError::NoPrimitive => write!(f, "No primitive timer available"),
        }
    }
}
