/*
 * Timer Syscall Constants
 *
 * Values follow the Linux ABI so that newlib's POSIX timer wrappers can be
 * used unchanged. Return values follow the kernel's usual convention:
 * non-negative on success, negated errno on failure.
 */

/// Syscall error codes (negated when returned)
pub const EAGAIN: isize = 11; // Resource temporarily unavailable
pub const EBUSY: isize = 16; // Device or resource busy
pub const EINVAL: isize = 22; // Invalid argument

/// clockid_t values
pub const CLOCK_REALTIME: i32 = 0;
pub const CLOCK_MONOTONIC: i32 = 1;
pub const CLOCK_PROCESS_CPUTIME_ID: i32 = 2;
pub const CLOCK_THREAD_CPUTIME_ID: i32 = 3;

/// sigevent notification kinds
pub const SIGEV_SIGNAL: i32 = 0;
pub const SIGEV_NONE: i32 = 1;
pub const SIGEV_THREAD: i32 = 2;

/// timer_settime flag: the value is an absolute time
pub const TIMER_ABSTIME: i32 = 1;
