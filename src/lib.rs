/*
 * CLUU Kernel Timer Layer
 *
 * This crate implements POSIX interval timers (timer_create, timer_settime,
 * timer_gettime, timer_getoverrun, timer_delete) for the CLUU kernel on top of
 * the scheduler's only timer abstraction: a single-shot software timer that
 * fires a callback on a dedicated timer-service task and has to be stopped,
 * reprogrammed and restarted by posting commands to that task's queue.
 *
 * Why this is important:
 * - POSIX timers have two durations (initial value and interval) while the
 *   primitive only knows one, so the layer re-arms the primitive itself
 * - Expirations run on the timer-service task, not on the owning thread, so
 *   the control block is shared state between two tasks
 * - Timer commands must never be lost: a stale armed timer firing after its
 *   owner disarmed it would corrupt the value/interval state machine
 * - Expirations are reported as signals to every thread of the owning process
 *
 * Layout:
 * - `timer`: control block, command protocol, expiration state machine,
 *   signal fan-out and the public API
 * - `scheduler`: process/thread table and signal delivery used by fan-out
 * - `time`: timespec/itimerspec units and tick conversion
 * - `syscall`: errno-returning entry points for the syscall dispatcher
 * - `config`: tick rate and command retry policy
 * - `utils`: kernel logger backend
 */

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod scheduler;
pub mod syscall;
pub mod time;
pub mod timer;
pub mod utils;

pub use config::{RetryPolicy, TimerConfig};
pub use scheduler::{ProcessId, Signal, TaskTable, ThreadId};
pub use time::{ITimerSpec, Ticks, Timespec};
pub use timer::{
    ArmFlags, ClockId, KernelTimer, Notification, Phase, SoftTimerService, TimerError,
    timer_create, timer_delete, timer_getoverrun, timer_gettime, timer_settime,
};
