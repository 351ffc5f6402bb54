/*
 * Scheduler Task Table Interface
 *
 * This module holds the parts of the scheduler the timer layer depends on:
 * the process/thread table, signal numbers and sets, and the atomic region
 * used for every table access from the timer-service task.
 *
 * ATOMIC REGION:
 * ==============
 *
 * Application threads create and destroy threads while the timer-service task
 * walks thread chains to deliver timer signals. Both sides take the same
 * table lock through `atomic_region`; on the bare-metal kernel the region
 * additionally runs with interrupts disabled so the timer IRQ cannot preempt
 * the holder and spin on the lock.
 *
 * Software timer commands (start/stop/change-period/delete) must never be
 * issued from inside the region: they can block waiting for the
 * timer-service task, which may itself be waiting for the table lock.
 */

use spin::Mutex;

pub mod process;
pub mod signal;
pub mod table;
pub mod thread;
pub mod traits;

pub use process::{Process, ProcessId, ProcessState};
pub use signal::{DeliveryFlags, SigSet, Signal};
pub use table::{TableError, TaskTable};
pub use thread::{BlockReason, Thread, ThreadId, ThreadState};
pub use traits::SignalTarget;

/// Maximum number of processes
pub const MAX_PROCESSES: usize = 32;

/// Maximum number of threads
pub const MAX_THREADS: usize = 64;

/// Run `f` with exclusive access to the task table
///
/// This is the kernel's mutual-exclusion discipline for process/thread table
/// mutation. Do not nest, and do not post timer commands from `f`.
pub fn atomic_region<T: ?Sized, R>(table: &Mutex<T>, f: impl FnOnce(&mut T) -> R) -> R {
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    {
        x86_64::instructions::interrupts::without_interrupts(|| f(&mut *table.lock()))
    }

    #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
    {
        f(&mut *table.lock())
    }
}
