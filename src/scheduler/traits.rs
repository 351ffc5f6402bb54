/*
 * Signal Delivery Interface
 *
 * This trait is the only way the timer layer touches the process/thread
 * table. It exposes exactly what signal fan-out needs:
 *
 * - look up a process by identity and get the head of its thread chain
 * - follow the chain through the `next` relation
 * - deliver a signal to one thread
 * - make a thread runnable again if it was waiting for that signal
 *
 * The kernel's TaskTable implements it; tests can provide their own.
 * Implementations are always used from inside the atomic region (see
 * `scheduler::atomic_region`), so the methods take `&mut self` and never lock.
 */

use super::{
    process::ProcessId,
    signal::{DeliveryFlags, Signal},
    thread::ThreadId,
};

pub trait SignalTarget {
    /// Head of the thread chain of `pid`, or None if the process is unknown
    /// or has no threads
    fn chain_head(&self, pid: ProcessId) -> Option<ThreadId>;

    /// Thread following `tid` in its process chain
    fn next_in_chain(&self, tid: ThreadId) -> Option<ThreadId>;

    /// Post `signal` to a single thread
    fn deliver(&mut self, tid: ThreadId, signal: Signal, flags: DeliveryFlags);

    /// Wake `tid` if it was blocked waiting for a signal that is now pending
    ///
    /// Returns true if the thread changed state.
    fn mark_runnable(&mut self, tid: ThreadId) -> bool;
}
