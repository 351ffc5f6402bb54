/*
 * Thread Records
 *
 * This module defines the Thread structure kept in the task table. Threads of
 * one process are linked into a singly-linked chain through `next`, in
 * creation order; the chain head lives in the owning Process.
 */

use core::fmt;

use super::{
    process::ProcessId,
    signal::{DeliveryFlags, SigSet, Signal},
};

/// Maximum length of a thread name
pub const MAX_THREAD_NAME: usize = 16;

/// Thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Reason why a thread was blocked
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Waiting for any signal in `mask` (sigwait/pause)
    WaitingForSignal { mask: SigSet },
}

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Ready,
    Blocked(BlockReason),
}

/// Thread structure
pub struct Thread {
    pub id: ThreadId,
    pub name: heapless::String<MAX_THREAD_NAME>,
    pub state: ThreadState,

    // Process this thread belongs to
    pub process_id: ProcessId,

    // Next thread of the same process (chain order = creation order)
    pub next: Option<ThreadId>,

    // Signals delivered but not yet consumed
    pub pending: SigSet,

    // Subset of `pending` that was generated by timer expirations
    pub timer_pending: SigSet,

    // Total number of deliveries, including duplicates of a pending signal
    pub signals_received: u64,
}

impl Thread {
    pub fn new(id: ThreadId, name: &str, process_id: ProcessId) -> Self {
        let mut short = heapless::String::new();
        for ch in name.chars() {
            if short.push(ch).is_err() {
                break;
            }
        }

        Self {
            id,
            name: short,
            state: ThreadState::Ready,
            process_id,
            next: None,
            pending: SigSet::empty(),
            timer_pending: SigSet::empty(),
            signals_received: 0,
        }
    }

    /// Record a signal as pending
    pub fn post_signal(&mut self, signal: Signal, flags: DeliveryFlags) {
        self.pending |= SigSet::of(signal);
        if flags.contains(DeliveryFlags::TIMER) {
            self.timer_pending |= SigSet::of(signal);
        }
        self.signals_received += 1;
    }

    /// Whether the thread is blocked on a signal that is now pending
    pub fn signal_wait_satisfied(&self) -> bool {
        match self.state {
            ThreadState::Blocked(BlockReason::WaitingForSignal { mask }) => {
                self.pending.intersects(mask)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name.as_str())
            .field("state", &self.state)
            .field("process", &self.process_id)
            .field("pending", &self.pending)
            .finish()
    }
}
