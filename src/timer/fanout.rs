/*
 * Signal Fan-Out
 *
 * Delivers a timer's signal to every thread of the owning process. The chain
 * is walked inside the task table's atomic region, so threads created or
 * destroyed concurrently are either fully in or fully out of the walk.
 *
 * A process that is gone (or was never valid) receives nothing. That is not
 * an error: the owner may have exited between arming and firing.
 */

use spin::Mutex;

use super::control_block::Notification;
use crate::scheduler::{
    DeliveryFlags, MAX_THREADS, ProcessId, Signal, SignalTarget, atomic_region,
};

/// How an expiration was reported
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The direct callback ran
    Callback,
    /// The signal reached this many threads
    Threads(usize),
    /// Nothing was delivered
    Nothing,
}

/// Send `signal` to every thread of `pid`, returning how many were reached
pub fn fan_out<T>(tasks: &Mutex<T>, pid: ProcessId, signal: Signal) -> usize
where
    T: SignalTarget + ?Sized,
{
    if !pid.is_valid() {
        log::debug!("Fan-out of {} to invalid pid {} dropped", signal, pid);
        return 0;
    }

    let reached = atomic_region(tasks, |table| {
        let mut reached = 0;
        let mut cursor = table.chain_head(pid);

        while let Some(tid) = cursor {
            // A chain longer than the thread table is corrupt
            if reached >= MAX_THREADS {
                log::warn!("Thread chain of pid {} does not terminate", pid);
                break;
            }
            table.deliver(tid, signal, DeliveryFlags::TIMER);
            table.mark_runnable(tid);
            reached += 1;
            cursor = table.next_in_chain(tid);
        }

        reached
    });

    if reached == 0 {
        log::debug!("Fan-out of {} to pid {}: no threads", signal, pid);
    }
    reached
}

/// Report one expiration according to `notification`
pub fn notify<T>(notification: &Notification, tasks: &Mutex<T>) -> Delivery
where
    T: SignalTarget + ?Sized,
{
    match *notification {
        Notification::Callback { signo, notify } => {
            notify(signo);
            Delivery::Callback
        }
        Notification::None | Notification::ThreadGroup { owner: None, .. } => Delivery::Nothing,
        Notification::ThreadGroup {
            signo,
            owner: Some(pid),
        } => match fan_out(tasks, pid, signo) {
            0 => Delivery::Nothing,
            n => Delivery::Threads(n),
        },
    }
}
