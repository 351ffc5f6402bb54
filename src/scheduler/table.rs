/*
 * Task Table
 *
 * Fixed-capacity arena holding every process and thread of the kernel. The
 * table never allocates: processes and threads live in heapless vectors and
 * are found by linear search, which is fine for the small number of tasks a
 * CLUU system runs.
 *
 * Threads of a process form a singly-linked chain (Process::thread_head ->
 * Thread::next -> ...). New threads are appended at the tail, so walking the
 * chain visits threads in creation order.
 *
 * Locking: the table itself is plain data. The kernel keeps one instance
 * behind a spin::Mutex and every access goes through
 * `scheduler::atomic_region`. Nothing here locks on its own.
 */

use core::fmt;

use heapless::Vec;

use super::{
    MAX_PROCESSES, MAX_THREADS,
    process::{Process, ProcessId, ProcessState},
    signal::{DeliveryFlags, SigSet, Signal},
    thread::{BlockReason, Thread, ThreadId, ThreadState},
    traits::SignalTarget,
};

/// Task table error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// No free process or thread slot
    Full,
    /// Process ID doesn't exist (or is not running)
    NoSuchProcess,
    /// Thread ID doesn't exist
    NoSuchThread,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Full => write!(f, "Task table full"),
            TableError::NoSuchProcess => write!(f, "No such process"),
            TableError::NoSuchThread => write!(f, "No such thread"),
        }
    }
}

pub struct TaskTable {
    processes: Vec<Process, MAX_PROCESSES>,
    threads: Vec<Thread, MAX_THREADS>,
    next_process_id: ProcessId,
    next_thread_id: ThreadId,
}

impl TaskTable {
    pub const fn new() -> Self {
        Self {
            processes: Vec::new(),
            threads: Vec::new(),
            next_process_id: ProcessId(1), // 0 and negatives never name a process
            next_thread_id: ThreadId(1),
        }
    }

    /// Create an empty process
    pub fn spawn_process(&mut self, name: &str) -> Result<ProcessId, TableError> {
        let pid = self.next_process_id;
        self.processes
            .push(Process::new(pid, name))
            .map_err(|_| TableError::Full)?;
        self.next_process_id = ProcessId(pid.0 + 1);

        log::debug!("Spawned {} ({})", pid, name);
        Ok(pid)
    }

    /// Create a thread in `pid`, appended at the tail of its chain
    pub fn spawn_thread(&mut self, pid: ProcessId, name: &str) -> Result<ThreadId, TableError> {
        let tail = {
            let process = self.process(pid).ok_or(TableError::NoSuchProcess)?;
            if process.state != ProcessState::Running {
                return Err(TableError::NoSuchProcess);
            }
            process.thread_tail
        };

        let tid = self.next_thread_id;
        self.threads
            .push(Thread::new(tid, name, pid))
            .map_err(|_| TableError::Full)?;
        self.next_thread_id = ThreadId(tid.0 + 1);

        if let Some(tail) = tail {
            if let Some(prev) = self.thread_mut(tail) {
                prev.next = Some(tid);
            }
        }

        if let Some(process) = self.process_mut(pid) {
            if process.thread_head.is_none() {
                process.thread_head = Some(tid);
            }
            process.thread_tail = Some(tid);
            process.thread_count += 1;
        }

        log::debug!("Spawned {} ({}) in {}", tid, name, pid);
        Ok(tid)
    }

    /// Remove a thread and unlink it from its process chain
    ///
    /// If this was the last thread, the process transitions to Zombie state.
    pub fn exit_thread(&mut self, tid: ThreadId) -> Result<(), TableError> {
        let index = self
            .threads
            .iter()
            .position(|t| t.id == tid)
            .ok_or(TableError::NoSuchThread)?;
        let thread = self.threads.swap_remove(index);
        let pid = thread.process_id;

        // Find the predecessor in the chain, if any
        let prev = self
            .threads
            .iter()
            .find(|t| t.process_id == pid && t.next == Some(tid))
            .map(|t| t.id);

        if let Some(prev) = prev {
            if let Some(prev_thread) = self.thread_mut(prev) {
                prev_thread.next = thread.next;
            }
        }

        if let Some(process) = self.process_mut(pid) {
            if process.thread_head == Some(tid) {
                process.thread_head = thread.next;
            }
            if process.thread_tail == Some(tid) {
                process.thread_tail = prev;
            }
            process.thread_count = process.thread_count.saturating_sub(1);

            if process.thread_count == 0 && process.state == ProcessState::Running {
                process.exit(0);
            }
        }

        Ok(())
    }

    /// Terminate every thread of `pid` and leave it as a zombie
    pub fn exit_process(&mut self, pid: ProcessId, code: i32) -> Result<(), TableError> {
        let process = self.process_mut(pid).ok_or(TableError::NoSuchProcess)?;
        process.exit(code);
        process.thread_head = None;
        process.thread_tail = None;
        process.thread_count = 0;

        self.threads.retain(|t| t.process_id != pid);
        log::debug!("{} exited with code {}", pid, code);
        Ok(())
    }

    /// Drop a zombie process from the table and return its exit code
    pub fn reap(&mut self, pid: ProcessId) -> Result<i32, TableError> {
        let index = self
            .processes
            .iter()
            .position(|p| p.id == pid && p.is_zombie())
            .ok_or(TableError::NoSuchProcess)?;
        let process = self.processes.swap_remove(index);
        Ok(process.exit_code.unwrap_or(0))
    }

    /// Block `tid` until one of the signals in `mask` is pending
    ///
    /// Returns false (and leaves the thread runnable) if such a signal is
    /// already pending.
    pub fn block_on_signals(&mut self, tid: ThreadId, mask: SigSet) -> Result<bool, TableError> {
        let thread = self.thread_mut(tid).ok_or(TableError::NoSuchThread)?;
        if thread.pending.intersects(mask) {
            return Ok(false);
        }
        thread.state = ThreadState::Blocked(BlockReason::WaitingForSignal { mask });
        Ok(true)
    }

    /// Consume and return the pending signals of `tid`
    pub fn take_pending(&mut self, tid: ThreadId) -> Result<SigSet, TableError> {
        let thread = self.thread_mut(tid).ok_or(TableError::NoSuchThread)?;
        let pending = thread.pending;
        thread.pending = SigSet::empty();
        thread.timer_pending = SigSet::empty();
        Ok(pending)
    }

    pub fn process(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == pid)
    }

    fn process_mut(&mut self, pid: ProcessId) -> Option<&mut Process> {
        self.processes.iter_mut().find(|p| p.id == pid)
    }

    pub fn thread(&self, tid: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == tid)
    }

    fn thread_mut(&mut self, tid: ThreadId) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id == tid)
    }

    /// Thread IDs of `pid` in chain order
    pub fn chain(&self, pid: ProcessId) -> Vec<ThreadId, MAX_THREADS> {
        let mut out = Vec::new();
        let mut cursor = self.chain_head(pid);
        while let Some(tid) = cursor {
            if out.push(tid).is_err() {
                break;
            }
            cursor = self.next_in_chain(tid);
        }
        out
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalTarget for TaskTable {
    fn chain_head(&self, pid: ProcessId) -> Option<ThreadId> {
        self.process(pid).and_then(|p| p.thread_head)
    }

    fn next_in_chain(&self, tid: ThreadId) -> Option<ThreadId> {
        self.thread(tid).and_then(|t| t.next)
    }

    fn deliver(&mut self, tid: ThreadId, signal: Signal, flags: DeliveryFlags) {
        if let Some(thread) = self.thread_mut(tid) {
            thread.post_signal(signal, flags);
        }
    }

    fn mark_runnable(&mut self, tid: ThreadId) -> bool {
        match self.thread_mut(tid) {
            Some(thread) if thread.signal_wait_satisfied() => {
                thread.state = ThreadState::Ready;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_keeps_creation_order() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let a = table.spawn_thread(pid, "a").unwrap();
        let b = table.spawn_thread(pid, "b").unwrap();
        let c = table.spawn_thread(pid, "c").unwrap();

        assert_eq!(table.chain(pid).as_slice(), &[a, b, c]);
        assert_eq!(table.process(pid).unwrap().thread_count, 3);
    }

    #[test]
    fn test_exit_thread_unlinks_middle_head_and_tail() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let a = table.spawn_thread(pid, "a").unwrap();
        let b = table.spawn_thread(pid, "b").unwrap();
        let c = table.spawn_thread(pid, "c").unwrap();

        table.exit_thread(b).unwrap();
        assert_eq!(table.chain(pid).as_slice(), &[a, c]);

        table.exit_thread(a).unwrap();
        assert_eq!(table.chain(pid).as_slice(), &[c]);

        // New threads still append after the surviving tail
        let d = table.spawn_thread(pid, "d").unwrap();
        assert_eq!(table.chain(pid).as_slice(), &[c, d]);

        table.exit_thread(d).unwrap();
        let e = table.spawn_thread(pid, "e").unwrap();
        assert_eq!(table.chain(pid).as_slice(), &[c, e]);
    }

    #[test]
    fn test_last_thread_exit_makes_zombie() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let a = table.spawn_thread(pid, "a").unwrap();

        table.exit_thread(a).unwrap();
        assert!(table.process(pid).unwrap().is_zombie());
        assert_eq!(table.spawn_thread(pid, "late"), Err(TableError::NoSuchProcess));
        assert_eq!(table.reap(pid), Ok(0));
        assert!(table.process(pid).is_none());
    }

    #[test]
    fn test_exit_process_drops_threads() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let other = table.spawn_process("other").unwrap();
        table.spawn_thread(pid, "a").unwrap();
        table.spawn_thread(pid, "b").unwrap();
        let keep = table.spawn_thread(other, "keep").unwrap();

        table.exit_process(pid, 3).unwrap();
        assert_eq!(table.chain_head(pid), None);
        assert_eq!(table.thread_count(), 1);
        assert_eq!(table.chain(other).as_slice(), &[keep]);
        assert_eq!(table.reap(pid), Ok(3));
    }

    #[test]
    fn test_signal_wakes_waiter() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let tid = table.spawn_thread(pid, "waiter").unwrap();

        assert_eq!(table.block_on_signals(tid, SigSet::SIGALRM), Ok(true));
        table.deliver(tid, Signal::SIGALRM, DeliveryFlags::TIMER);
        assert!(table.mark_runnable(tid));
        assert_eq!(table.thread(tid).unwrap().state, ThreadState::Ready);

        // Already pending: no need to block
        assert_eq!(table.block_on_signals(tid, SigSet::SIGALRM), Ok(false));
        assert_eq!(table.take_pending(tid), Ok(SigSet::SIGALRM));
        assert_eq!(table.take_pending(tid), Ok(SigSet::empty()));
    }

    #[test]
    fn test_mark_runnable_ignores_other_waits() {
        let mut table = TaskTable::new();
        let pid = table.spawn_process("app").unwrap();
        let tid = table.spawn_thread(pid, "waiter").unwrap();

        table.block_on_signals(tid, SigSet::SIGUSR1).unwrap();
        table.deliver(tid, Signal::SIGALRM, DeliveryFlags::TIMER);
        assert!(!table.mark_runnable(tid));
        assert!(matches!(
            table.thread(tid).unwrap().state,
            ThreadState::Blocked(_)
        ));
    }
}
