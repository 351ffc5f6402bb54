/*
 * Process Abstraction
 *
 * A Process is a container for one or more threads. For the timer layer the
 * interesting part is the thread chain: a process records the head (and tail)
 * of the singly-linked list of its threads, and signal fan-out walks that list
 * from the head.
 *
 * Process identifiers are signed, as in POSIX: only positive values name a
 * process.
 */

use core::fmt;

use super::thread::ThreadId;

/// Maximum length of a process name
pub const MAX_PROCESS_NAME: usize = 16;

/// Unique identifier for a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub i32);

impl ProcessId {
    /// Only strictly positive identifiers refer to a process
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process({})", self.0)
    }
}

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Process is running (has at least one thread)
    Running,
    /// Process has exited but not yet been reaped
    Zombie,
}

pub struct Process {
    /// Unique process identifier
    pub id: ProcessId,

    /// Human-readable process name (for debugging)
    pub name: heapless::String<MAX_PROCESS_NAME>,

    /// Current process state
    pub state: ProcessState,

    /// First thread of the chain
    pub thread_head: Option<ThreadId>,

    /// Last thread of the chain (append point)
    pub thread_tail: Option<ThreadId>,

    /// Number of threads in the chain
    pub thread_count: usize,

    /// Exit code (valid only in Zombie state)
    pub exit_code: Option<i32>,
}

impl Process {
    pub fn new(id: ProcessId, name: &str) -> Self {
        let mut short = heapless::String::new();
        for ch in name.chars() {
            if short.push(ch).is_err() {
                break;
            }
        }

        Process {
            id,
            name: short,
            state: ProcessState::Running,
            thread_head: None,
            thread_tail: None,
            thread_count: 0,
            exit_code: None,
        }
    }

    /// Mark process as exited with given exit code
    pub fn exit(&mut self, code: i32) {
        self.state = ProcessState::Zombie;
        self.exit_code = Some(code);
    }

    /// Check if process is a zombie
    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Zombie
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("name", &self.name.as_str())
            .field("state", &self.state)
            .field("thread_count", &self.thread_count)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}
