/*
 * Timer Control Block
 *
 * One control block per POSIX timer. It records the timer's clock, how
 * expirations are reported, the value/interval pair, which of the two the
 * next primitive expiration corresponds to, and the primitive timer bound to
 * it once armed.
 *
 * Every timer_settime starts a new arming generation. The primitive is
 * started on behalf of one generation and reports it back when it fires, so
 * an expiration that was already in flight when the timer was re-armed is
 * recognized as stale.
 *
 * The block lives in a slot owned by the caller (a process's timer table, a
 * static, ...). Nothing here allocates. The timer-service task keeps a shared
 * reference to the slot for as long as the primitive exists, which is why
 * the block sits behind a spin::Mutex: the owning thread and the service task
 * both mutate it.
 *
 * Lock rule: never hold the block lock across a timer command. The service
 * task takes the same lock from the expiration path.
 */

use bitflags::bitflags;
use spin::{Mutex, MutexGuard};

use super::error::TimerError;
use crate::{
    scheduler::{ProcessId, Signal},
    syscall::numbers::{
        CLOCK_MONOTONIC, CLOCK_PROCESS_CPUTIME_ID, CLOCK_REALTIME, CLOCK_THREAD_CPUTIME_ID,
        TIMER_ABSTIME,
    },
    time::ITimerSpec,
};

/// Clock a timer is measured against
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClockId {
    Realtime,
    Monotonic,
    ProcessCpuTime,
    ThreadCpuTime,
}

impl ClockId {
    /// Decode a POSIX clockid_t value
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            CLOCK_REALTIME => Some(ClockId::Realtime),
            CLOCK_MONOTONIC => Some(ClockId::Monotonic),
            CLOCK_PROCESS_CPUTIME_ID => Some(ClockId::ProcessCpuTime),
            CLOCK_THREAD_CPUTIME_ID => Some(ClockId::ThreadCpuTime),
            _ => None,
        }
    }

    /// Only the real-time clock can drive a timer in this kernel
    pub const fn is_supported(self) -> bool {
        matches!(self, ClockId::Realtime)
    }
}

bitflags! {
    /// timer_settime flags
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ArmFlags: i32 {
        /// The value is an absolute time (not supported)
        const ABSTIME = TIMER_ABSTIME;
    }
}

/// Opaque identity of a primitive timer inside the timer-service task
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveHandle(pub u32);

/// Whether the primitive timer exists
///
/// The handle only exists in the Created state, so a created block always
/// carries a valid handle and a block without one is never Created.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    NotCreated,
    Created { handle: PrimitiveHandle },
}

impl Lifecycle {
    pub fn handle(&self) -> Option<PrimitiveHandle> {
        match self {
            Lifecycle::Created { handle } => Some(*handle),
            Lifecycle::NotCreated => None,
        }
    }
}

/// Which POSIX duration the next primitive expiration stands for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// End of the initial value
    Value,
    /// End of the recurring interval
    Interval,
}

/// How an expiration is reported
#[derive(Debug, Copy, Clone)]
pub enum Notification {
    /// Call `notify` directly (on the timer-service task) with `signo`
    Callback { signo: Signal, notify: fn(Signal) },

    /// Send `signo` to every thread of `owner`. Nothing is delivered while
    /// no owner is bound.
    ThreadGroup {
        signo: Signal,
        owner: Option<ProcessId>,
    },

    /// SIGEV_NONE: expirations are not reported. Never gains an owner.
    None,
}

impl Notification {
    /// SIGALRM to the owning thread group, which is what a timer created
    /// without a sigevent gets
    pub const DEFAULT: Notification = Notification::ThreadGroup {
        signo: Signal::SIGALRM,
        owner: None,
    };

    pub const fn signal(&self) -> Option<Signal> {
        match self {
            Notification::Callback { signo, .. } => Some(*signo),
            Notification::ThreadGroup { signo, .. } => Some(*signo),
            Notification::None => None,
        }
    }

    pub const fn owner(&self) -> Option<ProcessId> {
        match self {
            Notification::ThreadGroup { owner, .. } => *owner,
            Notification::Callback { .. } | Notification::None => None,
        }
    }
}

impl Default for Notification {
    fn default() -> Self {
        Notification::DEFAULT
    }
}

/// The timer's persistent state
#[derive(Debug, Copy, Clone)]
pub struct ControlBlock {
    pub clock_id: ClockId,
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub spec: ITimerSpec,
    pub notification: Notification,
    /// Bumped by every timer_settime
    pub generation: u32,
}

impl ControlBlock {
    pub const fn new(clock_id: ClockId, notification: Notification) -> Self {
        Self {
            clock_id,
            lifecycle: Lifecycle::NotCreated,
            phase: Phase::Value,
            spec: ITimerSpec::ZERO,
            notification,
            generation: 0,
        }
    }
}

/// Caller-owned timer slot
pub struct KernelTimer {
    block: Mutex<ControlBlock>,
}

impl KernelTimer {
    /// Empty slot: real-time clock, default notification, not created
    pub const fn new() -> Self {
        Self {
            block: Mutex::new(ControlBlock::new(ClockId::Realtime, Notification::DEFAULT)),
        }
    }

    /// Initialize the slot for a new timer
    ///
    /// Fails without touching the slot if the clock is not supported, or if
    /// the slot still holds an armed timer (its primitive would be orphaned).
    pub fn init(&self, clock_id: ClockId, notification: Notification) -> Result<(), TimerError> {
        if !clock_id.is_supported() {
            return Err(TimerError::InvalidArgument);
        }

        let mut block = self.block.lock();
        if let Lifecycle::Created { .. } = block.lifecycle {
            return Err(TimerError::InvalidArgument);
        }
        *block = ControlBlock::new(clock_id, notification);
        Ok(())
    }

    /// Bind the thread group that receives this timer's signal
    ///
    /// Only signal-delivering timers have an owner.
    pub fn bind_owner(&self, pid: ProcessId) -> Result<(), TimerError> {
        let mut block = self.block.lock();
        match &mut block.notification {
            Notification::ThreadGroup { owner, .. } => {
                *owner = Some(pid);
                Ok(())
            }
            Notification::Callback { .. } | Notification::None => Err(TimerError::InvalidArgument),
        }
    }

    /// Copy of the current control block
    pub fn snapshot(&self) -> ControlBlock {
        *self.block.lock()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.block.lock().lifecycle
    }

    pub fn is_created(&self) -> bool {
        matches!(self.lifecycle(), Lifecycle::Created { .. })
    }

    pub fn phase(&self) -> Phase {
        self.block.lock().phase
    }

    pub fn spec(&self) -> ITimerSpec {
        self.block.lock().spec
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ControlBlock> {
        self.block.lock()
    }
}

impl Default for KernelTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for KernelTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let block = self.snapshot();
        f.debug_struct("KernelTimer")
            .field("clock", &block.clock_id)
            .field("lifecycle", &block.lifecycle)
            .field("phase", &block.phase)
            .field("spec", &block.spec)
            .field("generation", &block.generation)
            .finish()
    }
}
