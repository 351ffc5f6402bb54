/*
 * Soft Timer Service
 *
 * Reference implementation of the scheduler's timer-service task: a set of
 * single-shot primitive timers counted in ticks, and a bounded command queue
 * through which other tasks control them.
 *
 * ## Behaviour
 *
 * - A primitive has a period and is either dormant or armed for an absolute
 *   expiry tick. It fires once, then is dormant again until restarted.
 * - `Start` records the arming generation it was posted for; the firing hands
 *   that generation to the expiry handler unchanged.
 * - Commands posted by other tasks are queued (FIFO) together with the tick at
 *   which they were posted. A full queue rejects the post.
 * - Every tick the service first applies all queued commands, then fires each
 *   primitive whose expiry tick has been reached. `Start` counts the period
 *   from the post tick, so queueing latency does not shift expirations.
 * - Expiration callbacks run on the service task. Commands they issue go
 *   through a direct handle and are applied immediately; the service is the
 *   one task that owns the primitive list, so it never has to queue for
 *   itself.
 * - A period of 0 ticks fires on the next tick.
 * - `ChangePeriod` on an armed primitive re-arms it for the new period from
 *   the post tick. On a dormant primitive it only records the period.
 *
 * ## Integration Points
 *
 * The kernel's timer-service thread calls `advance(1, &router)` once per
 * tick. Application tasks reach the service through `TimerService` /
 * `TimerControl`. `backoff` stands for "let the service task run": it drains
 * the queue without moving the tick clock.
 */

use heapless::{Deque, Vec};
use spin::Mutex;

use super::{
    command::{Command, CommandStatus, TimerControl, TimerService},
    control_block::{KernelTimer, PrimitiveHandle},
    expiration::ExpiryHandler,
};
use crate::{config::TimerConfig, time::Ticks};

/// Number of primitive timers the service can hold
pub const MAX_PRIMITIVES: usize = 32;

/// Hard capacity of the command queue (the configured depth is clamped to it)
pub const MAX_QUEUED_COMMANDS: usize = 64;

struct Primitive<'a> {
    handle: PrimitiveHandle,
    period: Ticks,
    /// Absolute tick of the next expiration, None while dormant
    expires_at: Option<u64>,
    /// Arming generation of the last Start
    generation: u32,
    timer: &'a KernelTimer,
}

/// Expiration collected under the state lock: handle, generation, slot
type Due<'a> = (PrimitiveHandle, u32, &'a KernelTimer);

struct QueuedCommand {
    command: Command,
    posted_at: u64,
}

struct ServiceState<'a> {
    primitives: Vec<Primitive<'a>, MAX_PRIMITIVES>,
    queue: Deque<QueuedCommand, MAX_QUEUED_COMMANDS>,
    now: u64,
    next_handle: u32,
    fired: u64,
}

impl<'a> ServiceState<'a> {
    fn primitive_mut(&mut self, handle: PrimitiveHandle) -> Option<&mut Primitive<'a>> {
        self.primitives.iter_mut().find(|p| p.handle == handle)
    }

    fn apply(&mut self, command: Command, posted_at: u64) {
        if let Command::Delete(handle) = command {
            match self.primitives.iter().position(|p| p.handle == handle) {
                Some(index) => {
                    self.primitives.swap_remove(index);
                }
                None => log::debug!("Timer service: {} on unknown primitive", command),
            }
            return;
        }

        let Some(primitive) = self.primitive_mut(command.handle()) else {
            log::debug!("Timer service: {} on unknown primitive", command);
            return;
        };

        match command {
            Command::Start(_, generation) => {
                primitive.generation = generation;
                primitive.expires_at = Some(posted_at + primitive.period.get().max(1) as u64);
            }
            Command::Stop(_) => {
                primitive.expires_at = None;
            }
            Command::ChangePeriod(_, period) => {
                primitive.period = period;
                if primitive.expires_at.is_some() {
                    primitive.expires_at = Some(posted_at + period.get().max(1) as u64);
                }
            }
            Command::Delete(_) => {}
        }
    }

    fn drain(&mut self) {
        while let Some(queued) = self.queue.pop_front() {
            self.apply(queued.command, queued.posted_at);
        }
    }
}

/// Tick-driven timer-service task
pub struct SoftTimerService<'a> {
    state: Mutex<ServiceState<'a>>,
    config: TimerConfig,
}

impl<'a> SoftTimerService<'a> {
    pub const fn new(config: TimerConfig) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                primitives: Vec::new(),
                queue: Deque::new(),
                now: 0,
                next_handle: 1,
                fired: 0,
            }),
            config,
        }
    }

    fn queue_depth(&self) -> usize {
        self.config.command_queue_depth.clamp(1, MAX_QUEUED_COMMANDS)
    }

    /// Current tick of the service clock
    pub fn now(&self) -> u64 {
        self.state.lock().now
    }

    /// Total number of primitive expirations so far
    pub fn fired(&self) -> u64 {
        self.state.lock().fired
    }

    /// Commands waiting in the queue
    pub fn pending_commands(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Number of live primitives
    pub fn primitive_count(&self) -> usize {
        self.state.lock().primitives.len()
    }

    /// Whether `handle` names a live primitive
    pub fn exists(&self, handle: PrimitiveHandle) -> bool {
        self.state.lock().primitives.iter().any(|p| p.handle == handle)
    }

    /// Whether `handle` is armed
    pub fn is_armed(&self, handle: PrimitiveHandle) -> bool {
        self.expires_at(handle).is_some()
    }

    /// Absolute expiry tick of `handle`, None if dormant or unknown
    pub fn expires_at(&self, handle: PrimitiveHandle) -> Option<u64> {
        let state = self.state.lock();
        state
            .primitives
            .iter()
            .find(|p| p.handle == handle)
            .and_then(|p| p.expires_at)
    }

    /// Programmed period of `handle`
    pub fn period(&self, handle: PrimitiveHandle) -> Option<Ticks> {
        let state = self.state.lock();
        state
            .primitives
            .iter()
            .find(|p| p.handle == handle)
            .map(|p| p.period)
    }

    /// Let the service task process its queue without advancing time
    pub fn process_commands(&self) {
        self.state.lock().drain();
    }

    /// Run the service task for `ticks` ticks
    ///
    /// Each tick drains the command queue, then fires every due primitive on
    /// this (the service) context through `handler`. Returns the number of
    /// expirations.
    pub fn advance(&self, ticks: u32, handler: &dyn ExpiryHandler<'a>) -> usize {
        let mut total = 0;

        for _ in 0..ticks {
            let due = {
                let mut state = self.state.lock();
                state.now += 1;
                state.drain();

                let now = state.now;
                let mut due: Vec<Due<'a>, MAX_PRIMITIVES> = Vec::new();
                for primitive in state.primitives.iter_mut() {
                    if primitive.expires_at.is_some_and(|at| at <= now) {
                        primitive.expires_at = None;
                        // Capacity matches the primitive table, cannot overflow
                        let _ = due.push((primitive.handle, primitive.generation, primitive.timer));
                    }
                }
                state.fired += due.len() as u64;
                due
            };

            let direct = ServiceContext { service: self };
            for &(handle, generation, timer) in due.iter() {
                handler.on_expire(timer, handle, generation, &direct, &self.config);
            }
            total += due.len();
        }

        total
    }
}

impl TimerControl for SoftTimerService<'_> {
    fn post(&self, command: Command, _wait: Ticks) -> CommandStatus {
        let mut state = self.state.lock();
        if state.queue.len() >= self.queue_depth() {
            log::trace!("Timer service queue full, rejecting {}", command);
            return CommandStatus::Rejected;
        }

        let posted_at = state.now;
        match state.queue.push_back(QueuedCommand { command, posted_at }) {
            Ok(()) => CommandStatus::Accepted,
            Err(_) => CommandStatus::Rejected,
        }
    }

    fn backoff(&self, _ticks: Ticks) {
        self.process_commands();
    }
}

impl<'a> TimerService<'a> for SoftTimerService<'a> {
    fn create(&self, period: Ticks, timer: &'a KernelTimer) -> Option<PrimitiveHandle> {
        let mut state = self.state.lock();
        let handle = PrimitiveHandle(state.next_handle);
        state
            .primitives
            .push(Primitive {
                handle,
                period,
                expires_at: None,
                generation: 0,
                timer,
            })
            .ok()?;
        state.next_handle = state.next_handle.wrapping_add(1).max(1);

        log::debug!("Timer service: created primitive {} ({})", handle.0, period);
        Some(handle)
    }

    fn config(&self) -> &TimerConfig {
        &self.config
    }
}

/// Command handle used by callbacks running on the service task
///
/// Commands are applied on the spot at the current tick and never rejected.
struct ServiceContext<'s, 'a> {
    service: &'s SoftTimerService<'a>,
}

impl TimerControl for ServiceContext<'_, '_> {
    fn post(&self, command: Command, _wait: Ticks) -> CommandStatus {
        let mut state = self.service.state.lock();
        let now = state.now;
        state.apply(command, now);
        CommandStatus::Accepted
    }

    fn backoff(&self, _ticks: Ticks) {}
}
