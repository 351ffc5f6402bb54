/*
 * Timer-Service Command Protocol
 *
 * The scheduler's software timers are owned by the timer-service task. Other
 * tasks control a primitive timer by posting one of four commands to that
 * task's queue:
 *
 *   Start(generation), Stop, ChangePeriod(ticks), Delete
 *
 * A post is answered immediately with Accepted or Rejected (queue full).
 * Start carries the arming generation of the control block; the service hands
 * it back on firing so an expiration from an older arming can be told apart.
 *
 * RETRY CONTRACT:
 * ===============
 *
 * A rejected command is retried after a short fixed wait until the service
 * accepts it. A stop/delete/change-period that silently fails would leave an
 * armed primitive firing for a timer its owner believes is disarmed, so the
 * default policy never gives up. The price is that a caller can block for as
 * long as the service task is starved. RetryPolicy::Bounded turns that into
 * an error after a fixed number of attempts; RetryPolicy::Unbounded logs a
 * warning every `warn_every` attempts instead of spinning silently.
 */

use core::fmt;

use super::control_block::{KernelTimer, PrimitiveHandle};
use super::error::TimerError;
use crate::config::{RetryPolicy, TimerConfig};
use crate::time::Ticks;

/// Command understood by the timer-service task
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Arm the primitive for its current period, counted from the post time,
    /// on behalf of the given arming generation
    Start(PrimitiveHandle, u32),
    /// Disarm the primitive
    Stop(PrimitiveHandle),
    /// Program a new period
    ChangePeriod(PrimitiveHandle, Ticks),
    /// Release the primitive
    Delete(PrimitiveHandle),
}

impl Command {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start(..) => "Start",
            Command::Stop(_) => "Stop",
            Command::ChangePeriod(..) => "ChangePeriod",
            Command::Delete(_) => "Delete",
        }
    }

    /// Primitive the command applies to
    pub fn handle(&self) -> PrimitiveHandle {
        match self {
            Command::Stop(h) | Command::Delete(h) => *h,
            Command::Start(h, _) | Command::ChangePeriod(h, _) => *h,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ChangePeriod(h, ticks) => write!(f, "ChangePeriod({}, {})", h.0, ticks),
            Command::Start(h, generation) => write!(f, "Start({}, gen {})", h.0, generation),
            other => write!(f, "{}({})", other.name(), other.handle().0),
        }
    }
}

/// Answer of the timer-service task to a posted command
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Accepted,
    /// Queue momentarily full
    Rejected,
}

/// Command channel to the timer-service task
///
/// Implemented by the service's queue for ordinary tasks, and by a direct
/// handle for code already running on the service task (expiration
/// callbacks), which never rejects.
pub trait TimerControl {
    /// Post `command`, blocking up to `wait` for room in the queue
    fn post(&self, command: Command, wait: Ticks) -> CommandStatus;

    /// Wait between two attempts of a rejected command
    fn backoff(&self, ticks: Ticks);
}

/// Full timer-service interface seen by the timer API
pub trait TimerService<'a>: TimerControl {
    /// Create a dormant primitive with `period`, bound to `timer`
    ///
    /// The expiration callback receives `timer` back. Returns None when the
    /// service has no free primitive.
    fn create(&self, period: Ticks, timer: &'a KernelTimer) -> Option<PrimitiveHandle>;

    /// Configuration the service was started with
    fn config(&self) -> &TimerConfig;
}

/// Retry-until-accepted wrapper around a TimerControl
pub struct CommandProtocol<'c, C: TimerControl + ?Sized> {
    control: &'c C,
    config: &'c TimerConfig,
}

impl<'c, C: TimerControl + ?Sized> CommandProtocol<'c, C> {
    pub fn new(control: &'c C, config: &'c TimerConfig) -> Self {
        Self { control, config }
    }

    /// Post `command` until the service accepts it
    ///
    /// Only fails under RetryPolicy::Bounded.
    pub fn issue(&self, command: Command) -> Result<(), TimerError> {
        let wait = Ticks(self.config.command_wait_ticks);
        let mut rejected: u32 = 0;

        loop {
            match self.control.post(command, wait) {
                CommandStatus::Accepted => {
                    if rejected > 0 {
                        log::debug!("{} accepted after {} rejected attempts", command, rejected);
                    }
                    return Ok(());
                }
                CommandStatus::Rejected => {
                    rejected = rejected.saturating_add(1);

                    match self.config.retry_policy {
                        RetryPolicy::Bounded { max_attempts }
                            if rejected >= max_attempts.max(1) =>
                        {
                            log::error!(
                                "Timer service rejected {} {} times, giving up",
                                command,
                                rejected
                            );
                            return Err(TimerError::ServiceBusy);
                        }
                        RetryPolicy::Unbounded
                            if self.config.warn_every != 0
                                && rejected % self.config.warn_every == 0 =>
                        {
                            log::warn!(
                                "Timer service still rejecting {} after {} attempts",
                                command,
                                rejected
                            );
                        }
                        _ => {}
                    }

                    self.control.backoff(Ticks(self.config.retry_backoff_ticks));
                }
            }
        }
    }

    pub fn start(&self, handle: PrimitiveHandle, generation: u32) -> Result<(), TimerError> {
        self.issue(Command::Start(handle, generation))
    }

    pub fn stop(&self, handle: PrimitiveHandle) -> Result<(), TimerError> {
        self.issue(Command::Stop(handle))
    }

    pub fn change_period(&self, handle: PrimitiveHandle, period: Ticks) -> Result<(), TimerError> {
        self.issue(Command::ChangePeriod(handle, period))
    }

    pub fn delete(&self, handle: PrimitiveHandle) -> Result<(), TimerError> {
        self.issue(Command::Delete(handle))
    }

    /// Stop, program `period`, start again within the same arming
    pub fn restart_with(
        &self,
        handle: PrimitiveHandle,
        period: Ticks,
        generation: u32,
    ) -> Result<(), TimerError> {
        self.stop(handle)?;
        self.change_period(handle, period)?;
        self.start(handle, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};

    /// Rejects the first `reject` posts, then accepts everything
    struct FlakyQueue {
        reject: Cell<u32>,
        posted: RefCell<std::vec::Vec<Command>>,
        backoffs: Cell<u32>,
    }

    impl FlakyQueue {
        fn new(reject: u32) -> Self {
            Self {
                reject: Cell::new(reject),
                posted: RefCell::new(std::vec::Vec::new()),
                backoffs: Cell::new(0),
            }
        }
    }

    impl TimerControl for FlakyQueue {
        fn post(&self, command: Command, _wait: Ticks) -> CommandStatus {
            if self.reject.get() > 0 {
                self.reject.set(self.reject.get() - 1);
                return CommandStatus::Rejected;
            }
            self.posted.borrow_mut().push(command);
            CommandStatus::Accepted
        }

        fn backoff(&self, _ticks: Ticks) {
            self.backoffs.set(self.backoffs.get() + 1);
        }
    }

    #[test]
    fn test_unbounded_retry_eventually_succeeds() {
        let queue = FlakyQueue::new(200);
        let config = TimerConfig::default();
        let protocol = CommandProtocol::new(&queue, &config);

        assert_eq!(protocol.stop(PrimitiveHandle(7)), Ok(()));
        assert_eq!(queue.backoffs.get(), 200);
        assert_eq!(queue.posted.borrow().as_slice(), &[Command::Stop(PrimitiveHandle(7))]);
    }

    #[test]
    fn test_bounded_retry_gives_up() {
        let queue = FlakyQueue::new(10);
        let config =
            TimerConfig::default().with_retry_policy(RetryPolicy::Bounded { max_attempts: 3 });
        let protocol = CommandProtocol::new(&queue, &config);

        assert_eq!(protocol.delete(PrimitiveHandle(1)), Err(TimerError::ServiceBusy));
        assert!(queue.posted.borrow().is_empty());
        // Two waits between three attempts
        assert_eq!(queue.backoffs.get(), 2);
    }

    #[test]
    fn test_display_names_generation() {
        let start = Command::Start(PrimitiveHandle(4), 9);
        assert_eq!(start.handle(), PrimitiveHandle(4));
        assert_eq!(std::format!("{}", start), "Start(4, gen 9)");
        assert_eq!(std::format!("{}", Command::Stop(PrimitiveHandle(4))), "Stop(4)");
    }

    #[test]
    fn test_restart_posts_in_order() {
        let queue = FlakyQueue::new(0);
        let config = TimerConfig::default();
        let protocol = CommandProtocol::new(&queue, &config);
        let h = PrimitiveHandle(3);

        protocol.restart_with(h, Ticks(5), 2).unwrap();
        assert_eq!(
            queue.posted.borrow().as_slice(),
            &[
                Command::Stop(h),
                Command::ChangePeriod(h, Ticks(5)),
                Command::Start(h, 2)
            ]
        );
    }
}
