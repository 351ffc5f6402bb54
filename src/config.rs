/*
 * Timer Layer Configuration
 *
 * Compile-time defaults and the runtime knobs of the timer layer. There is no
 * configuration file: the kernel builds a TimerConfig at boot (usually the
 * default) and hands it to the timer-service task and the command protocol.
 *
 * The defaults follow the kernel tick: the PIT runs at 100Hz, so one tick is
 * 10 milliseconds.
 */

/// Milliseconds per scheduler tick (100Hz PIT)
pub const DEFAULT_TICK_PERIOD_MS: u64 = 10;

/// Block time passed along with every command posted to the service queue
pub const DEFAULT_COMMAND_WAIT_TICKS: u32 = 10;

/// Fixed wait between two attempts of a rejected command
pub const DEFAULT_RETRY_BACKOFF_TICKS: u32 = 1;

/// Emit a diagnostic every this many rejected attempts in unbounded mode
pub const DEFAULT_WARN_EVERY: u32 = 64;

/// Depth of the timer-service command queue
pub const DEFAULT_COMMAND_QUEUE_DEPTH: usize = 16;

/// What the command protocol does when the service keeps rejecting a command
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry until the service accepts the command. Never fails, may block
    /// for as long as the timer-service task is starved.
    Unbounded,

    /// Give up after `max_attempts` rejected attempts and report
    /// `TimerError::ServiceBusy`.
    Bounded { max_attempts: u32 },
}

/// Runtime configuration of the timer layer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// Milliseconds represented by one tick of the timer-service clock
    pub tick_period_ms: u64,

    /// Block time handed to the service with each posted command
    pub command_wait_ticks: u32,

    /// Wait between two attempts of a rejected command
    pub retry_backoff_ticks: u32,

    /// Behaviour when the command queue stays full
    pub retry_policy: RetryPolicy,

    /// Rejected attempts between two "service starved" warnings
    pub warn_every: u32,

    /// Number of commands the service queue holds before rejecting
    pub command_queue_depth: usize,
}

impl TimerConfig {
    pub const fn new() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            command_wait_ticks: DEFAULT_COMMAND_WAIT_TICKS,
            retry_backoff_ticks: DEFAULT_RETRY_BACKOFF_TICKS,
            retry_policy: RetryPolicy::Unbounded,
            warn_every: DEFAULT_WARN_EVERY,
            command_queue_depth: DEFAULT_COMMAND_QUEUE_DEPTH,
        }
    }

    /// Same configuration with a different retry policy
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Same configuration with a different command queue depth
    pub const fn with_queue_depth(mut self, depth: usize) -> Self {
        self.command_queue_depth = depth;
        self
    }

    /// Same configuration with a different tick period (clamped to >= 1ms)
    pub const fn with_tick_period_ms(mut self, ms: u64) -> Self {
        self.tick_period_ms = if ms == 0 { 1 } else { ms };
        self
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new()
    }
}
