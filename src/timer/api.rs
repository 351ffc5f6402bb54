/*
 * POSIX Timer Operations
 *
 * timer_create, timer_delete, timer_settime, timer_gettime and
 * timer_getoverrun over a caller-owned KernelTimer slot and a timer-service
 * task.
 *
 * Every call that talks to the service goes through the command protocol,
 * with the control block unlocked. The block lock is only held for the plain
 * reads and writes in between.
 *
 * KNOWN GAPS:
 * ===========
 *
 * - The primitive timer cannot report time left, so the remaining value
 *   reported by timer_gettime and the old value of timer_settime are zero.
 * - Overruns are not counted; timer_getoverrun is always 0.
 * - Only relative arming. TIMER_ABSTIME is rejected.
 */

use super::{
    command::{CommandProtocol, TimerService},
    control_block::{ArmFlags, ClockId, KernelTimer, Lifecycle, Notification, Phase},
    error::TimerError,
};
use crate::time::{ITimerSpec, Timespec};

/// Create a timer in a fresh slot
pub fn timer_create(
    clock_id: ClockId,
    notification: Notification,
) -> Result<KernelTimer, TimerError> {
    let timer = KernelTimer::new();
    timer.init(clock_id, notification)?;
    log::info!("Timer created: clock {:?}, {:?}", clock_id, notification);
    Ok(timer)
}

/// Disarm the timer and release its primitive
///
/// Returns only once the service has accepted both the stop and the delete,
/// so no expiration can run against the slot afterwards.
pub fn timer_delete<'a, S>(timer: &KernelTimer, service: &S) -> Result<(), TimerError>
where
    S: TimerService<'a> + ?Sized,
{
    let handle = timer.lifecycle().handle().ok_or(TimerError::InvalidArgument)?;
    let protocol = CommandProtocol::new(service, service.config());

    protocol.stop(handle)?;
    protocol.delete(handle)?;

    let mut block = timer.lock();
    if block.lifecycle.handle() == Some(handle) {
        block.lifecycle = Lifecycle::NotCreated;
        block.phase = Phase::Value;
    }
    drop(block);

    log::info!("Timer {} deleted", handle.0);
    Ok(())
}

/// Arm (or disarm, with a zero value) the timer
///
/// The first successful call binds a primitive to the slot. Every call that
/// gets past argument checks starts a new arming generation, so expirations
/// of the previous arming still in flight are dropped. `old`, if given,
/// receives a zero itimerspec once the timer is armed; a failing call leaves
/// it untouched.
pub fn timer_settime<'a, S>(
    timer: &'a KernelTimer,
    flags: ArmFlags,
    new: &ITimerSpec,
    old: Option<&mut ITimerSpec>,
    service: &S,
) -> Result<(), TimerError>
where
    S: TimerService<'a> + ?Sized,
{
    if !flags.is_empty() {
        log::debug!("timer_settime: unsupported flags {:#x}", flags.bits());
        return Err(TimerError::InvalidArgument);
    }
    if !new.is_valid() {
        return Err(TimerError::InvalidArgument);
    }

    let config = service.config();
    let protocol = CommandProtocol::new(service, config);
    let period = new.value.to_ticks(config.tick_period_ms);

    let handle = match timer.lifecycle() {
        Lifecycle::Created { handle } => {
            protocol.stop(handle)?;
            handle
        }
        Lifecycle::NotCreated => service.create(period, timer).ok_or_else(|| {
            log::warn!("timer_settime: no primitive timer left");
            TimerError::NoPrimitive
        })?,
    };

    let generation = {
        let mut block = timer.lock();
        block.spec = *new;
        block.phase = Phase::Value;
        block.lifecycle = Lifecycle::Created { handle };
        block.generation = block.generation.wrapping_add(1);
        block.generation
    };

    protocol.change_period(handle, period)?;
    if !new.value.is_zero() {
        protocol.start(handle, generation)?;
    }

    if let Some(old) = old {
        *old = ITimerSpec::ZERO;
    }

    log::debug!(
        "Timer {} armed (gen {}): value {}, interval {}",
        handle.0,
        generation,
        new.value,
        new.interval
    );
    Ok(())
}

/// Current setting of the timer
///
/// Remaining time is not available and reads as zero; the interval is the
/// programmed one.
pub fn timer_gettime(timer: &KernelTimer) -> Result<ITimerSpec, TimerError> {
    let block = timer.snapshot();
    match block.lifecycle {
        Lifecycle::NotCreated => Err(TimerError::InvalidArgument),
        Lifecycle::Created { .. } => Ok(ITimerSpec::new(Timespec::ZERO, block.spec.interval)),
    }
}

/// Overrun count of the last expiration
pub fn timer_getoverrun(_timer: &KernelTimer) -> i32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{RetryPolicy, TimerConfig},
        scheduler::Signal,
        time::Ticks,
        timer::{
            command::{Command, CommandStatus, TimerControl},
            control_block::PrimitiveHandle,
        },
    };
    use core::cell::{Cell, RefCell};

    /// Service double recording every command and rejecting on demand
    struct Recording {
        config: TimerConfig,
        posted: RefCell<std::vec::Vec<Command>>,
        reject_all: Cell<bool>,
        capacity: Cell<u32>,
    }

    impl Recording {
        fn new(config: TimerConfig) -> Self {
            Self {
                config,
                posted: RefCell::new(std::vec::Vec::new()),
                reject_all: Cell::new(false),
                capacity: Cell::new(8),
            }
        }
    }

    impl TimerControl for Recording {
        fn post(&self, command: Command, _wait: Ticks) -> CommandStatus {
            if self.reject_all.get() {
                return CommandStatus::Rejected;
            }
            self.posted.borrow_mut().push(command);
            CommandStatus::Accepted
        }

        fn backoff(&self, _ticks: Ticks) {}
    }

    fn arm(
        timer: &KernelTimer,
        value_ms: u64,
        interval_ms: u64,
        service: &Recording,
    ) -> Result<(), TimerError> {
        let spec = ITimerSpec::from_millis(value_ms, interval_ms);
        timer_settime(timer, ArmFlags::empty(), &spec, None, service)
    }

    impl<'a> TimerService<'a> for Recording {
        fn create(&self, _period: Ticks, _timer: &'a KernelTimer) -> Option<PrimitiveHandle> {
            let left = self.capacity.get();
            if left == 0 {
                return None;
            }
            self.capacity.set(left - 1);
            Some(PrimitiveHandle(100 + left))
        }

        fn config(&self) -> &TimerConfig {
            &self.config
        }
    }

    #[test]
    fn test_create_rejects_unsupported_clock() {
        assert_eq!(
            timer_create(ClockId::ThreadCpuTime, Notification::DEFAULT).err(),
            Some(TimerError::InvalidArgument)
        );
        let timer = timer_create(ClockId::Realtime, Notification::DEFAULT).unwrap();
        assert!(!timer.is_created());
        assert_eq!(timer.snapshot().notification.signal(), Some(Signal::SIGALRM));
    }

    #[test]
    fn test_first_settime_creates_and_starts() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        let mut old = ITimerSpec::from_millis(1, 1);

        timer_settime(
            &timer,
            ArmFlags::empty(),
            &ITimerSpec::from_millis(200, 0),
            Some(&mut old),
            &service,
        )
        .unwrap();

        let h = timer.lifecycle().handle().unwrap();
        assert_eq!(old, ITimerSpec::ZERO);
        assert_eq!(
            service.posted.borrow().as_slice(),
            &[Command::ChangePeriod(h, Ticks(20)), Command::Start(h, 1)]
        );
        assert_eq!(timer.snapshot().generation, 1);
    }

    #[test]
    fn test_rearm_stops_first_and_resets_phase() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        arm(&timer, 100, 50, &service).unwrap();
        timer.lock().phase = Phase::Interval;
        service.posted.borrow_mut().clear();

        arm(&timer, 30, 50, &service).unwrap();

        let h = timer.lifecycle().handle().unwrap();
        assert_eq!(timer.phase(), Phase::Value);
        assert_eq!(
            service.posted.borrow().as_slice(),
            &[Command::Stop(h), Command::ChangePeriod(h, Ticks(3)), Command::Start(h, 2)]
        );
    }

    #[test]
    fn test_zero_value_disarms_without_start() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        arm(&timer, 100, 0, &service).unwrap();
        service.posted.borrow_mut().clear();

        timer_settime(&timer, ArmFlags::empty(), &ITimerSpec::ZERO, None, &service).unwrap();

        let h = timer.lifecycle().handle().unwrap();
        assert_eq!(
            service.posted.borrow().as_slice(),
            &[Command::Stop(h), Command::ChangePeriod(h, Ticks(0))]
        );
        assert!(timer.is_created());
    }

    #[test]
    fn test_abstime_and_bad_timespec_leave_block_unchanged() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        let before = timer.snapshot();

        let spec = ITimerSpec::from_millis(10, 0);
        assert_eq!(
            timer_settime(&timer, ArmFlags::ABSTIME, &spec, None, &service),
            Err(TimerError::InvalidArgument)
        );
        assert_eq!(
            timer_settime(&timer, ArmFlags::from_bits_retain(0x40), &spec, None, &service),
            Err(TimerError::InvalidArgument)
        );
        let bad = ITimerSpec::new(Timespec::new(0, 1_000_000_000), Timespec::ZERO);
        assert_eq!(
            timer_settime(&timer, ArmFlags::empty(), &bad, None, &service),
            Err(TimerError::InvalidArgument)
        );

        let after = timer.snapshot();
        assert_eq!(after.lifecycle, before.lifecycle);
        assert_eq!(after.spec, before.spec);
        assert_eq!(after.generation, before.generation);
        assert!(service.posted.borrow().is_empty());
    }

    #[test]
    fn test_settime_without_primitive() {
        let service = Recording::new(TimerConfig::default());
        service.capacity.set(0);
        let timer = KernelTimer::new();
        let mut old = ITimerSpec::from_millis(7, 3);

        assert_eq!(
            timer_settime(
                &timer,
                ArmFlags::empty(),
                &ITimerSpec::from_millis(10, 0),
                Some(&mut old),
                &service
            ),
            Err(TimerError::NoPrimitive)
        );
        assert!(!timer.is_created());
        assert_eq!(old, ITimerSpec::from_millis(7, 3));
    }

    #[test]
    fn test_busy_service_leaves_old_value_untouched() {
        let config =
            TimerConfig::default().with_retry_policy(RetryPolicy::Bounded { max_attempts: 2 });
        let service = Recording::new(config);
        let timer = KernelTimer::new();
        arm(&timer, 10, 0, &service).unwrap();
        service.reject_all.set(true);

        let mut old = ITimerSpec::from_millis(7, 3);
        assert_eq!(
            timer_settime(
                &timer,
                ArmFlags::empty(),
                &ITimerSpec::from_millis(20, 0),
                Some(&mut old),
                &service
            ),
            Err(TimerError::ServiceBusy)
        );
        assert_eq!(old, ITimerSpec::from_millis(7, 3));
    }

    #[test]
    fn test_delete_requires_created_timer() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        assert_eq!(timer_delete(&timer, &service), Err(TimerError::InvalidArgument));
        assert!(service.posted.borrow().is_empty());
    }

    #[test]
    fn test_delete_stops_then_deletes() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        arm(&timer, 10, 10, &service).unwrap();
        let h = timer.lifecycle().handle().unwrap();
        service.posted.borrow_mut().clear();

        timer_delete(&timer, &service).unwrap();
        assert_eq!(service.posted.borrow().as_slice(), &[Command::Stop(h), Command::Delete(h)]);
        assert!(!timer.is_created());
        assert_eq!(timer_delete(&timer, &service), Err(TimerError::InvalidArgument));
    }

    #[test]
    fn test_delete_gives_up_under_bounded_policy() {
        let config =
            TimerConfig::default().with_retry_policy(RetryPolicy::Bounded { max_attempts: 4 });
        let service = Recording::new(config);
        let timer = KernelTimer::new();
        arm(&timer, 10, 0, &service).unwrap();

        service.reject_all.set(true);
        assert_eq!(timer_delete(&timer, &service), Err(TimerError::ServiceBusy));
        // Still bound to its primitive
        assert!(timer.is_created());
    }

    #[test]
    fn test_gettime_reports_interval_only() {
        let service = Recording::new(TimerConfig::default());
        let timer = KernelTimer::new();
        assert_eq!(timer_gettime(&timer), Err(TimerError::InvalidArgument));

        arm(&timer, 300, 75, &service).unwrap();
        assert_eq!(timer_gettime(&timer), Ok(ITimerSpec::from_millis(0, 75)));
        assert_eq!(timer_getoverrun(&timer), 0);
    }
}
