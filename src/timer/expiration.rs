/*
 * Expiration State Machine
 *
 * Runs on the timer-service task each time a timer's primitive fires.
 *
 * The primitive is single-shot, so a POSIX timer with both a value and an
 * interval is emulated by reprogramming the one primitive from the expiration
 * path, alternating between the two durations. The phase recorded in the
 * control block says which duration the firing that just happened stood for.
 *
 * TRANSITIONS:
 * ============
 *
 *   phase     interval   ->  phase     reprogram   notify
 *   Value     non-zero       Interval  interval    yes
 *   Interval  non-zero       Value     value       no
 *   Value     zero           Value     -           yes
 *   Interval  zero           Value     -           yes
 *
 * The second row is why a (value, interval) timer reports every other
 * primitive firing. The last row cannot be reached through timer_settime,
 * which always resets the phase to Value.
 *
 * A firing is stale when its handle is no longer bound to the block, or when
 * it was started for an older arming generation (timer_settime ran while the
 * expiration was in flight). Stale firings leave the block untouched.
 *
 * Ordering: the block lock is released before reprogramming, and
 * reprogramming is finished before the notification enters the task table's
 * atomic region.
 */

use spin::Mutex;

use super::{
    command::{CommandProtocol, TimerControl},
    control_block::{KernelTimer, Phase, PrimitiveHandle},
    fanout::{self, Delivery},
};
use crate::{
    config::TimerConfig,
    scheduler::SignalTarget,
    time::{ITimerSpec, Ticks},
};

/// Which duration the primitive is reprogrammed with
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reprogram {
    Interval,
    Value,
}

impl Reprogram {
    /// Primitive period for this duration of `spec`
    pub fn period(self, spec: &ITimerSpec, tick_period_ms: u64) -> Ticks {
        match self {
            Reprogram::Interval => spec.interval.to_ticks(tick_period_ms),
            Reprogram::Value => spec.value.to_ticks(tick_period_ms),
        }
    }
}

/// Outcome of one primitive firing for the control block
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Phase,
    pub reprogram: Option<Reprogram>,
    pub notify: bool,
}

impl Phase {
    /// Transition taken when the primitive fires in this phase
    pub const fn on_fire(self, one_shot: bool) -> Transition {
        match (self, one_shot) {
            (Phase::Value, false) => Transition {
                next: Phase::Interval,
                reprogram: Some(Reprogram::Interval),
                notify: true,
            },
            (Phase::Interval, false) => Transition {
                next: Phase::Value,
                reprogram: Some(Reprogram::Value),
                notify: false,
            },
            (_, true) => Transition {
                next: Phase::Value,
                reprogram: None,
                notify: true,
            },
        }
    }
}

/// What an expiration did
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// The firing belongs to a primitive or an arming the timer has left
    Stale,
    Handled {
        transition: Transition,
        delivery: Delivery,
    },
}

/// Expiration callback convention of the timer-service task
///
/// `generation` is the arming generation the primitive was started for.
/// `control` is a direct handle onto the service, valid for commands issued
/// from inside the callback.
pub trait ExpiryHandler<'a> {
    fn on_expire(
        &self,
        timer: &'a KernelTimer,
        handle: PrimitiveHandle,
        generation: u32,
        control: &dyn TimerControl,
        config: &TimerConfig,
    );
}

/// Handle one firing of `handle`, started for arming `generation` of `timer`
pub fn on_expire<C, T>(
    timer: &KernelTimer,
    handle: PrimitiveHandle,
    generation: u32,
    control: &C,
    config: &TimerConfig,
    tasks: &Mutex<T>,
) -> Expiration
where
    C: TimerControl + ?Sized,
    T: SignalTarget + ?Sized,
{
    let (transition, period, notification) = {
        let mut block = timer.lock();

        if block.lifecycle.handle() != Some(handle) {
            log::debug!("Stale expiration of primitive {} ignored", handle.0);
            return Expiration::Stale;
        }
        if block.generation != generation {
            log::debug!(
                "Expiration of timer {} from arming {} ignored (now {})",
                handle.0,
                generation,
                block.generation
            );
            return Expiration::Stale;
        }

        let transition = block.phase.on_fire(block.spec.is_one_shot());
        block.phase = transition.next;

        let period = transition
            .reprogram
            .map(|which| which.period(&block.spec, config.tick_period_ms));

        (transition, period, block.notification)
    };

    log::debug!(
        "Timer {} expired: phase -> {:?}, notify: {}",
        handle.0,
        transition.next,
        transition.notify
    );

    if let Some(period) = period {
        let protocol = CommandProtocol::new(control, config);
        if let Err(e) = protocol.restart_with(handle, period, generation) {
            log::error!("Failed to re-arm timer {} for {}: {}", handle.0, period, e);
        }
    }

    let delivery = if transition.notify {
        fanout::notify(&notification, tasks)
    } else {
        Delivery::Nothing
    };

    Expiration::Handled {
        transition,
        delivery,
    }
}

/// Routes every expiration of the service to the state machine, delivering
/// thread-group signals through `tasks`
pub struct ExpiryRouter<'t, T: SignalTarget + ?Sized> {
    tasks: &'t Mutex<T>,
}

impl<'t, T: SignalTarget + ?Sized> ExpiryRouter<'t, T> {
    pub const fn new(tasks: &'t Mutex<T>) -> Self {
        Self { tasks }
    }
}

impl<'a, 't, T: SignalTarget + ?Sized> ExpiryHandler<'a> for ExpiryRouter<'t, T> {
    fn on_expire(
        &self,
        timer: &'a KernelTimer,
        handle: PrimitiveHandle,
        generation: u32,
        control: &dyn TimerControl,
        config: &TimerConfig,
    ) {
        on_expire(timer, handle, generation, control, config, self.tasks);
    }
}
