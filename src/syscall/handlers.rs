/*
 * Timer Syscall Handlers
 *
 * Each handler:
 * - Rejects a NULL timer slot or argument struct with -EINVAL
 * - Decodes raw clock ids, sigevent fields and flags
 * - Calls the timer operation and returns 0 (or a count) or -errno
 */

use super::numbers::*;
use crate::{
    scheduler::{ProcessId, Signal},
    time::ITimerSpec,
    timer::{
        ArmFlags, ClockId, KernelTimer, Notification, TimerError, TimerService, timer_delete,
        timer_getoverrun, timer_gettime, timer_settime,
    },
};

/// User-visible `struct sigevent`
#[derive(Debug, Copy, Clone)]
pub struct SigEvent {
    /// SIGEV_SIGNAL, SIGEV_NONE or SIGEV_THREAD
    pub sigev_notify: i32,
    pub sigev_signo: i32,
    /// Function run by SIGEV_THREAD, on the timer-service task
    pub sigev_notify_function: Option<fn(Signal)>,
}

impl SigEvent {
    /// Signal delivery to the calling process
    pub const fn signal(signo: i32) -> Self {
        Self {
            sigev_notify: SIGEV_SIGNAL,
            sigev_signo: signo,
            sigev_notify_function: None,
        }
    }

    /// No notification at all
    pub const fn none() -> Self {
        Self {
            sigev_notify: SIGEV_NONE,
            sigev_signo: 0,
            sigev_notify_function: None,
        }
    }

    /// Decode into a notification owned by `caller`
    ///
    /// SIGEV_NONE ignores the signal number.
    fn to_notification(&self, caller: Option<ProcessId>) -> Result<Notification, TimerError> {
        if self.sigev_notify == SIGEV_NONE {
            return Ok(Notification::None);
        }

        let signo = Signal::new(self.sigev_signo).ok_or(TimerError::InvalidArgument)?;
        match self.sigev_notify {
            SIGEV_SIGNAL => Ok(Notification::ThreadGroup { signo, owner: caller }),
            SIGEV_THREAD => match self.sigev_notify_function {
                Some(notify) => Ok(Notification::Callback { signo, notify }),
                None => Err(TimerError::InvalidArgument),
            },
            _ => Err(TimerError::InvalidArgument),
        }
    }
}

/// Fold a timer result into the syscall return convention
fn syscall_result(result: Result<isize, TimerError>) -> isize {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Timer syscall failed: {}", e);
            -e.errno()
        }
    }
}

fn create(
    clock_raw: i32,
    sevp: Option<&SigEvent>,
    caller: Option<ProcessId>,
    slot: Option<&KernelTimer>,
) -> Result<isize, TimerError> {
    let slot = slot.ok_or(TimerError::InvalidArgument)?;
    let clock = ClockId::from_raw(clock_raw).ok_or(TimerError::InvalidArgument)?;

    let notification = match sevp {
        Some(sev) => sev.to_notification(caller)?,
        None => Notification::ThreadGroup {
            signo: Signal::SIGALRM,
            owner: caller,
        },
    };

    slot.init(clock, notification)?;
    log::info!("timer_create: clock {:?}, {:?}", clock, notification);
    Ok(0)
}

/// timer_create: initialize `slot` for a new timer
///
/// A missing sigevent means SIGALRM to the calling process.
pub fn sys_timer_create(
    clock_raw: i32,
    sevp: Option<&SigEvent>,
    caller: Option<ProcessId>,
    slot: Option<&KernelTimer>,
) -> isize {
    syscall_result(create(clock_raw, sevp, caller, slot))
}

fn delete<'a, S>(slot: Option<&KernelTimer>, service: &S) -> Result<isize, TimerError>
where
    S: TimerService<'a> + ?Sized,
{
    let slot = slot.ok_or(TimerError::InvalidArgument)?;
    timer_delete(slot, service)?;
    Ok(0)
}

/// timer_delete
pub fn sys_timer_delete<'a, S>(slot: Option<&KernelTimer>, service: &S) -> isize
where
    S: TimerService<'a> + ?Sized,
{
    syscall_result(delete(slot, service))
}

fn settime<'a, S>(
    slot: Option<&'a KernelTimer>,
    flags_raw: i32,
    new: Option<&ITimerSpec>,
    old: Option<&mut ITimerSpec>,
    service: &S,
) -> Result<isize, TimerError>
where
    S: TimerService<'a> + ?Sized,
{
    let slot = slot.ok_or(TimerError::InvalidArgument)?;
    let new = new.ok_or(TimerError::InvalidArgument)?;
    timer_settime(slot, ArmFlags::from_bits_retain(flags_raw), new, old, service)?;
    Ok(0)
}

/// timer_settime
pub fn sys_timer_settime<'a, S>(
    slot: Option<&'a KernelTimer>,
    flags_raw: i32,
    new: Option<&ITimerSpec>,
    old: Option<&mut ITimerSpec>,
    service: &S,
) -> isize
where
    S: TimerService<'a> + ?Sized,
{
    syscall_result(settime(slot, flags_raw, new, old, service))
}

fn gettime(slot: Option<&KernelTimer>, curr: Option<&mut ITimerSpec>) -> Result<isize, TimerError> {
    let slot = slot.ok_or(TimerError::InvalidArgument)?;
    let curr = curr.ok_or(TimerError::InvalidArgument)?;
    *curr = timer_gettime(slot)?;
    Ok(0)
}

/// timer_gettime
pub fn sys_timer_gettime(slot: Option<&KernelTimer>, curr: Option<&mut ITimerSpec>) -> isize {
    syscall_result(gettime(slot, curr))
}

/// timer_getoverrun
pub fn sys_timer_getoverrun(slot: Option<&KernelTimer>) -> isize {
    match slot {
        Some(slot) => timer_getoverrun(slot) as isize,
        None => -EINVAL,
    }
}
