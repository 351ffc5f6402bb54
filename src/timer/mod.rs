/*
 * POSIX Interval Timers
 *
 * A POSIX timer is a KernelTimer slot (the control block) bound to one
 * single-shot primitive owned by the timer-service task.
 *
 *   application task                    timer-service task
 *   ----------------                    ------------------
 *   timer_settime ── Stop/ChangePeriod/Start ──> primitive
 *                                                    │ fires
 *                                       expiration::on_expire
 *                                         ├─ flip phase, re-arm
 *                                         └─ fanout::notify
 *
 * Modules:
 * - `control_block`: the slot, clock ids, notification variants, phase
 * - `command`: the four service commands and the retry-until-accepted protocol
 * - `expiration`: the value/interval state machine run on each firing
 * - `fanout`: signal delivery to every thread of the owner process
 * - `soft_service`: tick-driven timer-service task
 * - `api`: timer_create/delete/settime/gettime/getoverrun
 */

pub mod api;
pub mod command;
pub mod control_block;
pub mod error;
pub mod expiration;
pub mod fanout;
pub mod soft_service;

pub use api::{timer_create, timer_delete, timer_getoverrun, timer_gettime, timer_settime};
pub use command::{Command, CommandProtocol, CommandStatus, TimerControl, TimerService};
pub use control_block::{
    ArmFlags, ClockId, ControlBlock, KernelTimer, Lifecycle, Notification, Phase, PrimitiveHandle,
};
pub use error::TimerError;
pub use expiration::{Expiration, ExpiryHandler, ExpiryRouter, Reprogram, Transition};
pub use fanout::{Delivery, fan_out};
pub use soft_service::SoftTimerService;
