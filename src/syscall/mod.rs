/*
 * Timer System Calls
 *
 * Entry points the kernel's syscall dispatcher calls once it has validated
 * and translated the user pointers. A pointer that was NULL arrives here as
 * None.
 *
 * Each handler converts its raw arguments (clock ids, sigevent, flags) into
 * the timer layer's types, calls the matching timer operation and folds the
 * result into the dispatcher's return convention: 0 or a count on success,
 * a negated errno on failure.
 */

pub mod handlers;
pub mod numbers;

pub use handlers::{
    SigEvent, sys_timer_create, sys_timer_delete, sys_timer_getoverrun, sys_timer_gettime,
    sys_timer_settime,
};
