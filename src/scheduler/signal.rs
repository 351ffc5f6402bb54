/*
 * Signal Numbers and Signal Sets
 *
 * Signals are small integers (1..=31). A thread keeps its pending and awaited
 * signals as bit sets where bit N stands for signal N.
 */

use bitflags::bitflags;
use core::fmt;

/// Highest signal number the kernel supports
pub const MAX_SIGNAL: u8 = 31;

/// A validated signal number
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(u8);

impl Signal {
    pub const SIGHUP: Signal = Signal(1);
    pub const SIGINT: Signal = Signal(2);
    pub const SIGKILL: Signal = Signal(9);
    pub const SIGUSR1: Signal = Signal(10);
    pub const SIGUSR2: Signal = Signal(12);
    pub const SIGALRM: Signal = Signal(14);
    pub const SIGTERM: Signal = Signal(15);

    /// Validate a raw signal number
    pub const fn new(signo: i32) -> Option<Self> {
        if signo >= 1 && signo <= MAX_SIGNAL as i32 {
            Some(Signal(signo as u8))
        } else {
            None
        }
    }

    pub const fn number(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Signal::SIGHUP => write!(f, "SIGHUP"),
            Signal::SIGINT => write!(f, "SIGINT"),
            Signal::SIGKILL => write!(f, "SIGKILL"),
            Signal::SIGUSR1 => write!(f, "SIGUSR1"),
            Signal::SIGUSR2 => write!(f, "SIGUSR2"),
            Signal::SIGALRM => write!(f, "SIGALRM"),
            Signal::SIGTERM => write!(f, "SIGTERM"),
            Signal(n) => write!(f, "SIG{}", n),
        }
    }
}

bitflags! {
    /// Set of signals, bit N = signal N
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SigSet: u32 {
        const SIGHUP = 1 << 1;
        const SIGINT = 1 << 2;
        const SIGKILL = 1 << 9;
        const SIGUSR1 = 1 << 10;
        const SIGUSR2 = 1 << 12;
        const SIGALRM = 1 << 14;
        const SIGTERM = 1 << 15;
        // Numbers without a name are still representable
        const _ = !0;
    }
}

impl SigSet {
    /// Set holding a single signal
    pub const fn of(signal: Signal) -> Self {
        SigSet::from_bits_retain(1 << signal.0)
    }

    pub const fn has(&self, signal: Signal) -> bool {
        self.contains(SigSet::of(signal))
    }
}

bitflags! {
    /// Flags attached to a single signal delivery
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DeliveryFlags: u32 {
        /// The signal was generated by a timer expiration (si_code SI_TIMER)
        const TIMER = 1 << 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_range() {
        assert_eq!(Signal::new(14), Some(Signal::SIGALRM));
        assert_eq!(Signal::new(0), None);
        assert_eq!(Signal::new(32), None);
        assert_eq!(Signal::new(-3), None);
    }

    #[test]
    fn test_sigset_membership() {
        let set = SigSet::of(Signal::SIGALRM) | SigSet::SIGUSR1;
        assert!(set.has(Signal::SIGALRM));
        assert!(set.has(Signal::SIGUSR1));
        assert!(!set.has(Signal::SIGTERM));

        let rt = Signal::new(30).unwrap();
        assert!(SigSet::of(rt).has(rt));
    }
}
