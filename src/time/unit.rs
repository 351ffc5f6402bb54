/*
 * Timespec / ITimerSpec and Tick Conversion
 *
 * POSIX expresses timer durations as seconds + nanoseconds. The timer-service
 * task only understands tick counts, so every duration goes through
 * milliseconds first:
 *
 *   ms    = sec * 1000 + nsec / 1_000_000     (sub-millisecond part dropped)
 *   ticks = ms / tick_period_ms               (sub-tick part dropped)
 *
 * Both steps truncate. Nothing is rounded up.
 */

use core::fmt;

/// Nanoseconds per second
pub const NSEC_PER_SEC: i64 = 1_000_000_000;

/// Nanoseconds per millisecond
pub const NSEC_PER_MSEC: i64 = 1_000_000;

/// Duration or timestamp with nanosecond fields
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespec {
    /// Seconds
    pub sec: i64,
    /// Nanoseconds, in `0..NSEC_PER_SEC` when valid
    pub nsec: i64,
}

impl Timespec {
    /// The zero duration ("disarm" when used as a timer value)
    pub const ZERO: Timespec = Timespec { sec: 0, nsec: 0 };

    pub const fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Duration from a millisecond count
    pub const fn from_millis(ms: u64) -> Self {
        Self {
            sec: (ms / 1000) as i64,
            nsec: ((ms % 1000) as i64) * NSEC_PER_MSEC,
        }
    }

    /// Whether both fields are zero
    pub const fn is_zero(&self) -> bool {
        self.sec == 0 && self.nsec == 0
    }

    /// Whether this is a well-formed relative duration
    pub const fn is_valid(&self) -> bool {
        self.sec >= 0 && self.nsec >= 0 && self.nsec < NSEC_PER_SEC
    }

    /// Whole milliseconds, truncating the sub-millisecond part
    ///
    /// Negative fields (only possible on an unvalidated value) count as zero.
    pub fn as_millis(&self) -> u64 {
        let sec = self.sec.max(0) as u64;
        let nsec = self.nsec.max(0) as u64;
        sec.saturating_mul(1000)
            .saturating_add(nsec / NSEC_PER_MSEC as u64)
    }

    /// Tick count for a service clock of `tick_period_ms` milliseconds
    pub fn to_ticks(&self, tick_period_ms: u64) -> Ticks {
        Ticks::from_millis(self.as_millis(), tick_period_ms)
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.sec, self.nsec)
    }
}

/// POSIX `itimerspec`: initial expiration plus recurring interval
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ITimerSpec {
    /// Recurring interval after the first expiration (zero = one-shot)
    pub interval: Timespec,
    /// Time until the first expiration, relative to arming (zero = disarm)
    pub value: Timespec,
}

impl ITimerSpec {
    pub const ZERO: ITimerSpec = ITimerSpec {
        interval: Timespec::ZERO,
        value: Timespec::ZERO,
    };

    pub const fn new(value: Timespec, interval: Timespec) -> Self {
        Self { interval, value }
    }

    /// Convenience constructor from millisecond counts
    pub const fn from_millis(value_ms: u64, interval_ms: u64) -> Self {
        Self {
            interval: Timespec::from_millis(interval_ms),
            value: Timespec::from_millis(value_ms),
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.interval.is_valid() && self.value.is_valid()
    }

    /// A zero interval means the timer never re-arms after its first expiration
    pub const fn is_one_shot(&self) -> bool {
        self.interval.is_zero()
    }
}

/// Tick count of the timer-service clock
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticks(pub u32);

impl Ticks {
    /// Convert milliseconds to ticks, truncating and saturating at `u32::MAX`
    pub fn from_millis(ms: u64, tick_period_ms: u64) -> Self {
        let period = tick_period_ms.max(1);
        Ticks(u32::try_from(ms / period).unwrap_or(u32::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ticks", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_millisecond_part_is_dropped() {
        let ts = Timespec::new(1, 999_999);
        assert_eq!(ts.as_millis(), 1000);

        let ts = Timespec::new(0, 2_500_000);
        assert_eq!(ts.as_millis(), 2);
    }

    #[test]
    fn test_ticks_truncate() {
        // 25ms on a 10ms tick is 2 ticks, not 3
        assert_eq!(Timespec::from_millis(25).to_ticks(10), Ticks(2));
        assert_eq!(Timespec::from_millis(9).to_ticks(10), Ticks(0));
        assert_eq!(Timespec::new(2, 0).to_ticks(10), Ticks(200));
    }

    #[test]
    fn test_validity() {
        assert!(Timespec::new(0, 999_999_999).is_valid());
        assert!(!Timespec::new(0, NSEC_PER_SEC).is_valid());
        assert!(!Timespec::new(-1, 0).is_valid());
        assert!(!Timespec::new(0, -1).is_valid());
    }

    #[test]
    fn test_huge_duration_saturates() {
        let ts = Timespec::new(i64::MAX, 0);
        assert_eq!(ts.to_ticks(1), Ticks(u32::MAX));
    }

    #[test]
    fn test_one_shot() {
        assert!(ITimerSpec::from_millis(200, 0).is_one_shot());
        assert!(!ITimerSpec::from_millis(100, 50).is_one_shot());
    }
}
