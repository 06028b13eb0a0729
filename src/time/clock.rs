use std::time::{SystemTime, UNIX_EPOCH};

const MICROS_PER_SEC: i64 = 1_000_000;

/// A wall-clock instant as carried on the wire: whole seconds plus
/// microseconds within the second, both unsigned 32-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallTime {
    /// Seconds since the Unix epoch
    pub seconds: u32,
    /// Microseconds within the current second (< 1_000_000)
    pub micros: u32,
}

impl WallTime {
    /// Creates a wall-clock instant, normalizing microsecond overflow.
    ///
    /// Both fields arrive from the wire unchecked, so the carry is done in
    /// 64 bits and instants past the representable range saturate to
    /// `u32::MAX` seconds rather than wrapping.
    pub fn new(seconds: u32, micros: u32) -> Self {
        let seconds = seconds as u64 + (micros / MICROS_PER_SEC as u32) as u64;
        WallTime {
            seconds: seconds.min(u32::MAX as u64) as u32,
            micros: micros % MICROS_PER_SEC as u32,
        }
    }

    /// Packs this instant into signed microseconds since the epoch.
    ///
    /// Signed so that offset and delay arithmetic can go negative.
    pub fn as_micros(self) -> i64 {
        self.seconds as i64 * MICROS_PER_SEC + self.micros as i64
    }

    /// Unpacks microseconds since the epoch; instants outside the
    /// representable range saturate since the wire format cannot carry them.
    pub fn from_micros(micros: i64) -> Self {
        let micros = micros.max(0);
        WallTime {
            seconds: (micros / MICROS_PER_SEC).min(u32::MAX as i64) as u32,
            micros: (micros % MICROS_PER_SEC) as u32,
        }
    }
}

/// Host clock primitives consumed by the protocol core.
///
/// `set` is assumed effectively atomic relative to `now` sampling around it.
pub trait Clock {
    /// Reads the current wall-clock time
    fn now(&self) -> WallTime;

    /// Sets the wall-clock time
    fn set(&mut self, time: WallTime);
}

/// System clock with a software adjustment layer.
///
/// `set` records a signed microsecond offset against the OS clock instead of
/// writing the OS clock itself, so no privileges are required; `now` folds
/// the offset back in.
#[derive(Debug, Default)]
pub struct SystemClock {
    adjustment_micros: i64,
}

impl SystemClock {
    /// Creates a system clock with no adjustment applied
    pub fn new() -> Self {
        SystemClock::default()
    }

    /// Returns the current adjustment relative to the OS clock, in microseconds
    pub fn adjustment_micros(&self) -> i64 {
        self.adjustment_micros
    }

    fn os_micros() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        WallTime::from_micros(Self::os_micros() + self.adjustment_micros)
    }

    fn set(&mut self, time: WallTime) {
        self.adjustment_micros = time.as_micros() - Self::os_micros();
    }
}

/// A clock that only moves when told to; used in tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    current: WallTime,
}

impl ManualClock {
    /// Creates a manual clock starting at the given instant
    pub fn starting_at(time: WallTime) -> Self {
        ManualClock { current: time }
    }

    /// Advances the clock by the given number of microseconds
    pub fn advance_micros(&mut self, micros: i64) {
        self.current = WallTime::from_micros(self.current.as_micros() + micros);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> WallTime {
        self.current
    }

    fn set(&mut self, time: WallTime) {
        self.current = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let t = WallTime::new(1000, 250);
        assert_eq!(t.as_micros(), 1_000_000_250);
        assert_eq!(WallTime::from_micros(1_000_000_250), t);
    }

    #[test]
    fn test_new_normalizes_micros() {
        let t = WallTime::new(10, 2_500_000);
        assert_eq!(t.seconds, 12);
        assert_eq!(t.micros, 500_000);
    }

    #[test]
    fn test_new_saturates_on_carry_overflow() {
        // Worst case the wire can carry; the micros carry must not wrap
        let t = WallTime::new(u32::MAX, u32::MAX);
        assert_eq!(t.seconds, u32::MAX);
        assert_eq!(t.micros, u32::MAX % 1_000_000);

        let t = WallTime::new(u32::MAX, 1_000_000);
        assert_eq!(t.seconds, u32::MAX);
        assert_eq!(t.micros, 0);

        let t = WallTime::from_micros(i64::MAX);
        assert_eq!(t.seconds, u32::MAX);
    }

    #[test]
    fn test_from_micros_saturates_below_epoch() {
        let t = WallTime::from_micros(-42);
        assert_eq!(t, WallTime::new(0, 0));
    }

    #[test]
    fn test_system_clock_set_adjusts() {
        let mut clock = SystemClock::new();
        let before = clock.now();

        // Jump five seconds into the future
        clock.set(WallTime::from_micros(before.as_micros() + 5_000_000));
        let after = clock.now();

        let moved = after.as_micros() - before.as_micros();
        assert!(moved >= 5_000_000);
        assert!(moved < 6_000_000, "adjustment drifted too far: {moved}");
        assert!(clock.adjustment_micros() > 4_000_000);
    }

    #[test]
    fn test_manual_clock() {
        let mut clock = ManualClock::starting_at(WallTime::new(100, 0));
        clock.advance_micros(1500);
        assert_eq!(clock.now(), WallTime::new(100, 1500));

        clock.set(WallTime::new(50, 0));
        assert_eq!(clock.now(), WallTime::new(50, 0));
    }
}
