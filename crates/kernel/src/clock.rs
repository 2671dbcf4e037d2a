use std::cell::Cell;
use std::time::Instant;

/// Source of elapsed time for the frame loop.
///
/// Readings are seconds since the source was constructed. Successive calls
/// never return a smaller value.
pub trait ClockSource {
    fn elapsed(&self) -> f64;
}

/// Wall-clock source backed by a monotonic [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start counting from zero now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Used for headless runs and tests.
///
/// Interior mutability lets a frame loop hold `&ManualClock` as a
/// [`ClockSource`] while a driver advances it between frames.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds. Negative or non-finite deltas are ignored.
    pub fn advance(&self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.now.set(self.now.get() + dt);
        }
    }

    /// Move forward to `t` if it lies in the future; earlier targets are ignored.
    pub fn advance_to(&self, t: f64) {
        if t.is_finite() && t > self.now.get() {
            self.now.set(t);
        }
    }
}

impl ClockSource for ManualClock {
    fn elapsed(&self) -> f64 {
        self.now.get()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    fn elapsed(&self) -> f64 {
        (**self).elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        let t = clock.elapsed();
        assert!(t >= 0.0);
        assert!(t < 1.0);
    }

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock::new();
        let mut last = clock.elapsed();
        for _ in 0..1000 {
            let now = clock.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().elapsed(), 0.0);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 0.75);
    }

    #[test]
    fn manual_clock_ignores_backwards_moves() {
        let clock = ManualClock::new();
        clock.advance_to(2.0);
        clock.advance_to(1.0);
        clock.advance(-3.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.elapsed(), 2.0);
    }

    #[test]
    fn clock_reference_is_a_source() {
        fn read(c: impl ClockSource) -> f64 {
            c.elapsed()
        }
        let clock = ManualClock::new();
        clock.advance(1.5);
        assert_eq!(read(&clock), 1.5);
    }
}
