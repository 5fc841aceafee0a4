use std::{io, mem};

use crate::error::{Error, Result};

/// A point in time as reported by a `Clock`, split like a `timespec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: i64,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: i64) -> Timestamp {
        Timestamp { secs, nanos }
    }

    /// Seconds from `earlier` to `self`. Negative if the clock went backwards.
    pub fn seconds_since(&self, earlier: &Timestamp) -> f64 {
        (self.secs - earlier.secs) as f64 + 1e-9 * (self.nanos - earlier.nanos) as f64
    }
}

pub trait Clock {
    fn now(&self) -> Result<Timestamp>;
}

/// `CLOCK_MONOTONIC`, read through `clock_gettime(2)`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<Timestamp> {
        let mut ts: libc::timespec = unsafe { mem::zeroed() };
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if rc != 0 {
            return Err(Error::Clock(io::Error::last_os_error()));
        }
        Ok(Timestamp::new(ts.tv_sec as i64, ts.tv_nsec as i64))
    }
}

/// Measures the wall time between successive calls to `elapsed`.
#[derive(Debug)]
pub struct IntervalTimer<C = SystemClock> {
    clock: C,
    last: Timestamp,
}

impl<C: Clock> IntervalTimer<C> {
    /// Starts the timer; the first `elapsed` is measured from here.
    pub fn new(clock: C) -> Result<IntervalTimer<C>> {
        let last = clock.now()?;
        Ok(IntervalTimer { clock, last })
    }

    /// Seconds since the previous call (or construction), then resets the baseline.
    pub fn elapsed(&mut self) -> Result<f64> {
        let now = self.clock.now()?;
        let seconds = now.seconds_since(&self.last);
        self.last = now;
        Ok(seconds)
    }
}


#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::mock::MockClock;
    use super::*;

    #[test]
    fn measures_a_real_sleep() {
        let mut timer = IntervalTimer::new(SystemClock).unwrap();
        thread::sleep(Duration::from_millis(250));
        let elapsed = timer.elapsed().unwrap();
        assert!(elapsed >= 0.25 && elapsed < 0.5, "elapsed = {}", elapsed);
    }

    #[test]
    fn each_call_resets_the_baseline() {
        let mut timer = IntervalTimer::new(MockClock::seconds(&[10.0, 10.5, 12.0])).unwrap();
        assert!((timer.elapsed().unwrap() - 0.5).abs() < 1e-9);
        assert!((timer.elapsed().unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn borrows_across_the_second_boundary() {
        let earlier = Timestamp::new(5, 900_000_000);
        let later = Timestamp::new(6, 100_000_000);
        assert!((later.seconds_since(&earlier) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn backwards_clock_is_passed_through() {
        let mut timer = IntervalTimer::new(MockClock::seconds(&[3.0, 2.0])).unwrap();
        assert!((timer.elapsed().unwrap() + 1.0).abs() < 1e-9);
    }
}
