use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, Result};

/// cpu  3357 0 4313 1362393 ...
///   The amount of time, measured in units of USER_HZ, that the system spent in
///   various states. Only the first seven columns are read:
///
///   user    (1) Time spent in user mode.
///   nice    (2) Time spent in user mode with low priority (nice).
///   system  (3) Time spent in system mode.
///   idle    (4) Time spent in the idle task.
///   iowait  (5) Time waiting for I/O to complete.
///   irq     (6) Time servicing interrupts.
///   softirq (7) Time servicing softirqs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jiffies {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

const LABEL: &str = "cpu";

impl Jiffies {
    /// Reads the aggregate `cpu` line, which the kernel always puts first. `path` is
    /// only used to report read errors.
    pub fn read<R: BufRead>(reader: R, path: &Path) -> Result<Jiffies> {
        let line = match reader.lines().next() {
            Some(line) => line.map_err(|e| Error::unavailable(path, e))?,
            None => return Err(Error::parse("/proc/stat", "Can't find cpu line")),
        };
        Jiffies::from_line(&line)
    }

    pub fn from_line(line: &str) -> Result<Jiffies> {
        let mut tok = line.split_whitespace();
        if tok.next() != Some(LABEL) {
            return Err(Error::parse("/proc/stat", "Can't find cpu line"));
        }

        let mut parse = |field: &str| -> Result<u64> {
            let s = tok
                .next()
                .ok_or_else(|| Error::parse("/proc/stat", format!("missing {} field", field)))?;
            s.parse()
                .map_err(|_| Error::parse("/proc/stat", format!("bad {} field {:?}", field, s)))
        };

        Ok(Jiffies {
            user: parse("user")?,
            nice: parse("nice")?,
            system: parse("system")?,
            idle: parse("idle")?,
            iowait: parse("iowait")?,
            irq: parse("irq")?,
            softirq: parse("softirq")?,
        })
    }

    pub fn work(&self) -> u64 { self.user + self.nice + self.system }
    pub fn total(&self) -> u64 {
        self.work() + self.idle + self.iowait + self.irq + self.softirq
    }
}

/// Turns the cumulative jiffie counters into a utilization percentage.
#[derive(Debug, Default)]
pub struct CpuCounter {
    work: u64,
    total: u64,
}

impl CpuCounter {
    /// Percentage of the jiffies since the last update that were spent working.
    ///
    /// The very first update is measured against zero and is meaningless. When no
    /// jiffies passed the result is NaN, and counters that go backwards give a
    /// negative or otherwise odd value; neither is corrected here.
    pub fn update(&mut self, now: &Jiffies) -> f32 {
        let work = now.work();
        let total = now.total();
        let d_work = work.wrapping_sub(self.work) as i64;
        let d_total = total.wrapping_sub(self.total) as i64;
        self.work = work;
        self.total = total;
        100.0 * d_work as f32 / d_total as f32
    }
}
