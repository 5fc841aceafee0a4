use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, Result};

/// Cumulative byte counters of one interface, from `/proc/net/dev`:
///
/// ```text
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets ...
///   eth0: 2185323   15226    0    0    0     0          0         0   1207416    9420 ...
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bytes {
    pub received: u64,
    pub sent: u64,
}

/// Column of the transmitted bytes, counted after the interface name.
const SENT_COLUMN: usize = 8;

impl Bytes {
    /// Scans for the line of `interface`. Running out of lines is `Error::NotFound`;
    /// a failed read is `Error::Unavailable` for `path`.
    pub fn read<R: BufRead>(reader: R, path: &Path, interface: &str) -> Result<Bytes> {
        for line in reader.lines() {
            let line = line.map_err(|e| Error::unavailable(path, e))?;
            let (name, counters) = match line.split_once(':') {
                Some(split) => split,
                None => continue,
            };
            if name.trim() == interface {
                return Bytes::from_counters(counters);
            }
        }
        Err(Error::NotFound(format!("interface {} in {}", interface, path.display())))
    }

    fn from_counters(counters: &str) -> Result<Bytes> {
        let fields: Vec<&str> = counters.split_whitespace().collect();
        let field = |idx: usize, name: &str| -> Result<u64> {
            let s = fields
                .get(idx)
                .ok_or_else(|| Error::parse("/proc/net/dev", format!("missing {} field", name)))?;
            s.parse()
                .map_err(|_| Error::parse("/proc/net/dev", format!("bad {} field {:?}", name, s)))
        };
        Ok(Bytes {
            received: field(0, "receive bytes")?,
            sent: field(SENT_COLUMN, "transmit bytes")?,
        })
    }
}

/// Receive and send rates in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rates {
    pub received: f32,
    pub sent: f32,
}

/// Turns cumulative byte counters into rates.
#[derive(Debug, Default)]
pub struct NetCounter {
    last: Bytes,
}

impl NetCounter {
    /// Rates over `seconds` since the previous update. As with `CpuCounter`, the first
    /// update is a warm-up; a zero interval or a reset counter is passed through.
    pub fn update(&mut self, now: Bytes, seconds: f64) -> Rates {
        let rate = |new: u64, old: u64| (new.wrapping_sub(old) as i64 as f64 / seconds) as f32;
        let rates = Rates {
            received: rate(now.received, self.last.received),
            sent: rate(now.sent, self.last.sent),
        };
        self.last = now;
        rates
    }
}
