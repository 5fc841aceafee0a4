use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::cpu::{CpuCounter, Jiffies};
use crate::error::{Error, Result};
use crate::net::{Bytes, NetCounter, Rates};
use crate::timer::{Clock, IntervalTimer, SystemClock};

/// An opened counter file. The path is kept for error reports.
pub struct Counters {
    pub path: PathBuf,
    pub reader: Box<dyn BufRead>,
}

/// Where the kernel counters come from.
pub trait Sources {
    fn stat(&self) -> Result<Counters>;
    fn temperature(&self) -> Result<Counters>;
    fn net_dev(&self) -> Result<Counters>;
}

/// The real pseudo-files under `/proc` and `/sys`.
#[derive(Debug, Clone)]
pub struct ProcFs {
    pub stat: PathBuf,
    pub temperature: PathBuf,
    pub net_dev: PathBuf,
}

impl Default for ProcFs {
    fn default() -> ProcFs {
        ProcFs {
            stat: PathBuf::from("/proc/stat"),
            temperature: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            net_dev: PathBuf::from("/proc/net/dev"),
        }
    }
}

fn open(path: &Path) -> Result<Counters> {
    let file = File::open(path).map_err(|e| Error::unavailable(path, e))?;
    Ok(Counters { path: path.to_owned(), reader: Box::new(BufReader::new(file)) })
}

impl Sources for ProcFs {
    fn stat(&self) -> Result<Counters> { open(&self.stat) }
    fn temperature(&self) -> Result<Counters> { open(&self.temperature) }
    fn net_dev(&self) -> Result<Counters> { open(&self.net_dev) }
}

/// One measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Percent of the elapsed jiffies spent working.
    pub cpu: f32,
    pub network: Rates,
}

/// Holds the counter state needed to turn kernel totals into rates.
pub struct Sampler<S = ProcFs, C = SystemClock> {
    sources: S,
    interface: String,
    cpu: CpuCounter,
    net: NetCounter,
    timer: IntervalTimer<C>,
}

impl<S: Sources, C: Clock> Sampler<S, C> {
    /// Creates a sampler and does the warm-up reads of the cpu and network counters.
    pub fn new(sources: S, clock: C, interface: &str) -> Result<Sampler<S, C>> {
        let mut sampler = Sampler {
            sources,
            interface: interface.to_owned(),
            cpu: CpuCounter::default(),
            net: NetCounter::default(),
            timer: IntervalTimer::new(clock)?,
        };
        sampler.cpu_usage()?;
        sampler.network_usage()?;
        Ok(sampler)
    }

    #[cfg(test)]
    pub fn sources(&self) -> &S {
        &self.sources
    }

    /// SoC temperature in degrees Celsius.
    pub fn temperature(&self) -> Result<f32> {
        let mut file = self.sources.temperature()?;
        let mut line = String::new();
        file.reader
            .read_line(&mut line)
            .map_err(|e| Error::unavailable(&file.path, e))?;
        let millidegrees: i32 = line
            .trim()
            .parse()
            .map_err(|_| Error::parse("temperature", format!("{:?}", line.trim())))?;
        Ok((millidegrees as f64 * 0.001) as f32)
    }

    pub fn cpu_usage(&mut self) -> Result<f32> {
        let file = self.sources.stat()?;
        let jiffies = Jiffies::read(file.reader, &file.path)?;
        Ok(self.cpu.update(&jiffies))
    }

    pub fn network_usage(&mut self) -> Result<Rates> {
        let seconds = self.timer.elapsed()?;
        let file = self.sources.net_dev()?;
        let bytes = Bytes::read(file.reader, &file.path, &self.interface)?;
        Ok(self.net.update(bytes, seconds))
    }

    pub fn sample(&mut self) -> Result<Sample> {
        let temperature = self.temperature()?;
        let cpu = self.cpu_usage()?;
        let network = self.network_usage()?;
        debug!(
            "temperature({}) cpu({}) rx({}) tx({})",
            temperature, cpu, network.received, network.sent
        );
        Ok(Sample { temperature, cpu, network })
    }
}
