//! PiGlow: an SN3218 18-channel LED driver on the Raspberry Pi I2C bus.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::bar::{LedBoard, LEGS, SEGMENTS};
use crate::error::{Error, Result};

/// Bus nodes to try, newest board revisions first.
pub static BUSES: [&str; 2] = ["/dev/i2c-1", "/dev/i2c-0"];

const ADDRESS: libc::c_ulong = 0x54;
/// `I2C_SLAVE` from `<linux/i2c-dev.h>`.
const I2C_SLAVE: libc::c_ulong = 0x0703;

const REG_ENABLE: u8 = 0x00;
const REG_PWM: u8 = 0x01;
const REG_LED_CONTROL: u8 = 0x13;
const REG_UPDATE: u8 = 0x16;

/// PWM channel of each segment, per leg.
const CHANNELS: [[u8; SEGMENTS]; LEGS] = [
    [6, 7, 8, 5, 4, 9],
    [17, 16, 15, 13, 11, 10],
    [0, 1, 2, 3, 14, 12],
];

/// Writes register/value sequences to the driver chip.
pub trait Bus {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// A character device from `i2c-dev`, bound to the PiGlow's address.
pub struct I2cDevice {
    file: File,
}

impl I2cDevice {
    pub fn open(path: &Path) -> io::Result<I2cDevice> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        if unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, ADDRESS) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(I2cDevice { file })
    }
}

impl Bus for I2cDevice {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)
    }
}

pub struct PiGlow<B = I2cDevice> {
    bus: B,
    path: PathBuf,
}

impl PiGlow<I2cDevice> {
    /// Opens the first bus from `BUSES` that exists.
    pub fn open() -> Result<PiGlow<I2cDevice>> {
        let path = BUSES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .ok_or_else(|| Error::NotFound(format!("I2C bus ({})", BUSES.join(" or "))))?;
        let bus = I2cDevice::open(path).map_err(|source| Error::Device { path: path.into(), source })?;
        info!("opened PiGlow on {}", path.display());
        PiGlow::with_bus(bus, path)
    }
}

impl<B: Bus> PiGlow<B> {
    /// Wakes the chip and enables every LED; PWM levels are left as they were.
    pub fn with_bus<P: Into<PathBuf>>(bus: B, path: P) -> Result<PiGlow<B>> {
        let mut glow = PiGlow { bus, path: path.into() };
        glow.write(&[REG_ENABLE, 0x01])?;
        glow.write(&[REG_LED_CONTROL, 0x3f, 0x3f, 0x3f])?;
        glow.write(&[REG_UPDATE, 0x00])?;
        Ok(glow)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let path = &self.path;
        self.bus
            .write(bytes)
            .map_err(|source| Error::Device { path: path.clone(), source })
    }
}

impl<B: Bus> LedBoard for PiGlow<B> {
    fn set(&mut self, leg: usize, segment: usize, level: u8) -> Result<()> {
        let channel = match CHANNELS.get(leg).and_then(|l| l.get(segment)) {
            Some(channel) => *channel,
            None => return Ok(()),
        };
        self.write(&[REG_PWM + channel, level])
    }

    fn show(&mut self) -> Result<()> {
        self.write(&[REG_UPDATE, 0x00])
    }
}
