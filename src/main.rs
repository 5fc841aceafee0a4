#[macro_use]
extern crate clap;
extern crate libc;

#[macro_use]
extern crate log;
extern crate env_logger;

use std::env;
use std::path::Path;
use std::process;

mod bar;
mod cpu;
mod daemon;
mod error;
mod instances;
mod monitor;
mod net;
mod options;
mod piglow;
mod sampler;
mod setup;
mod signals;
mod timer;

use daemon::Fork;
use error::Result;
use instances::{InstanceRegistry, ProcTable};
use options::Options;
use piglow::PiGlow;
use sampler::{ProcFs, Sampler};
use timer::SystemClock;

fn program_name() -> String {
    env::args_os()
        .next()
        .as_ref()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "glowmon".to_owned())
}

fn run(options: &Options) -> Result<()> {
    let stopped = ProcTable::default().find_and_terminate_others(process::id(), &program_name())?;
    if stopped > 0 {
        info!("terminated {} running instance(s)", stopped);
    }

    let mut sampler = Sampler::new(ProcFs::default(), SystemClock, &options.interface)?;
    signals::install().map_err(|e| error::Error::Setup(format!("Can't install signal handlers: {}", e)))?;
    setup::i2c()?;
    let mut board = PiGlow::open()?;

    if !options.console {
        match daemon::background()? {
            Fork::Parent { child } => {
                info!("continuing in background as {}", child);
                process::exit(0);
            }
            Fork::Child => {}
        }
    }

    info!(
        "watching {} every {:?} at brightness {}",
        options.interface, options.delay, options.brightness
    );
    monitor::run(&mut sampler, &mut board, options.brightness, options.delay, &signals::QUIT)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = Options::from_args();
    debug!("{:?}", options);

    if let Err(err) = run(&options) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
