use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::bar::{clear, render_bar, LedBoard};
use crate::error::Result;
use crate::sampler::{Sample, Sampler, Sources};
use crate::timer::Clock;

pub const TEMPERATURE_LEG: usize = 0;
pub const CPU_LEG: usize = 1;
pub const NETWORK_LEG: usize = 2;

/// 40°C is empty, 80°C is full.
pub fn temperature_level(celsius: f32) -> f32 {
    (celsius - 40.0) / 40.0
}

pub fn cpu_level(percent: f32) -> f32 {
    percent / 100.0
}

/// One decade per segment, from 100 B/s up to 100 MB/s.
pub fn network_level(received: f32, sent: f32) -> f32 {
    ((received + sent) / 1e2).log10() / 6.0
}

/// Draws the three bars for one sample.
pub fn draw<B: LedBoard>(board: &mut B, sample: &Sample, brightness: u8) -> Result<()> {
    let temperature = temperature_level(sample.temperature);
    let cpu = cpu_level(sample.cpu);
    let network = network_level(sample.network.received, sample.network.sent);
    debug!("levels: temperature({}) cpu({}) network({})", temperature, cpu, network);

    render_bar(board, TEMPERATURE_LEG, temperature, brightness)?;
    render_bar(board, CPU_LEG, cpu, brightness)?;
    render_bar(board, NETWORK_LEG, network, brightness)?;
    Ok(())
}

/// Samples and draws every `delay` until `quit` is raised, then blanks the board.
///
/// `quit` is only looked at between iterations, so a sample in progress always
/// finishes. A failed sample or write ends the loop with that error.
pub fn run<S, C, B>(
    sampler: &mut Sampler<S, C>,
    board: &mut B,
    brightness: u8,
    delay: Duration,
    quit: &AtomicBool,
) -> Result<()>
where
    S: Sources,
    C: Clock,
    B: LedBoard,
{
    while !quit.load(Ordering::SeqCst) {
        let sample = sampler.sample()?;
        draw(board, &sample, brightness)?;
        thread::sleep(delay);
    }
    info!("shutting down");
    clear(board)
}
