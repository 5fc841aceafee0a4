use crate::error::Result;

pub const LEGS: usize = 3;
pub const SEGMENTS: usize = 6;

/// A display made of `LEGS` bars of `SEGMENTS` dimmable LEDs each.
pub trait LedBoard {
    /// Stages a brightness for one LED. `level` is on a 0-100 scale.
    fn set(&mut self, leg: usize, segment: usize, level: u8) -> Result<()>;
    /// Makes the staged levels visible.
    fn show(&mut self) -> Result<()>;
}

/// Brightness of each segment of one leg, innermost first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPattern(pub [f32; SEGMENTS]);

impl BarPattern {
    /// Fills the bar linearly: segment `i` is dark below `i/6`, fully lit from
    /// `(i+1)/6`, and proportionally dimmed in between. `value` is clamped to
    /// `[0, 1]` (NaN counts as 0), and full brightness is `max_brightness`.
    pub fn new(value: f32, max_brightness: u8) -> BarPattern {
        let value = value.max(0.0).min(1.0);
        // 6 * (value - i/6), with the multiplication done once
        let filled = SEGMENTS as f32 * value;
        let mut levels = [0.0; SEGMENTS];
        for (i, level) in levels.iter_mut().enumerate() {
            let intensity = filled - i as f32;
            *level = intensity.max(0.0).min(1.0) * max_brightness as f32;
        }
        BarPattern(levels)
    }

    pub fn levels(&self) -> [u8; SEGMENTS] {
        let mut out = [0; SEGMENTS];
        for (o, l) in out.iter_mut().zip(self.0.iter()) {
            *o = *l as u8;
        }
        out
    }
}

/// Draws `value` as a bar on `leg`.
pub fn render_bar<B: LedBoard>(board: &mut B, leg: usize, value: f32, max_brightness: u8) -> Result<BarPattern> {
    let pattern = BarPattern::new(value, max_brightness);
    for (segment, level) in pattern.levels().iter().enumerate() {
        board.set(leg, segment, *level)?;
    }
    board.show()?;
    Ok(pattern)
}

/// Switches every LED off.
pub fn clear<B: LedBoard>(board: &mut B) -> Result<()> {
    for leg in 0..LEGS {
        for segment in 0..SEGMENTS {
            board.set(leg, segment, 0)?;
        }
    }
    board.show()
}
