use std::f64::consts::PI;

/// Cheap stand-in for the 1/2.2 sRGB transfer exponent.
pub const GAMMA_EXPONENT: f64 = 0.4545;

pub fn fill(framebuffer: &mut [u32], width: usize, height: usize, stride: usize, color: u32) {
    for row in framebuffer.chunks_mut(stride).take(height) {
        row[..width].fill(color);
    }
}

/// Raw brightness in `[0, 1]`, peaking a quarter of the way into each period.
pub fn throb_level(frame_time_ms: u32, period_ms: u32) -> f64 {
    let phase = (frame_time_ms % period_ms) as f64;
    (1.0 + (2.0 * PI * phase / period_ms as f64).sin()) * 0.5
}

pub fn gamma(t: f64) -> f64 {
    t.powf(GAMMA_EXPONENT)
}

pub fn throb_color(frame_time_ms: u32, period_ms: u32, base: u32) -> u32 {
    let intensity = gamma(throb_level(frame_time_ms, period_ms));
    (intensity * base as f64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Painter {
    Solid(u32),
    Throb { period_ms: u32, base: u32 },
}

impl Painter {
    pub fn color_at(&self, frame_time_ms: u32) -> u32 {
        match *self {
            Painter::Solid(color) => color,
            Painter::Throb { period_ms, base } => throb_color(frame_time_ms, period_ms, base),
        }
    }

    pub fn paint(
        &self,
        framebuffer: &mut [u32],
        width: usize,
        height: usize,
        stride: usize,
        frame_time_ms: u32,
    ) {
        fill(framebuffer, width, height, stride, self.color_at(frame_time_ms));
    }
}
