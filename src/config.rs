use rgb::alt::ARGB8;

/// Opaque blue in XRGB8888.
pub const STATIC_FILL: ARGB8 = ARGB8 {
    a: 0xff,
    r: 0x00,
    g: 0x00,
    b: 0xff,
};
pub const THROB_BASE: ARGB8 = ARGB8 {
    a: 0x00,
    r: 0x00,
    g: 0x00,
    b: 0xff,
};
pub const THROB_PERIOD_MS: u32 = 2000;

/// Packs a color as `0xAARRGGBB`, the in-memory layout of the shm formats used here.
pub const fn pack(color: ARGB8) -> u32 {
    u32::from_be_bytes([color.a, color.r, color.g, color.b])
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub fill: ARGB8,
    pub throb_base: ARGB8,
    pub throb_period_ms: u32,
    /// Timestamp handed to the manually presented first frame.
    pub first_frame_ms: u32,
    /// Stop after this many frames and tear down. `None` runs until closed.
    pub frame_limit: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            title: "Wayland Thing".to_owned(),
            fill: STATIC_FILL,
            throb_base: THROB_BASE,
            throb_period_ms: THROB_PERIOD_MS,
            first_frame_ms: 200,
            frame_limit: None,
        }
    }
}
