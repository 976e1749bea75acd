use tracing::{debug, trace};
use wayland_client::protocol::{
    wl_buffer::{self, WlBuffer},
    wl_callback::WlCallback,
    wl_shm::Format,
    wl_shm_pool::WlShmPool,
    wl_surface::WlSurface,
};
use wayland_client::Main;

use crate::draw::Painter;
use crate::pool::{Framebuffer, FrameSequence, PoolLayout};
use crate::prelude::*;

/// The requests a frame needs from the compositor side.
pub trait PresentTarget {
    type Buffer;
    type Frame;
    fn create_buffer(&mut self, offset: usize, layout: &PoolLayout) -> Result<Self::Buffer>;
    fn request_frame(&mut self) -> Result<Self::Frame>;
    fn attach(&mut self, buffer: &Self::Buffer);
    fn damage(&mut self, width: u32, height: u32);
    fn commit(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Presenting,
    Finished,
}

pub struct Presenter<T: PresentTarget, F: Framebuffer> {
    target: T,
    framebuffer: F,
    layout: PoolLayout,
    painter: Painter,
    sequence: FrameSequence,
    state: FrameState,
    continuous: bool,
    frame_limit: Option<u32>,
    presented: u32,
}

impl<T: PresentTarget, F: Framebuffer> Presenter<T, F> {
    pub fn new(target: T, framebuffer: F, layout: PoolLayout, painter: Painter) -> Self {
        Self {
            target,
            framebuffer,
            layout,
            painter,
            sequence: FrameSequence::default(),
            state: FrameState::Idle,
            continuous: false,
            frame_limit: None,
            presented: 0,
        }
    }

    /// Keep asking for frame callbacks so every `done` draws the next frame.
    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_frame_limit(mut self, limit: Option<u32>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn state(&self) -> FrameState {
        self.state
    }
    pub fn presented(&self) -> u32 {
        self.presented
    }
    pub fn target(&self) -> &T {
        &self.target
    }
    pub fn framebuffer_mut(&mut self) -> &mut F {
        &mut self.framebuffer
    }

    pub fn present(&mut self, frame_time_ms: u32) -> Result<Option<T::Frame>> {
        // Nothing tracks releases: the other half is assumed to be back by the time it is reused.
        let offset = self.sequence.next_offset(&self.layout);
        trace!(frame_time_ms, offset, "present");

        let buffer = self.target.create_buffer(offset, &self.layout)?;
        let frame = if self.continuous {
            Some(self.target.request_frame()?)
        } else {
            None
        };

        let (width, height) = (self.layout.width as usize, self.layout.height as usize);
        let start = offset / std::mem::size_of::<u32>();
        let pixels = &mut self.framebuffer.pixels_mut()[start..start + width * height];
        self.painter.paint(pixels, width, height, width, frame_time_ms);

        self.target.attach(&buffer);
        self.target.damage(self.layout.width, self.layout.height);
        self.target.commit();

        self.state = FrameState::Presenting;
        self.presented += 1;
        Ok(frame)
    }

    pub fn on_frame_done(&mut self, frame_time_ms: u32) -> Result<Option<T::Frame>> {
        if self.state == FrameState::Finished {
            return Ok(None);
        }
        if self.frame_limit.map_or(false, |limit| self.presented >= limit) {
            debug!(frames = self.presented, "frame limit reached");
            self.state = FrameState::Finished;
            return Ok(None);
        }
        self.present(frame_time_ms)
    }
}

/// Presents into a real surface, carving buffers out of the shared pool.
pub struct WaylandTarget {
    pub surface: Main<WlSurface>,
    pub pool: Main<WlShmPool>,
}

impl PresentTarget for WaylandTarget {
    type Buffer = Main<WlBuffer>;
    type Frame = Main<WlCallback>;

    fn create_buffer(&mut self, offset: usize, layout: &PoolLayout) -> Result<Self::Buffer> {
        let buffer = self.pool.create_buffer(
            offset as i32,
            layout.width as i32,
            layout.height as i32,
            layout.stride() as i32,
            Format::Xrgb8888,
        );
        if !crate::is_alive(&**buffer) {
            return Err(Error::Buffer);
        }
        // A fresh buffer every frame; give it back as soon as the compositor is done with it.
        buffer.quick_assign(|buffer: Main<WlBuffer>, event: wl_buffer::Event, _| {
            if let wl_buffer::Event::Release = event {
                trace!("release buffer {}", crate::proxy_id(&**buffer));
                buffer.destroy();
            }
        });
        Ok(buffer)
    }

    fn request_frame(&mut self) -> Result<Self::Frame> {
        let callback = self.surface.frame();
        if !crate::is_alive(&**callback) {
            return Err(Error::FrameCallback);
        }
        Ok(callback)
    }

    fn attach(&mut self, buffer: &Self::Buffer) {
        self.surface.attach(Some(&buffer.detach()), 0, 0);
    }

    fn damage(&mut self, width: u32, height: u32) {
        self.surface.damage(0, 0, width as i32, height as i32);
    }

    fn commit(&mut self) {
        self.surface.commit();
    }
}
