use std::fs::File;
use std::mem;
use std::os::unix::io::{AsRawFd, FromRawFd};

use memmap2::{MmapMut, MmapOptions};
use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
use tracing::debug;
use wayland_client::protocol::{wl_shm::WlShm, wl_shm_pool::WlShmPool};
use wayland_client::Main;

use crate::prelude::*;

pub const POOL_ALIGN: usize = 0x1000;
const BYTES_PER_PIXEL: usize = mem::size_of::<u32>();

pub const fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffering {
    Single,
    Double,
}

impl Buffering {
    pub fn count(self) -> usize {
        match self {
            Buffering::Single => 1,
            Buffering::Double => 2,
        }
    }
}

/// How fixed-size XRGB8888 frames are carved out of one shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    pub width: u32,
    pub height: u32,
    pub buffering: Buffering,
}

impl PoolLayout {
    pub fn new(width: u32, height: u32, buffering: Buffering) -> Self {
        Self {
            width,
            height,
            buffering,
        }
    }
    pub fn buffer_size(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
    /// Row pitch in bytes, as the protocol wants it.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }
    pub fn pool_size(&self) -> usize {
        align_up(self.buffering.count() * self.buffer_size(), POOL_ALIGN)
    }
}

/// Picks the back buffer for each frame from the parity of a running counter.
#[derive(Debug, Default, Clone)]
pub struct FrameSequence {
    seq: u32,
}

impl FrameSequence {
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn next_offset(&mut self, layout: &PoolLayout) -> usize {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        match layout.buffering {
            Buffering::Single => 0,
            Buffering::Double => (seq & 1) as usize * layout.buffer_size(),
        }
    }
}

/// Anonymous memory file backing a pool. Closed on drop.
#[derive(Debug)]
pub struct ShmFile {
    file: File,
    size: usize,
}

impl ShmFile {
    pub fn create(size: usize) -> Result<Self> {
        let fd = memfd_create(c"wayland_thing_pool", MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(Error::PoolFd)?;
        // SAFETY: memfd_create just handed us this descriptor and nothing else owns it.
        let file = unsafe { File::from_raw_fd(fd) };
        file.set_len(size as u64).map_err(Error::PoolGrow)?;
        Ok(Self { file, size })
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn map(&self) -> Result<MmapMut> {
        // SAFETY: the file is private to this process apart from the compositor, which only reads.
        unsafe { MmapOptions::new().len(self.size).map_mut(&self.file) }
            .map_err(Error::PoolMap)
    }
}

impl AsRawFd for ShmFile {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.file.as_raw_fd()
    }
}

pub trait Framebuffer {
    fn pixels_mut(&mut self) -> &mut [u32];
}

impl Framebuffer for MmapMut {
    fn pixels_mut(&mut self) -> &mut [u32] {
        bytemuck::cast_slice_mut(&mut self[..])
    }
}

impl Framebuffer for Vec<u32> {
    fn pixels_mut(&mut self) -> &mut [u32] {
        self
    }
}

/// The client half of a `wl_shm_pool`: the descriptor and the protocol object over it.
pub struct SharedPool {
    pub layout: PoolLayout,
    pub wl_pool: Main<WlShmPool>,
    file: ShmFile,
}

impl SharedPool {
    /// Creates the pool and returns it with our own mapping of the whole region.
    pub fn new(shm: &Main<WlShm>, layout: PoolLayout) -> Result<(Self, MmapMut)> {
        let size = layout.pool_size();
        debug!(size, buffer_size = layout.buffer_size(), "creating pool");
        let file = ShmFile::create(size)?;
        let wl_pool = shm.create_pool(file.as_raw_fd(), size as i32);
        if !crate::is_alive(&**wl_pool) {
            return Err(Error::Pool);
        }
        let mapping = file.map()?;
        Ok((
            Self {
                layout,
                wl_pool,
                file,
            },
            mapping,
        ))
    }

    pub fn size(&self) -> usize {
        self.file.size()
    }
}

impl Drop for SharedPool {
    fn drop(&mut self) {
        self.wl_pool.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_sizes_round_to_pages() {
        for (w, h) in [(1, 1), (500, 500), (640, 480), (33, 7), (1024, 1)] {
            let single = PoolLayout::new(w, h, Buffering::Single);
            let double = PoolLayout::new(w, h, Buffering::Double);
            let size = w as usize * h as usize * 4;
            assert_eq!(single.pool_size(), align_up(size, 4096));
            assert_eq!(double.pool_size(), align_up(2 * size, 4096));
            assert_eq!(single.pool_size() % 4096, 0);
            assert!(double.pool_size() >= 2 * size);
        }
        assert_eq!(
            PoolLayout::new(500, 500, Buffering::Double).pool_size(),
            2_002_944
        );
    }

    #[test]
    fn align_up_keeps_aligned_values() {
        assert_eq!(align_up(0, 4096), 0);
        assert_eq!(align_up(4096, 4096), 4096);
        assert_eq!(align_up(4097, 4096), 8192);
    }

    #[test]
    fn double_buffering_alternates() {
        let layout = PoolLayout::new(500, 500, Buffering::Double);
        let mut seq = FrameSequence::default();
        let offsets: Vec<_> = (0..6).map(|_| seq.next_offset(&layout)).collect();
        assert_eq!(offsets, [0, 1_000_000, 0, 1_000_000, 0, 1_000_000]);
        assert_eq!(seq.seq(), 6);
    }

    #[test]
    fn single_buffering_stays_put() {
        let layout = PoolLayout::new(64, 64, Buffering::Single);
        let mut seq = FrameSequence::default();
        assert!((0..4).all(|_| seq.next_offset(&layout) == 0));
    }

    #[test]
    fn memfd_is_grown_and_mappable() -> anyhow::Result<()> {
        let file = ShmFile::create(8192)?;
        let mut mapping = file.map()?;
        assert_eq!(mapping.len(), 8192);
        let pixels = mapping.pixels_mut();
        assert_eq!(pixels.len(), 2048);
        pixels.fill(0xdeadbeef);
        assert_eq!(pixels[2047], 0xdeadbeef);
        Ok(())
    }
}
