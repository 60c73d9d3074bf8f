//! CPU-side RGB8 image of the grid, updated from the dirty stream.

use powder_core::{Color, GridPos, GridSize};
use powder_world::PaintSurface;

pub struct FrameBuffer {
    size: GridSize,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(size: GridSize, background: Color) -> Self {
        let pixels = background.to_array().repeat(size.area());
        Self { size, pixels }
    }

    pub fn pixel(&self, pos: GridPos) -> Option<Color> {
        let offset = self.offset(pos)?;
        let rgb = &self.pixels[offset..offset + 3];
        Some(Color::rgb(rgb[0], rgb[1], rgb[2]))
    }

    /// Raw row-major RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// FNV-1a over the pixel bytes.
    pub fn checksum(&self) -> u64 {
        self.as_bytes().iter().fold(0xcbf2_9ce4_8422_2325, |hash, &byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
    }

    fn offset(&self, pos: GridPos) -> Option<usize> {
        self.size
            .contains(pos)
            .then(|| (pos.y as usize * self.size.width as usize + pos.x as usize) * 3)
    }
}

impl PaintSurface for FrameBuffer {
    fn paint(&mut self, pos: GridPos, color: Color) {
        if let Some(offset) = self.offset(pos) {
            self.pixels[offset..offset + 3].copy_from_slice(&color.to_array());
        }
    }
}
