//! Image buffers handed to the renderer

use super::{CANVAS_HEIGHT, CANVAS_WIDTH, VISIBLE_HEIGHT, VISIBLE_WIDTH};

/// Size of the decoded image and the size it is meant to be shown at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Width of the cropped image in pixels
    pub width: u32,
    /// Height of the cropped image in pixels
    pub height: u32,
    /// Width the renderer should scale to (keeps the CDG aspect)
    pub target_width: u32,
    /// Height the renderer should scale to
    pub target_height: u32,
}

impl DisplayGeometry {
    /// Geometry of every CDG stream
    pub const CDG: DisplayGeometry = DisplayGeometry {
        width: VISIBLE_WIDTH as u32,
        height: VISIBLE_HEIGHT as u32,
        target_width: CANVAS_WIDTH as u32,
        target_height: CANVAS_HEIGHT as u32,
    };

    /// Target size multiplied by an integer scale factor
    pub fn scaled_target(&self, scale: u32) -> (u32, u32) {
        let scale = scale.max(1);
        (self.target_width * scale, self.target_height * scale)
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::CDG
    }
}

/// Palette indices of the visible region, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// One palette index per pixel
    pub pixels: Vec<u8>,
}

impl IndexedImage {
    /// Palette index at (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Packed 8-bit RGB pixels, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Three bytes per pixel
    pub data: Vec<u8>,
}

impl RgbImage {
    /// RGB triple at (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 3) as usize;
        self.data
            .get(offset..offset + 3)
            .map(|px| [px[0], px[1], px[2]])
    }
}

/// Packed 8-bit RGBA pixels, row-major; the transparent index has alpha 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Four bytes per pixel
    pub data: Vec<u8>,
}

impl RgbaImage {
    /// RGBA quadruple at (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.data
            .get(offset..offset + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Nearest-neighbour upscale by an integer factor
    pub fn upscale(&self, factor: u32) -> RgbaImage {
        let factor = factor.max(1);
        if factor == 1 {
            return self.clone();
        }
        let width = self.width * factor;
        let height = self.height * factor;
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let src_row = (y / factor) * self.width;
            for x in 0..width {
                let offset = ((src_row + x / factor) * 4) as usize;
                data.extend_from_slice(&self.data[offset..offset + 4]);
            }
        }
        RgbaImage {
            width,
            height,
            data,
        }
    }
}
