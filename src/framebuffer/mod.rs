//! Tile Framebuffer Domain
//!
//! The persistent CDG screen state: a 300x216 indexed-color canvas built
//! from 50x18 tiles of 6x12 pixels, the 16-entry palette and the display
//! scroll offset. Instructions mutate it one at a time and report what
//! they changed through [`ChangeFlags`].

pub mod canvas;
pub mod image;
pub mod palette;

pub use canvas::TileFramebuffer;
pub use image::{DisplayGeometry, IndexedImage, RgbImage, RgbaImage};
pub use palette::{Palette, PaletteBank, Rgb, BANK_SIZE, PALETTE_SIZE};

use bitflags::bitflags;

/// Canvas width in pixels
pub const CANVAS_WIDTH: usize = 300;
/// Canvas height in pixels
pub const CANVAS_HEIGHT: usize = 216;
/// Tile width in pixels
pub const TILE_WIDTH: usize = 6;
/// Tile height in pixels
pub const TILE_HEIGHT: usize = 12;
/// Tile columns across the canvas
pub const TILE_COLUMNS: usize = CANVAS_WIDTH / TILE_WIDTH;
/// Tile rows down the canvas
pub const TILE_ROWS_PER_CANVAS: usize = CANVAS_HEIGHT / TILE_HEIGHT;

/// Width of the left and right border (one tile)
pub const BORDER_X: usize = TILE_WIDTH;
/// Height of the top and bottom border (one tile)
pub const BORDER_Y: usize = TILE_HEIGHT;

/// Width of the image handed to the renderer
pub const VISIBLE_WIDTH: usize = 294;
/// Height of the image handed to the renderer
pub const VISIBLE_HEIGHT: usize = 204;
/// Left edge of the visible crop at zero scroll offset
pub const VISIBLE_ORIGIN_X: usize = (CANVAS_WIDTH - VISIBLE_WIDTH) / 2;
/// Top edge of the visible crop at zero scroll offset
pub const VISIBLE_ORIGIN_Y: usize = (CANVAS_HEIGHT - VISIBLE_HEIGHT) / 2;

/// Largest horizontal display offset
pub const MAX_H_OFFSET: u8 = 5;
/// Largest vertical display offset
pub const MAX_V_OFFSET: u8 = 11;

bitflags! {
    /// Aspects of the displayed image altered by a framebuffer mutation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeFlags: u8 {
        /// At least one pixel index changed, anywhere on the canvas.
        ///
        /// Pixels outside the current visible crop count too: a later
        /// offset change can bring them into view without redrawing them.
        const PIXELS = 0x01;
        /// A palette entry changed color
        const PALETTE = 0x02;
        /// The display scroll offset moved
        const SCROLL_OFFSET = 0x04;
        /// The transparent index changed
        const TRANSPARENCY = 0x08;
    }
}

impl ChangeFlags {
    /// Check whether the mutation changed anything a viewer could see
    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.is_empty()
    }
}
