//! CDG Tile Framebuffer
//!
//! Owns the indexed canvas, palette and display offset. Every mutation is a
//! deterministic function of the current state and its arguments, so replaying
//! the same instruction sequence from a fresh framebuffer always yields the
//! same canvas. Seeking relies on that.

use super::image::{IndexedImage, RgbImage, RgbaImage};
use super::palette::{Palette, PaletteBank, Rgb, BANK_SIZE};
use super::{
    ChangeFlags, BORDER_X, BORDER_Y, CANVAS_HEIGHT, CANVAS_WIDTH, MAX_H_OFFSET, MAX_V_OFFSET,
    TILE_COLUMNS, TILE_HEIGHT, TILE_ROWS_PER_CANVAS, TILE_WIDTH, VISIBLE_HEIGHT, VISIBLE_ORIGIN_X,
    VISIBLE_ORIGIN_Y, VISIBLE_WIDTH,
};
use crate::cdg_parser::{Instruction, ScrollMode, TILE_ROWS};

/// Indexed-color CDG screen state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFramebuffer {
    /// Palette index per canvas pixel, row-major (always 0-15)
    pixels: Vec<u8>,
    palette: Palette,
    h_offset: u8,
    v_offset: u8,
}

impl TileFramebuffer {
    /// Create an all-zero canvas with an undefined palette
    pub fn new() -> Self {
        TileFramebuffer {
            pixels: vec![0; CANVAS_WIDTH * CANVAS_HEIGHT],
            palette: Palette::new(),
            h_offset: 0,
            v_offset: 0,
        }
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        self.pixels.fill(0);
        self.palette.reset();
        self.h_offset = 0;
        self.v_offset = 0;
    }

    #[inline]
    fn index_of(x: usize, y: usize) -> usize {
        y * CANVAS_WIDTH + x
    }

    /// Palette index of a canvas pixel (ignores the scroll offset)
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
            return None;
        }
        Some(self.pixels[Self::index_of(x, y)])
    }

    /// Raw canvas indices, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Current palette
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current display offset as (horizontal, vertical)
    pub fn scroll_offset(&self) -> (u8, u8) {
        (self.h_offset, self.v_offset)
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, value: u8) -> bool {
        let slot = &mut self.pixels[Self::index_of(x, y)];
        let value = value & 0x0F;
        if *slot == value {
            false
        } else {
            *slot = value;
            true
        }
    }

    fn pixels_flag(changed: bool) -> ChangeFlags {
        if changed {
            ChangeFlags::PIXELS
        } else {
            ChangeFlags::empty()
        }
    }

    /// Fill the whole canvas with one color (memory preset)
    pub fn preset_fill(&mut self, color: u8) -> ChangeFlags {
        let color = color & 0x0F;
        let changed = self.pixels.iter().any(|&p| p != color);
        self.pixels.fill(color);
        Self::pixels_flag(changed)
    }

    /// Fill the border area with one color (border preset)
    pub fn border_fill(&mut self, color: u8) -> ChangeFlags {
        let mut changed = false;
        for y in 0..CANVAS_HEIGHT {
            let full_row = y < BORDER_Y || y >= CANVAS_HEIGHT - BORDER_Y;
            for x in 0..CANVAS_WIDTH {
                if full_row || x < BORDER_X || x >= CANVAS_WIDTH - BORDER_X {
                    changed |= self.write(x, y, color);
                }
            }
        }
        Self::pixels_flag(changed)
    }

    /// Paint one 6x12 tile.
    ///
    /// Mask bits select `foreground` (1) or `background` (0); bit 5 of each
    /// row is the leftmost pixel. With `xor` the selected index is XOR-ed into
    /// the stored index instead of replacing it. Tiles outside the 50x18 grid
    /// are dropped.
    pub fn draw_tile(
        &mut self,
        row: u8,
        column: u8,
        rows: &[u8; TILE_ROWS],
        background: u8,
        foreground: u8,
        xor: bool,
    ) -> ChangeFlags {
        let (row, column) = (row as usize, column as usize);
        if row >= TILE_ROWS_PER_CANVAS || column >= TILE_COLUMNS {
            log::debug!("Dropping tile outside the grid at row {row}, column {column}");
            return ChangeFlags::empty();
        }

        let top = row * TILE_HEIGHT;
        let left = column * TILE_WIDTH;
        let mut changed = false;

        for (dy, bits) in rows.iter().enumerate() {
            let y = top + dy;
            for dx in 0..TILE_WIDTH {
                let x = left + dx;
                let selected = if (*bits >> (TILE_WIDTH - 1 - dx)) & 1 != 0 {
                    foreground
                } else {
                    background
                };
                let value = if xor {
                    self.pixels[Self::index_of(x, y)] ^ selected
                } else {
                    selected
                };
                changed |= self.write(x, y, value);
            }
        }

        Self::pixels_flag(changed)
    }

    /// Shift canvas contents by (dx, dy) pixels.
    ///
    /// After the call, pixel (x, y) holds what was at (x - dx, y - dy). In
    /// [`ScrollMode::Copy`] source coordinates wrap around the canvas; in
    /// [`ScrollMode::Preset`] pixels with no source take `fill`.
    pub fn scroll(&mut self, dx: i32, dy: i32, fill: u8, mode: ScrollMode) -> ChangeFlags {
        if dx == 0 && dy == 0 {
            return ChangeFlags::empty();
        }

        let width = CANVAS_WIDTH as i32;
        let height = CANVAS_HEIGHT as i32;
        let source = self.pixels.clone();
        let fill = fill & 0x0F;
        let mut changed = false;

        for y in 0..height {
            for x in 0..width {
                let (sx, sy) = (x - dx, y - dy);
                let value = match mode {
                    ScrollMode::Copy => {
                        source[Self::index_of(
                            sx.rem_euclid(width) as usize,
                            sy.rem_euclid(height) as usize,
                        )]
                    }
                    ScrollMode::Preset => {
                        if (0..width).contains(&sx) && (0..height).contains(&sy) {
                            source[Self::index_of(sx as usize, sy as usize)]
                        } else {
                            fill
                        }
                    }
                };
                changed |= self.write(x as usize, y as usize, value);
            }
        }

        Self::pixels_flag(changed)
    }

    /// Set the sub-tile display offset (clamped to 0-5 and 0-11)
    pub fn set_scroll_offset(&mut self, h_offset: u8, v_offset: u8) -> ChangeFlags {
        let h_offset = h_offset.min(MAX_H_OFFSET);
        let v_offset = v_offset.min(MAX_V_OFFSET);
        if (h_offset, v_offset) == (self.h_offset, self.v_offset) {
            return ChangeFlags::empty();
        }
        self.h_offset = h_offset;
        self.v_offset = v_offset;
        ChangeFlags::SCROLL_OFFSET
    }

    /// Load eight palette entries
    pub fn load_palette(&mut self, bank: PaletteBank, colors: &[Rgb; BANK_SIZE]) -> ChangeFlags {
        if self.palette.load_bank(bank, colors) {
            ChangeFlags::PALETTE
        } else {
            ChangeFlags::empty()
        }
    }

    /// Mark one palette entry as transparent
    pub fn set_transparent_index(&mut self, index: u8) -> ChangeFlags {
        if self.palette.set_transparent(index) {
            ChangeFlags::TRANSPARENCY
        } else {
            ChangeFlags::empty()
        }
    }

    /// Apply one decoded instruction
    pub fn apply(&mut self, instruction: &Instruction) -> ChangeFlags {
        match instruction {
            Instruction::NoOp => ChangeFlags::empty(),
            Instruction::MemoryPreset { color, .. } => self.preset_fill(*color),
            Instruction::BorderPreset { color } => self.border_fill(*color),
            Instruction::TileBlock(tile) => self.draw_tile(
                tile.row,
                tile.column,
                &tile.rows,
                tile.background,
                tile.foreground,
                tile.xor,
            ),
            Instruction::Scroll(scroll) => {
                let moved = self.scroll(
                    scroll.horizontal.delta(TILE_WIDTH as i32),
                    scroll.vertical.delta(TILE_HEIGHT as i32),
                    scroll.fill,
                    scroll.mode,
                );
                moved | self.set_scroll_offset(scroll.h_offset, scroll.v_offset)
            }
            Instruction::DefineTransparent { index } => self.set_transparent_index(*index),
            Instruction::LoadColorTable { bank, colors } => self.load_palette(*bank, colors),
        }
    }

    #[inline]
    fn visible_index(&self, x: usize, y: usize) -> u8 {
        let cx = (VISIBLE_ORIGIN_X + self.h_offset as usize + x) % CANVAS_WIDTH;
        let cy = (VISIBLE_ORIGIN_Y + self.v_offset as usize + y) % CANVAS_HEIGHT;
        self.pixels[Self::index_of(cx, cy)]
    }

    fn visible_indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0..VISIBLE_HEIGHT)
            .flat_map(move |y| (0..VISIBLE_WIDTH).map(move |x| self.visible_index(x, y)))
    }

    /// Visible region as palette indices, honoring the display offset
    pub fn indexed_image(&self) -> IndexedImage {
        IndexedImage {
            width: VISIBLE_WIDTH as u32,
            height: VISIBLE_HEIGHT as u32,
            pixels: self.visible_indices().collect(),
        }
    }

    /// Visible region with the palette applied
    pub fn rgb_image(&self) -> RgbImage {
        let mut data = Vec::with_capacity(VISIBLE_WIDTH * VISIBLE_HEIGHT * 3);
        for index in self.visible_indices() {
            data.extend_from_slice(&self.palette.color(index).to_array());
        }
        RgbImage {
            width: VISIBLE_WIDTH as u32,
            height: VISIBLE_HEIGHT as u32,
            data,
        }
    }

    /// Visible region with the palette applied and the transparent index cleared
    pub fn rgba_image(&self) -> RgbaImage {
        let mut data = Vec::with_capacity(VISIBLE_WIDTH * VISIBLE_HEIGHT * 4);
        for index in self.visible_indices() {
            let [r, g, b] = self.palette.color(index).to_array();
            let alpha = if self.palette.is_transparent(index) {
                0
            } else {
                255
            };
            data.extend_from_slice(&[r, g, b, alpha]);
        }
        RgbaImage {
            width: VISIBLE_WIDTH as u32,
            height: VISIBLE_HEIGHT as u32,
            data,
        }
    }
}

impl Default for TileFramebuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKER: [u8; TILE_ROWS] = [
        0b10_1010, 0b01_0101, 0b10_1010, 0b01_0101, 0b10_1010, 0b01_0101, 0b10_1010, 0b01_0101,
        0b10_1010, 0b01_0101, 0b10_1010, 0b01_0101,
    ];

    fn column(fb: &TileFramebuffer, x: usize) -> Vec<u8> {
        (0..CANVAS_HEIGHT).map(|y| fb.pixel(x, y).unwrap()).collect()
    }

    #[test]
    fn test_new_framebuffer_is_blank() {
        let fb = TileFramebuffer::new();
        assert!(fb.pixels().iter().all(|&p| p == 0));
        assert_eq!(fb.scroll_offset(), (0, 0));
        assert_eq!(fb.palette(), &Palette::new());
    }

    #[test]
    fn test_preset_fill_reports_changes() {
        let mut fb = TileFramebuffer::new();
        assert_eq!(fb.preset_fill(3), ChangeFlags::PIXELS);
        assert!(fb.pixels().iter().all(|&p| p == 3));
        // Repeated presets change nothing
        assert!(fb.preset_fill(3).is_empty());
    }

    #[test]
    fn test_border_fill_leaves_interior() {
        let mut fb = TileFramebuffer::new();
        fb.border_fill(7);
        assert_eq!(fb.pixel(0, 0), Some(7));
        assert_eq!(fb.pixel(5, 100), Some(7));
        assert_eq!(fb.pixel(294, 100), Some(7));
        assert_eq!(fb.pixel(150, 11), Some(7));
        assert_eq!(fb.pixel(150, 204), Some(7));
        assert_eq!(fb.pixel(6, 12), Some(0));
        assert_eq!(fb.pixel(293, 203), Some(0));
    }

    #[test]
    fn test_draw_tile_pattern() {
        let mut fb = TileFramebuffer::new();
        let flags = fb.draw_tile(1, 2, &CHECKER, 4, 9, false);
        assert_eq!(flags, ChangeFlags::PIXELS);

        // Tile (1, 2) covers x 12..18, y 12..24
        assert_eq!(fb.pixel(12, 12), Some(9)); // bit 5 of 0b101010
        assert_eq!(fb.pixel(13, 12), Some(4));
        assert_eq!(fb.pixel(12, 13), Some(4));
        assert_eq!(fb.pixel(17, 13), Some(9));
        assert_eq!(fb.pixel(11, 12), Some(0));
        assert_eq!(fb.pixel(18, 12), Some(0));
    }

    #[test]
    fn test_change_outside_crop_counts_as_pixels() {
        let mut fb = TileFramebuffer::new();
        // Top-left 3x6 corner only, which lies outside the 294x204 crop
        let mut corner = [0u8; TILE_ROWS];
        corner[..6].fill(0b11_1000);
        let before = fb.indexed_image();

        assert_eq!(fb.draw_tile(0, 0, &corner, 0, 5, false), ChangeFlags::PIXELS);
        assert_eq!(fb.pixel(0, 0), Some(5));
        assert_eq!(fb.indexed_image(), before);

        // At the largest offsets the crop wraps onto the hidden corner
        assert_eq!(fb.set_scroll_offset(5, 11), ChangeFlags::SCROLL_OFFSET);
        let image = fb.indexed_image();
        assert_eq!(image.pixels[199 * VISIBLE_WIDTH + 292], 5);
    }

    #[test]
    fn test_out_of_grid_tile_is_dropped() {
        let mut fb = TileFramebuffer::new();
        assert!(fb.draw_tile(18, 0, &CHECKER, 1, 2, false).is_empty());
        assert!(fb.draw_tile(0, 50, &CHECKER, 1, 2, false).is_empty());
        assert_eq!(fb, TileFramebuffer::new());
    }

    #[test]
    fn test_xor_tile_toggles_indices() {
        let mut fb = TileFramebuffer::new();
        fb.preset_fill(5);
        let solid = [0b11_1111; TILE_ROWS];

        fb.draw_tile(0, 0, &solid, 0, 3, true);
        assert_eq!(fb.pixel(0, 0), Some(5 ^ 3));

        // XOR-ing back restores the original indices
        fb.draw_tile(0, 0, &solid, 0, 3, true);
        assert_eq!(fb.pixel(0, 0), Some(5));

        // Background index 0 leaves pixels untouched under XOR
        let blank = [0u8; TILE_ROWS];
        assert!(fb.draw_tile(0, 0, &blank, 0, 3, true).is_empty());
    }

    #[test]
    fn test_scroll_copy_wraps_columns() {
        let mut fb = TileFramebuffer::new();
        fb.draw_tile(0, 0, &CHECKER, 1, 2, false);
        fb.draw_tile(5, 49, &CHECKER, 3, 4, false);
        let before = fb.clone();

        fb.scroll(2, 0, 0, ScrollMode::Copy);
        for x in 0..CANVAS_WIDTH {
            let src = (x + CANVAS_WIDTH - 2) % CANVAS_WIDTH;
            assert_eq!(column(&fb, x), column(&before, src), "column {x}");
        }
    }

    #[test]
    fn test_scroll_preset_fills_revealed_area() {
        let mut fb = TileFramebuffer::new();
        fb.preset_fill(1);
        fb.scroll(0, -12, 6, ScrollMode::Preset);
        assert_eq!(fb.pixel(0, 0), Some(1));
        assert_eq!(fb.pixel(0, CANVAS_HEIGHT - 13), Some(1));
        assert_eq!(fb.pixel(0, CANVAS_HEIGHT - 12), Some(6));
        assert_eq!(fb.pixel(299, CANVAS_HEIGHT - 1), Some(6));
    }

    #[test]
    fn test_scroll_offset_shifts_visible_crop() {
        let mut fb = TileFramebuffer::new();
        fb.draw_tile(0, 1, &[0b11_1111; TILE_ROWS], 0, 8, false);
        // Canvas pixel (6, 6) lies in tile (0, 1); crop origin is (3, 6)
        assert_eq!(fb.indexed_image().get(3, 0), Some(8));
        assert_eq!(fb.indexed_image().get(2, 0), Some(0));

        assert_eq!(fb.set_scroll_offset(2, 0), ChangeFlags::SCROLL_OFFSET);
        assert_eq!(fb.indexed_image().get(1, 0), Some(8));
        assert!(fb.set_scroll_offset(2, 0).is_empty());

        // Offsets are clamped
        fb.set_scroll_offset(9, 40);
        assert_eq!(fb.scroll_offset(), (5, 11));
    }

    #[test]
    fn test_rgba_marks_transparent_index() {
        let mut fb = TileFramebuffer::new();
        let colors = [Rgb::new(255, 255, 255); BANK_SIZE];
        fb.load_palette(PaletteBank::Low, &colors);
        assert_eq!(fb.set_transparent_index(0), ChangeFlags::TRANSPARENCY);
        let image = fb.rgba_image();
        assert_eq!(image.get(0, 0), Some([255, 255, 255, 0]));

        fb.preset_fill(1);
        assert_eq!(fb.rgba_image().get(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(fb.rgb_image().get(0, 0), Some([255, 255, 255]));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut fb = TileFramebuffer::new();
        fb.preset_fill(4);
        fb.set_scroll_offset(3, 3);
        fb.set_transparent_index(2);
        fb.reset();
        assert_eq!(fb, TileFramebuffer::new());
    }
}
