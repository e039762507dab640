//! CDG instruction decoder
//!
//! Turns a [`SubcodePacket`] into a typed [`Instruction`]. Decoding is a pure
//! function of the packet; the framebuffer applies the result.

use super::packet::SubcodePacket;
use crate::framebuffer::{PaletteBank, Rgb, BANK_SIZE};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Rows of pixel data in one tile block instruction
pub const TILE_ROWS: usize = 12;

/// Instruction codes recognized under the CDG command
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum InstructionCode {
    /// Fill the whole canvas with one color
    MemoryPreset = 1,
    /// Fill the border area with one color
    BorderPreset = 2,
    /// Draw a 6x12 tile, replacing pixels
    TileBlock = 6,
    /// Scroll, filling revealed pixels with a color
    ScrollPreset = 20,
    /// Scroll, wrapping pixels around
    ScrollCopy = 24,
    /// Define the transparent color index
    DefineTransparent = 28,
    /// Load palette entries 0-7
    LoadColorTableLow = 30,
    /// Load palette entries 8-15
    LoadColorTableHigh = 31,
    /// Draw a 6x12 tile, XOR-ing palette indices
    TileBlockXor = 38,
}

/// How revealed pixels are produced when the canvas scrolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Revealed pixels take the fill color
    Preset,
    /// Pixels leaving one edge re-enter at the opposite edge
    Copy,
}

/// Whole-tile scroll step along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollShift {
    /// No movement
    #[default]
    None,
    /// Right (horizontal) or down (vertical)
    Forward,
    /// Left (horizontal) or up (vertical)
    Backward,
}

impl ScrollShift {
    fn from_bits(bits: u8) -> Self {
        match (bits >> 4) & 0x03 {
            1 => ScrollShift::Forward,
            2 => ScrollShift::Backward,
            _ => ScrollShift::None,
        }
    }

    /// Signed pixel delta for a step of `distance` pixels
    pub fn delta(self, distance: i32) -> i32 {
        match self {
            ScrollShift::None => 0,
            ScrollShift::Forward => distance,
            ScrollShift::Backward => -distance,
        }
    }
}

/// Tile block payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBlock {
    /// Index used where the mask bit is 0
    pub background: u8,
    /// Index used where the mask bit is 1
    pub foreground: u8,
    /// Tile row (valid 0-17)
    pub row: u8,
    /// Tile column (valid 0-49)
    pub column: u8,
    /// One 6-bit mask per pixel row, bit 5 is the leftmost pixel
    pub rows: [u8; TILE_ROWS],
    /// Combine with existing indices by XOR instead of overwriting
    pub xor: bool,
}

/// Scroll payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scroll {
    /// Preset (fill) or copy (wrap)
    pub mode: ScrollMode,
    /// Fill color for preset scrolls
    pub fill: u8,
    /// Horizontal tile step
    pub horizontal: ScrollShift,
    /// Horizontal display offset (0-5)
    pub h_offset: u8,
    /// Vertical tile step
    pub vertical: ScrollShift,
    /// Vertical display offset (0-11)
    pub v_offset: u8,
}

/// A decoded graphics instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Non-CDG packet or unknown instruction
    NoOp,
    /// Fill the canvas
    MemoryPreset {
        /// Fill color index
        color: u8,
        /// Repeat counter (the same preset is usually sent several times)
        repeat: u8,
    },
    /// Fill the border
    BorderPreset {
        /// Fill color index
        color: u8,
    },
    /// Draw a tile
    TileBlock(TileBlock),
    /// Scroll the canvas and set the display offset
    Scroll(Scroll),
    /// Mark an index as transparent
    DefineTransparent {
        /// Transparent color index
        index: u8,
    },
    /// Load half of the palette
    LoadColorTable {
        /// Target bank
        bank: PaletteBank,
        /// Colors for the eight entries of the bank
        colors: [Rgb; BANK_SIZE],
    },
}

impl Instruction {
    /// Decode the instruction carried by a packet
    pub fn decode(packet: &SubcodePacket) -> Self {
        if !packet.is_cdg() {
            return Instruction::NoOp;
        }

        let data = &packet.data;
        match InstructionCode::from_u8(packet.instruction) {
            Some(InstructionCode::MemoryPreset) => Instruction::MemoryPreset {
                color: data[0] & 0x0F,
                repeat: data[1] & 0x0F,
            },
            Some(InstructionCode::BorderPreset) => Instruction::BorderPreset {
                color: data[0] & 0x0F,
            },
            Some(InstructionCode::TileBlock) => Instruction::TileBlock(decode_tile(data, false)),
            Some(InstructionCode::TileBlockXor) => Instruction::TileBlock(decode_tile(data, true)),
            Some(InstructionCode::ScrollPreset) => {
                Instruction::Scroll(decode_scroll(data, ScrollMode::Preset))
            }
            Some(InstructionCode::ScrollCopy) => {
                Instruction::Scroll(decode_scroll(data, ScrollMode::Copy))
            }
            Some(InstructionCode::DefineTransparent) => Instruction::DefineTransparent {
                index: data[0] & 0x0F,
            },
            Some(InstructionCode::LoadColorTableLow) => Instruction::LoadColorTable {
                bank: PaletteBank::Low,
                colors: decode_colors(data),
            },
            Some(InstructionCode::LoadColorTableHigh) => Instruction::LoadColorTable {
                bank: PaletteBank::High,
                colors: decode_colors(data),
            },
            None => Instruction::NoOp,
        }
    }

    /// Check whether applying this instruction can alter the displayed image
    pub fn is_drawing(&self) -> bool {
        !matches!(self, Instruction::NoOp)
    }
}

fn decode_tile(data: &[u8; 16], xor: bool) -> TileBlock {
    let mut rows = [0u8; TILE_ROWS];
    rows.copy_from_slice(&data[4..4 + TILE_ROWS]);
    TileBlock {
        background: data[0] & 0x0F,
        foreground: data[1] & 0x0F,
        row: data[2] & 0x1F,
        column: data[3] & 0x3F,
        rows,
        xor,
    }
}

fn decode_scroll(data: &[u8; 16], mode: ScrollMode) -> Scroll {
    Scroll {
        mode,
        fill: data[0] & 0x0F,
        horizontal: ScrollShift::from_bits(data[1]),
        h_offset: (data[1] & 0x07).min(5),
        vertical: ScrollShift::from_bits(data[2]),
        v_offset: (data[2] & 0x0F).min(11),
    }
}

fn decode_colors(data: &[u8; 16]) -> [Rgb; BANK_SIZE] {
    std::array::from_fn(|i| Rgb::from_subcode_pair(data[i * 2], data[i * 2 + 1]))
}
