//! CDG Format Support
//!
//! Subcode packet reading and instruction decoding:
//! - Fixed 24-byte packet layout
//! - Typed instructions for the nine recognized CDG operations

pub mod instruction;
pub mod packet;

pub use instruction::{
    Instruction, InstructionCode, Scroll, ScrollMode, ScrollShift, TileBlock, TILE_ROWS,
};
pub use packet::{SubcodePacket, CDG_COMMAND, PACKET_DATA_SIZE, PACKET_SIZE, SUBCODE_MASK};

/// Number of whole packets in a buffer (a short tail is ignored)
pub fn packet_count(data: &[u8]) -> usize {
    data.len() / PACKET_SIZE
}

/// Iterate every whole packet in a buffer, in stream order
pub fn packets(data: &[u8]) -> impl Iterator<Item = SubcodePacket> + '_ {
    data.chunks_exact(PACKET_SIZE).filter_map(SubcodePacket::parse)
}
