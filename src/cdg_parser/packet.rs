//! Subcode packet reader
//!
//! A CDG stream is a flat sequence of 24-byte packets:
//! - byte 0: command (low 6 bits)
//! - byte 1: instruction (low 6 bits)
//! - bytes 2-3: parity Q (ignored)
//! - bytes 4-19: 16 data bytes (low 6 bits each)
//! - bytes 20-23: parity P (ignored)

use super::instruction::Instruction;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use nom::IResult;

/// Size of one subcode packet in bytes
pub const PACKET_SIZE: usize = 24;

/// Number of data bytes in a packet
pub const PACKET_DATA_SIZE: usize = 16;

/// The only command value that carries CD+Graphics instructions
pub const CDG_COMMAND: u8 = 0x09;

/// Mask applied to every subcode byte (the P and Q channel bits are dropped)
pub const SUBCODE_MASK: u8 = 0x3F;

/// One decoded 24-byte subcode packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcodePacket {
    /// Command byte, masked to 6 bits
    pub command: u8,
    /// Instruction byte, masked to 6 bits
    pub instruction: u8,
    /// Data bytes, each masked to 6 bits
    pub data: [u8; PACKET_DATA_SIZE],
}

fn subcode_packet(input: &[u8]) -> IResult<&[u8], SubcodePacket> {
    let (input, command) = be_u8(input)?;
    let (input, instruction) = be_u8(input)?;
    let (input, _parity_q) = take(2usize)(input)?;
    let (input, raw_data) = take(PACKET_DATA_SIZE)(input)?;
    let (input, _parity_p) = take(4usize)(input)?;

    let mut data = [0u8; PACKET_DATA_SIZE];
    for (dst, src) in data.iter_mut().zip(raw_data) {
        *dst = src & SUBCODE_MASK;
    }

    Ok((
        input,
        SubcodePacket {
            command: command & SUBCODE_MASK,
            instruction: instruction & SUBCODE_MASK,
            data,
        },
    ))
}

impl SubcodePacket {
    /// Parse a packet from the start of `bytes`.
    ///
    /// Returns `None` when fewer than [`PACKET_SIZE`] bytes are available;
    /// a short tail is end of stream, not a decode error.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        subcode_packet(bytes).ok().map(|(_, packet)| packet)
    }

    /// Parse the packet with the given index out of a whole stream buffer
    pub fn at(buffer: &[u8], index: usize) -> Option<Self> {
        let start = index.checked_mul(PACKET_SIZE)?;
        buffer.get(start..).and_then(Self::parse)
    }

    /// Build a packet from already-masked fields (handy for synthesizing streams)
    pub fn new(command: u8, instruction: u8, data: [u8; PACKET_DATA_SIZE]) -> Self {
        let mut masked = data;
        for byte in masked.iter_mut() {
            *byte &= SUBCODE_MASK;
        }
        SubcodePacket {
            command: command & SUBCODE_MASK,
            instruction: instruction & SUBCODE_MASK,
            data: masked,
        }
    }

    /// Check whether this packet carries a graphics instruction
    #[inline]
    pub fn is_cdg(&self) -> bool {
        self.command == CDG_COMMAND
    }

    /// Decode the typed instruction carried by this packet
    pub fn instruction(&self) -> Instruction {
        Instruction::decode(self)
    }

    /// Serialize back to the 24-byte wire layout (parity bytes zeroed)
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut bytes = [0u8; PACKET_SIZE];
        bytes[0] = self.command;
        bytes[1] = self.instruction;
        bytes[4..4 + PACKET_DATA_SIZE].copy_from_slice(&self.data);
        bytes
    }
}
