//! Packet Timeline
//!
//! Tracks the decode cursor in whole packets. The packet count is the
//! authoritative position; milliseconds are always derived from it, so
//! conversions never accumulate drift.

use super::CDG_PACKET_RATE;

/// Packet cursor with packet/time conversions at the fixed CDG packet rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketClock {
    /// Packets consumed since the start of the stream
    packets: u64,
}

impl PacketClock {
    /// Create a clock at packet zero
    pub fn new() -> Self {
        PacketClock { packets: 0 }
    }

    /// Count one consumed packet
    pub fn tick(&mut self) {
        self.packets += 1;
    }

    /// Packets consumed so far
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Return to packet zero
    pub fn reset(&mut self) {
        self.packets = 0;
    }

    /// Convert a packet count to milliseconds (rounds down)
    pub fn packets_to_ms(&self, packets: u64) -> u64 {
        packets.saturating_mul(1000) / u64::from(CDG_PACKET_RATE)
    }

    /// Convert milliseconds to a packet index (rounds down)
    pub fn ms_to_packets(&self, ms: u64) -> u64 {
        ms.saturating_mul(u64::from(CDG_PACKET_RATE)) / 1000
    }

    /// Current position in milliseconds
    pub fn position_ms(&self) -> u64 {
        self.packets_to_ms(self.packets)
    }

    /// Current position in seconds, without millisecond truncation
    pub fn position_seconds(&self) -> f64 {
        self.packets as f64 / f64::from(CDG_PACKET_RATE)
    }
}
