//! CDG Stream Player
//!
//! Owns one song's packet buffer, the decode cursor and the framebuffer, and
//! turns elapsed playback time into a sequence of displayable frames.
//!
//! Frames are gated two ways: something visible must have changed since the
//! last delivered frame, and at least [`TimingConfig::packets_per_frame`]
//! packets must separate the two. Many packets in a CDG stream draw nothing,
//! and showing every visible change would far exceed a sane frame rate.

use super::{Frame, PacketClock, StreamState, TimingConfig};
use crate::cdg_parser::{self, SubcodePacket, PACKET_SIZE};
use crate::framebuffer::{ChangeFlags, DisplayGeometry, RgbImage, RgbaImage, TileFramebuffer};
use crate::{CdgError, Result};
use std::fmt;

/// Decoder and frame scheduler for one CDG stream
#[derive(Clone, PartialEq, Eq)]
pub struct CdgStream {
    data: Vec<u8>,
    packet_count: u64,
    duration_ms: u64,
    config: TimingConfig,
    clock: PacketClock,
    framebuffer: TileFramebuffer,
    /// Changes accumulated since the last delivered frame
    pending: ChangeFlags,
    /// Packet index of the last delivered frame
    last_frame_packet: u64,
    state: StreamState,
}

impl CdgStream {
    /// Build a stream from a whole `.cdg` buffer with default timing
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::with_config(data, TimingConfig::default())
    }

    /// Build a stream from a whole `.cdg` buffer with custom timing
    pub fn with_config(data: Vec<u8>, config: TimingConfig) -> Result<Self> {
        config.validate()?;

        if data.len() < PACKET_SIZE {
            return Err(CdgError::LoadError(format!(
                "CDG data is {} bytes, shorter than one {}-byte packet",
                data.len(),
                PACKET_SIZE
            )));
        }

        let trailing = data.len() % PACKET_SIZE;
        if trailing != 0 {
            log::debug!("Ignoring {trailing} trailing bytes after the last whole packet");
        }

        let clock = PacketClock::new();
        let packet_count = cdg_parser::packet_count(&data) as u64;
        let duration_ms = clock.packets_to_ms(packet_count);

        Ok(CdgStream {
            data,
            packet_count,
            duration_ms,
            config,
            clock,
            framebuffer: TileFramebuffer::new(),
            pending: ChangeFlags::empty(),
            last_frame_packet: 0,
            state: StreamState::AtStart,
        })
    }

    /// Number of whole packets in the stream
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Length of the stream in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Packets consumed so far
    pub fn current_packet(&self) -> u64 {
        self.clock.packets()
    }

    /// Current decode position in milliseconds
    pub fn current_position_ms(&self) -> u64 {
        self.clock.position_ms()
    }

    /// Current decode position in seconds, for hosts with a float clock
    pub fn current_position_seconds(&self) -> f64 {
        self.clock.position_seconds()
    }

    /// True once fewer than one whole packet remains after the cursor
    pub fn is_end_of_stream(&self) -> bool {
        let consumed = (self.clock.packets() as usize).saturating_mul(PACKET_SIZE);
        consumed.saturating_add(PACKET_SIZE) > self.data.len()
    }

    /// Lifecycle state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Timing configuration
    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Current screen state
    pub fn framebuffer(&self) -> &TileFramebuffer {
        &self.framebuffer
    }

    /// Size of the images produced by this stream
    pub fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry::CDG
    }

    /// Current visible image with the palette applied
    pub fn rgb_image(&self) -> RgbImage {
        self.framebuffer.rgb_image()
    }

    /// Current visible image with transparency
    pub fn rgba_image(&self) -> RgbaImage {
        self.framebuffer.rgba_image()
    }

    /// Decode and apply the packet under the cursor.
    ///
    /// Returns `None` at end of stream.
    fn step(&mut self) -> Option<ChangeFlags> {
        if self.clock.packets() >= self.packet_count {
            return None;
        }
        let packet = SubcodePacket::at(&self.data, self.clock.packets() as usize)?;
        let changes = self.framebuffer.apply(&packet.instruction());
        self.clock.tick();
        Some(changes)
    }

    /// Apply every packet up to (not including) `target`, without gating
    fn fast_forward(&mut self, target: u64) {
        while self.clock.packets() < target {
            match self.step() {
                Some(changes) => self.pending |= changes,
                None => break,
            }
        }
    }

    fn frame_gate_open(&self) -> bool {
        !self.pending.is_empty()
            && self.clock.packets() - self.last_frame_packet >= self.config.packets_per_frame()
    }

    /// Index of the next packet at or after `from` that carries a drawing instruction
    fn next_drawing_packet(&self, from: u64) -> Option<u64> {
        (from..self.packet_count).find(|&index| {
            SubcodePacket::at(&self.data, index as usize)
                .is_some_and(|packet| packet.instruction().is_drawing())
        })
    }

    /// Mark the current cursor as a delivered frame
    fn publish_frame(&mut self) -> Frame {
        let index = self.clock.packets();
        self.last_frame_packet = index;
        self.pending = ChangeFlags::empty();

        let delta = match self.next_drawing_packet(index) {
            Some(next) => (next + 1 - index).max(self.config.packets_per_frame()),
            None => self.packet_count - index,
        };

        let frame = Frame {
            packet_index: index,
            position_ms: self.clock.packets_to_ms(index),
            duration_ms: self.clock.packets_to_ms(delta),
        };
        log::trace!(
            "Frame at packet {} ({} ms), next in {} ms",
            frame.packet_index,
            frame.position_ms,
            frame.duration_ms
        );
        frame
    }

    /// Decode until the next displayable frame.
    ///
    /// Returns `None` once the stream is exhausted; the stream is then in
    /// [`StreamState::EndOfStream`] and stays there until a seek or rewind.
    pub fn advance_to_next_visible_frame(&mut self) -> Option<Frame> {
        if self.state == StreamState::EndOfStream {
            return None;
        }

        while let Some(changes) = self.step() {
            self.state = StreamState::Streaming;
            self.pending |= changes;
            if self.frame_gate_open() {
                if self.clock.packets() >= self.packet_count {
                    self.state = StreamState::EndOfStream;
                }
                return Some(self.publish_frame());
            }
        }

        self.state = StreamState::EndOfStream;
        None
    }

    /// Catch the decoder up to an elapsed playback time.
    ///
    /// Applies every packet up to `position_ms` and returns a frame if the
    /// gate allows one there. A position behind the cursor returns `None`;
    /// use [`seek`](Self::seek) to go backwards.
    pub fn frame_for_position(&mut self, position_ms: u64) -> Option<Frame> {
        if self.state == StreamState::EndOfStream {
            return None;
        }

        let target = self.clock.ms_to_packets(position_ms).min(self.packet_count);
        if target <= self.clock.packets() {
            return None;
        }

        self.fast_forward(target);
        self.state = if self.clock.packets() >= self.packet_count {
            StreamState::EndOfStream
        } else {
            StreamState::Streaming
        };

        if self.frame_gate_open() {
            Some(self.publish_frame())
        } else {
            None
        }
    }

    /// Jump to a playback time.
    ///
    /// Seeking backwards resets the framebuffer and replays from the first
    /// packet; seeking forwards applies every packet in between. Either way
    /// the screen ends up exactly as a straight decode would have left it, and
    /// the returned frame describes the image at the target position.
    ///
    /// A target past the end fails with [`CdgError::OutOfRange`] and leaves
    /// the stream fully decoded, in [`StreamState::EndOfStream`].
    pub fn seek(&mut self, target_ms: u64) -> Result<Frame> {
        let target = self.clock.ms_to_packets(target_ms);
        log::debug!(
            "Seek to {target_ms} ms (packet {target}) from packet {}",
            self.clock.packets()
        );

        if target > self.packet_count {
            self.fast_forward(self.packet_count);
            self.state = StreamState::EndOfStream;
            return Err(CdgError::OutOfRange {
                target_ms,
                duration_ms: self.duration_ms,
            });
        }

        if target < self.clock.packets() {
            self.reset_playback();
        }
        self.fast_forward(target);

        self.state = if target >= self.packet_count {
            StreamState::EndOfStream
        } else {
            StreamState::Streaming
        };
        Ok(self.publish_frame())
    }

    /// Return to the exact state of a freshly constructed stream
    pub fn rewind(&mut self) {
        log::debug!("Rewind from packet {}", self.clock.packets());
        self.reset_playback();
        self.state = StreamState::AtStart;
    }

    fn reset_playback(&mut self) {
        self.framebuffer.reset();
        self.clock.reset();
        self.pending = ChangeFlags::empty();
        self.last_frame_packet = 0;
    }
}

impl fmt::Debug for CdgStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdgStream")
            .field("bytes", &self.data.len())
            .field("packet_count", &self.packet_count)
            .field("duration_ms", &self.duration_ms)
            .field("packet", &self.clock.packets())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdg_parser::{InstructionCode, CDG_COMMAND};

    fn preset(color: u8) -> [u8; PACKET_SIZE] {
        let mut data = [0u8; 16];
        data[0] = color;
        SubcodePacket::new(CDG_COMMAND, InstructionCode::MemoryPreset as u8, data).to_bytes()
    }

    fn noop() -> [u8; PACKET_SIZE] {
        [0u8; PACKET_SIZE]
    }

    fn build(packets: &[[u8; PACKET_SIZE]]) -> Vec<u8> {
        packets.iter().flatten().copied().collect()
    }

    #[test]
    fn test_short_buffer_is_load_error() {
        let err = CdgStream::from_bytes(vec![0u8; 23]).unwrap_err();
        assert!(matches!(err, CdgError::LoadError(_)));
        assert!(CdgStream::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let data = build(&[noop()]);
        let err = CdgStream::with_config(data, TimingConfig::with_max_fps(0)).unwrap_err();
        assert!(matches!(err, CdgError::ConfigError(_)));
    }

    #[test]
    fn test_duration_and_end_of_stream() {
        let mut data = build(&vec![noop(); 600]);
        data.extend_from_slice(&[0u8; 10]);
        let mut stream = CdgStream::from_bytes(data).unwrap();
        assert_eq!(stream.packet_count(), 600);
        assert_eq!(stream.total_duration_ms(), 2000);
        assert!(!stream.is_end_of_stream());
        assert_eq!(stream.state(), StreamState::AtStart);

        // Nothing but no-ops: no frame, straight to the end
        assert_eq!(stream.advance_to_next_visible_frame(), None);
        assert!(stream.is_end_of_stream());
        assert_eq!(stream.state(), StreamState::EndOfStream);
        assert_eq!(stream.current_packet(), 600);
        assert_eq!(stream.advance_to_next_visible_frame(), None);
    }

    #[test]
    fn test_first_frame_waits_for_gate() {
        // Change at packet 0, then no-ops: frame once 5 packets are consumed
        let mut packets = vec![preset(2)];
        packets.extend(vec![noop(); 20]);
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        let frame = stream.advance_to_next_visible_frame().unwrap();
        assert_eq!(frame.packet_index, 5);
        assert_eq!(frame.position_ms, 16);
        assert_eq!(stream.state(), StreamState::Streaming);
        // No drawing packets remain: the hint runs to the end of the stream
        assert_eq!(frame.duration_ms, stream.clock.packets_to_ms(16));
    }

    #[test]
    fn test_duration_hint_uses_next_drawing_packet() {
        let mut packets = vec![noop(); 4];
        packets.push(preset(1)); // index 4 -> frame at 5
        packets.extend(vec![noop(); 25]);
        packets.push(preset(2)); // index 30 -> frame at 31
        packets.extend(vec![noop(); 10]);
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        let first = stream.advance_to_next_visible_frame().unwrap();
        assert_eq!(first.packet_index, 5);
        assert_eq!(first.duration_ms, stream.clock.packets_to_ms(26));

        let second = stream.advance_to_next_visible_frame().unwrap();
        assert_eq!(second.packet_index, 31);
        assert_eq!(stream.advance_to_next_visible_frame(), None);
    }

    #[test]
    fn test_frame_on_last_packet_ends_stream() {
        let mut packets = vec![noop(); 4];
        packets.push(preset(6));
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        let frame = stream.advance_to_next_visible_frame().unwrap();
        assert_eq!(frame.packet_index, 5);
        assert_eq!(frame.duration_ms, 0);
        assert!(stream.is_end_of_stream());
        assert_eq!(stream.state(), StreamState::EndOfStream);
        assert_eq!(stream.framebuffer().pixel(0, 0), Some(6));
        assert_eq!(stream.advance_to_next_visible_frame(), None);
    }

    #[test]
    fn test_lower_frame_ceiling_spaces_frames() {
        // A change on every packet; the gate alone sets the spacing
        let packets: Vec<_> = (0..120).map(|i| preset((i % 2 + 1) as u8)).collect();
        let config = TimingConfig::with_max_fps(30);
        let mut stream = CdgStream::with_config(build(&packets), config).unwrap();

        let mut indices = Vec::new();
        while let Some(frame) = stream.advance_to_next_visible_frame() {
            indices.push(frame.packet_index);
        }

        assert_eq!(indices.first(), Some(&10));
        assert_eq!(indices.len(), 12);
        for pair in indices.windows(2) {
            assert!(pair[1] - pair[0] >= 10, "{pair:?}");
        }
    }

    #[test]
    fn test_frame_ceiling_leaves_packet_rate_alone() {
        let config = TimingConfig::with_max_fps(30);
        let mut stream = CdgStream::with_config(build(&vec![noop(); 300]), config).unwrap();
        assert_eq!(stream.total_duration_ms(), 1000);

        stream.seek(500).unwrap();
        assert_eq!(stream.current_packet(), 150);
        assert_eq!(stream.current_position_ms(), 500);
        approx::assert_relative_eq!(stream.current_position_seconds(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_redundant_presets_do_not_make_frames() {
        let mut packets = vec![preset(3); 40];
        packets.extend(vec![noop(); 5]);
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        assert!(stream.advance_to_next_visible_frame().is_some());
        assert_eq!(stream.advance_to_next_visible_frame(), None);
    }

    #[test]
    fn test_frame_for_position() {
        let mut packets = vec![preset(1)];
        packets.extend(vec![noop(); 99]);
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        // 10 ms = 3 packets: change pending but gate closed
        assert_eq!(stream.frame_for_position(10), None);
        assert_eq!(stream.current_packet(), 3);

        let frame = stream.frame_for_position(100).unwrap();
        assert_eq!(frame.packet_index, 30);

        // Going backwards is the caller's job (seek)
        assert_eq!(stream.frame_for_position(50), None);
        assert_eq!(stream.current_packet(), 30);

        assert_eq!(stream.frame_for_position(1_000_000), None);
        assert_eq!(stream.state(), StreamState::EndOfStream);
    }

    #[test]
    fn test_seek_to_exact_end() {
        let data = build(&vec![noop(); 300]);
        let mut stream = CdgStream::from_bytes(data).unwrap();
        let frame = stream.seek(1000).unwrap();
        assert_eq!(frame.packet_index, 300);
        assert_eq!(frame.duration_ms, 0);
        assert_eq!(stream.state(), StreamState::EndOfStream);
        assert!(stream.is_end_of_stream());
    }

    #[test]
    fn test_seek_back_then_forward_resumes_streaming() {
        let mut packets = vec![preset(4)];
        packets.extend(vec![noop(); 99]);
        let mut stream = CdgStream::from_bytes(build(&packets)).unwrap();

        while stream.advance_to_next_visible_frame().is_some() {}
        assert_eq!(stream.state(), StreamState::EndOfStream);

        let frame = stream.seek(100).unwrap();
        assert_eq!(frame.packet_index, 30);
        assert_eq!(stream.state(), StreamState::Streaming);
        assert_eq!(stream.framebuffer().pixel(0, 0), Some(4));
    }

    #[test]
    fn test_debug_omits_buffer() {
        let stream = CdgStream::from_bytes(build(&[noop(); 3])).unwrap();
        let text = format!("{stream:?}");
        assert!(text.contains("packet_count: 3"));
        assert!(!text.contains("[0, 0"));
    }
}
