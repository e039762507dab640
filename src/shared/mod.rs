//! Thread-shareable stream handle
//!
//! The decoder itself is single-threaded. Applications that poll the audio
//! position on one thread and paint on another can share a stream through
//! [`SharedCdgStream`], which serializes every call behind one lock.

use crate::framebuffer::RgbImage;
use crate::replayer::{CdgStream, Frame, StreamState};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a stream guarded by a mutex
#[derive(Debug, Clone)]
pub struct SharedCdgStream {
    inner: Arc<Mutex<CdgStream>>,
}

impl SharedCdgStream {
    /// Wrap a stream for sharing
    pub fn new(stream: CdgStream) -> Self {
        SharedCdgStream {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// Run a closure with exclusive access to the stream
    pub fn with_stream<R>(&self, f: impl FnOnce(&mut CdgStream) -> R) -> R {
        let mut stream = self.inner.lock();
        f(&mut stream)
    }

    /// See [`CdgStream::advance_to_next_visible_frame`]
    pub fn advance_to_next_visible_frame(&self) -> Option<Frame> {
        self.inner.lock().advance_to_next_visible_frame()
    }

    /// See [`CdgStream::frame_for_position`]
    pub fn frame_for_position(&self, position_ms: u64) -> Option<Frame> {
        self.inner.lock().frame_for_position(position_ms)
    }

    /// See [`CdgStream::seek`]
    pub fn seek(&self, target_ms: u64) -> Result<Frame> {
        self.inner.lock().seek(target_ms)
    }

    /// See [`CdgStream::rewind`]
    pub fn rewind(&self) {
        self.inner.lock().rewind();
    }

    /// Snapshot of the current visible image
    pub fn rgb_image(&self) -> RgbImage {
        self.inner.lock().rgb_image()
    }

    /// Current decode position in milliseconds
    pub fn current_position_ms(&self) -> u64 {
        self.inner.lock().current_position_ms()
    }

    /// Stream length in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.inner.lock().total_duration_ms()
    }

    /// True once every packet has been consumed
    pub fn is_end_of_stream(&self) -> bool {
        self.inner.lock().is_end_of_stream()
    }

    /// Lifecycle state
    pub fn state(&self) -> StreamState {
        self.inner.lock().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdg_parser::{InstructionCode, SubcodePacket, CDG_COMMAND, PACKET_SIZE};
    use std::thread;

    fn stream() -> CdgStream {
        let mut data = SubcodePacket::new(CDG_COMMAND, InstructionCode::MemoryPreset as u8, [5; 16])
            .to_bytes()
            .to_vec();
        data.extend_from_slice(&[0u8; PACKET_SIZE * 299]);
        CdgStream::from_bytes(data).unwrap()
    }

    #[test]
    fn test_shared_across_threads() {
        let shared = SharedCdgStream::new(stream());
        let poller = shared.clone();

        let handle = thread::spawn(move || poller.frame_for_position(500));
        let frame = handle.join().unwrap().unwrap();
        assert_eq!(frame.packet_index, 150);

        assert_eq!(shared.current_position_ms(), 500);
        assert_eq!(shared.state(), StreamState::Streaming);
        assert_eq!(shared.with_stream(|s| s.framebuffer().pixel(10, 10)), Some(5));
    }

    #[test]
    fn test_shared_seek_and_rewind() {
        let shared = SharedCdgStream::new(stream());
        assert!(shared.seek(5000).is_err());
        assert!(shared.is_end_of_stream());

        shared.rewind();
        assert_eq!(shared.current_position_ms(), 0);
        assert_eq!(shared.state(), StreamState::AtStart);
        assert_eq!(shared.total_duration_ms(), 1000);
        assert_eq!(shared.rgb_image().width, 294);
    }
}
