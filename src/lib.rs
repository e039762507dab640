//! CD+Graphics (CDG) Decoder and Timed Playback Engine
//!
//! Decodes the subcode graphics stream that accompanies karaoke tracks into
//! a 300x216 indexed-color image and paces the decode against playback time.
//! The stream is a headerless sequence of 24-byte packets at a fixed rate of
//! 300 packets per second.
//!
//! # Features
//! - Bit-exact decoding of all CDG graphics instructions
//! - Tile framebuffer with palette, XOR drawing and preset/copy scrolling
//! - Frame gating (visible change + maximum frame rate) with duration hints
//! - Deterministic seek and rewind by replay
//! - Indexed, RGB and RGBA output of the visible region
//!
//! # Crate feature flags
//! - `loader` (default): Load `.cdg` files from disk (`cdg_loader`)
//! - `shared` (opt-in): Thread-shareable stream handle (`shared`, enables `parking_lot`)
//! - `export-png` (opt-in): PNG export of decoded frames (`export`, enables `png`)
//!
//! # Quick start
//! ```no_run
//! use cdg::replayer::CdgStream;
//!
//! let data = std::fs::read("song.cdg").unwrap();
//! let mut stream = CdgStream::from_bytes(data).unwrap();
//! while let Some(frame) = stream.advance_to_next_visible_frame() {
//!     let image = stream.rgb_image();
//!     // hand `image` to the renderer, repaint again in `frame.duration_ms`
//!     # let _ = (image, frame);
//! }
//! ```
//!
//! ## Following the audio clock
//! ```no_run
//! use cdg::replayer::CdgStream;
//!
//! # let audio_position_ms = || 0u64;
//! let mut stream = CdgStream::from_bytes(std::fs::read("song.cdg").unwrap()).unwrap();
//! // on every UI tick:
//! if stream.frame_for_position(audio_position_ms()).is_some() {
//!     let _image = stream.rgb_image();
//! }
//! ```

#![warn(missing_docs)]

pub mod cdg_parser; // Packet and Instruction Decoding
#[cfg(feature = "loader")]
pub mod cdg_loader; // CDG File I/O
pub mod export; // Frame Export
pub mod framebuffer; // Tile Framebuffer and Palette
pub mod replayer; // Stream Reader, Frame Scheduler, Seek
#[cfg(feature = "shared")]
pub mod shared; // Thread-shareable Handle

/// Error types for CDG decoding and playback
#[derive(thiserror::Error, Debug)]
pub enum CdgError {
    /// Data could not be turned into a stream (e.g. shorter than one packet)
    #[error("Load error: {0}")]
    LoadError(String),

    /// IO error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Seek target lies past the end of the stream
    #[error("Seek to {target_ms} ms is past the end of the stream ({duration_ms} ms)")]
    OutOfRange {
        /// Requested position
        target_ms: u64,
        /// Stream length
        duration_ms: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Error writing an exported frame
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Result type for CDG operations
pub type Result<T> = std::result::Result<T, CdgError>;

// Public API exports
pub use cdg_parser::{Instruction, SubcodePacket, PACKET_SIZE};
#[cfg(feature = "loader")]
pub use cdg_loader::load_file;
pub use framebuffer::{ChangeFlags, DisplayGeometry, Palette, Rgb, RgbImage, TileFramebuffer};
pub use replayer::{CdgStream, Frame, StreamState, TimingConfig};
#[cfg(feature = "shared")]
pub use shared::SharedCdgStream;
