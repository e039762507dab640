//! Playback Engine
//!
//! Paces CDG decoding against playback time. The stream is pull-based: the
//! caller asks for the next displayable frame (or a seek) and the engine
//! decodes exactly as many packets as that requires. There is no internal
//! clock or thread.

pub mod cdg_stream;
pub mod timeline;

pub use cdg_stream::CdgStream;
pub use timeline::PacketClock;

use crate::{CdgError, Result};
use serde::{Deserialize, Serialize};

/// Packets per second defined by the CD+G format
pub const CDG_PACKET_RATE: u32 = 300;

/// Default ceiling on delivered frames per second
pub const DEFAULT_MAX_FPS: u32 = 60;

/// Timing configuration for a stream.
///
/// The packet rate is fixed by the format at [`CDG_PACKET_RATE`]; only the
/// frame ceiling is adjustable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Maximum frames per second delivered by the frame gate
    pub max_fps: u32,
}

impl TimingConfig {
    /// Config with a custom frame ceiling
    pub fn with_max_fps(max_fps: u32) -> Self {
        TimingConfig { max_fps }
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TimingConfig = serde_json::from_str(json)
            .map_err(|e| CdgError::ConfigError(format!("Invalid timing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the frame gate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_fps == 0 {
            return Err(CdgError::ConfigError(
                "max_fps must be greater than zero".to_string(),
            ));
        }
        if self.max_fps > CDG_PACKET_RATE {
            return Err(CdgError::ConfigError(format!(
                "max_fps {} exceeds the packet rate {}",
                self.max_fps, CDG_PACKET_RATE
            )));
        }
        Ok(())
    }

    /// Minimum packets between two delivered frames
    pub fn packets_per_frame(&self) -> u64 {
        (CDG_PACKET_RATE / self.max_fps.max(1)).max(1) as u64
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            max_fps: DEFAULT_MAX_FPS,
        }
    }
}

/// Where the stream is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Nothing decoded yet (fresh or rewound)
    #[default]
    AtStart,
    /// Decoding is in progress
    Streaming,
    /// Every packet has been consumed
    EndOfStream,
}

/// A displayable frame reported by the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Packets consumed when this frame was produced
    pub packet_index: u64,
    /// Timestamp derived from `packet_index`
    pub position_ms: u64,
    /// Expected time until the next frame; a scheduling hint only
    pub duration_ms: u64,
}
