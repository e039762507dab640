//! CDG File Loader
//!
//! Reads a whole `.cdg` file into memory and builds a stream from it.

use crate::replayer::{CdgStream, TimingConfig};
use crate::{CdgError, Result};
use std::fs;
use std::path::Path;

/// Loads CDG files from disk
pub struct CdgFileLoader;

impl CdgFileLoader {
    /// Load a CDG file with default timing
    pub fn load<P: AsRef<Path>>(path: P) -> Result<CdgStream> {
        Self::load_with_config(path, TimingConfig::default())
    }

    /// Load a CDG file with custom timing
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: TimingConfig) -> Result<CdgStream> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            log::warn!("Failed to read CDG file '{}': {}", path.display(), e);
            CdgError::Io(e)
        })?;

        let stream = CdgStream::with_config(data, config).map_err(|e| match e {
            CdgError::LoadError(msg) => {
                CdgError::LoadError(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })?;

        log::info!(
            "Loaded CDG '{}': {} packets, {} ms",
            path.display(),
            stream.packet_count(),
            stream.total_duration_ms()
        );
        Ok(stream)
    }
}
