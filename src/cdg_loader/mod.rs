//! CDG File Loader Domain
//!
//! Handles file I/O for `.cdg` files. Archive extraction is left to the
//! caller, which can hand the extracted bytes to
//! [`CdgStream::from_bytes`](crate::replayer::CdgStream::from_bytes).

pub mod loader;

pub use loader::CdgFileLoader;

use crate::replayer::CdgStream;
use crate::Result;
use std::path::Path;

/// Convenience function to load a CDG file from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<CdgStream> {
    CdgFileLoader::load(path)
}
