//! Frame export
//!
//! Writes decoded frames to image files, for thumbnails and debugging.
//!
//! ```no_run
//! # #[cfg(feature = "export-png")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cdg::export::{export_frame_png, ExportConfig};
//! use cdg::replayer::CdgStream;
//!
//! let mut stream = CdgStream::from_bytes(std::fs::read("song.cdg")?)?;
//! stream.seek(30_000)?;
//! export_frame_png(&stream, "frame.png", &ExportConfig::with_scale(2))?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "export-png"))]
//! # fn main() {}
//! ```

#[cfg(feature = "export-png")]
mod png_frame;
#[cfg(feature = "export-png")]
pub use png_frame::*;

use crate::framebuffer::RgbaImage;

/// Export configuration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportConfig {
    /// Integer upscale factor (1 keeps the 294x204 visible size)
    pub scale: u32,
    /// Keep the transparent index as alpha 0 (otherwise fully opaque)
    pub transparency: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            transparency: false,
        }
    }
}

impl ExportConfig {
    /// Create config with an upscale factor
    pub fn with_scale(scale: u32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Keep transparency in the exported image
    pub fn transparency(mut self, enable: bool) -> Self {
        self.transparency = enable;
        self
    }
}

/// Apply the export options to a frame image
#[cfg_attr(not(feature = "export-png"), allow(dead_code))]
fn prepare_image(image: &RgbaImage, config: &ExportConfig) -> RgbaImage {
    let mut image = image.upscale(config.scale);
    if !config.transparency {
        for alpha in image.data.iter_mut().skip(3).step_by(4) {
            *alpha = 255;
        }
    }
    image
}
