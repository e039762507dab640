//! PNG export for decoded frames

use super::{prepare_image, ExportConfig};
use crate::framebuffer::RgbaImage;
use crate::replayer::CdgStream;
use crate::{CdgError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write an RGBA image to a PNG file
pub fn write_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    let mut writer = encoder
        .write_header()
        .map_err(|e| CdgError::ExportError(format!("PNG header: {e}")))?;

    writer
        .write_image_data(&image.data)
        .map_err(|e| CdgError::ExportError(format!("PNG data: {e}")))?;

    Ok(())
}

/// Export the stream's current visible image as PNG
pub fn export_frame_png<P: AsRef<Path>>(
    stream: &CdgStream,
    path: P,
    config: &ExportConfig,
) -> Result<()> {
    let image = prepare_image(&stream.rgba_image(), config);
    write_png(&image, path.as_ref())?;
    log::debug!(
        "Exported frame at {} ms to '{}'",
        stream.current_position_ms(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdg_parser::PACKET_SIZE;

    #[test]
    fn test_export_frame_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let stream = CdgStream::from_bytes(vec![0u8; PACKET_SIZE * 10]).unwrap();

        export_frame_png(&stream, &path, &ExportConfig::with_scale(2)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 8);
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
