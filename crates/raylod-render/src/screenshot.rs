//! Image output for traced frames.

use std::path::Path;

use image::{ImageBuffer, Rgba};
use tracing::info;

use crate::debug::DebugView;
use crate::error::{RenderError, Result};
use crate::tracer::LodFrame;

/// Save RGBA pixel data to an image file.
///
/// # Arguments
/// * `data` - Raw RGBA pixel data (4 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `path` - Output file path (format determined by extension)
pub fn save_rgba(data: Vec<u8>, width: u32, height: u32, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let image = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data)
        .ok_or(RenderError::InvalidImageData)?;
    image.save(path)?;

    info!("Screenshot saved: {}", path.display());
    Ok(())
}

/// Render `frame` through `view` and save it.
pub fn save_debug_view(frame: &LodFrame, view: DebugView, path: impl AsRef<Path>) -> Result<()> {
    save_rgba(view.render(frame), frame.width(), frame.height(), path)
}
