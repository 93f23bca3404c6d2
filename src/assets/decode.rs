use std::path::Path;

use crate::{
    core::Frame,
    error::{ReelError, ReelResult},
};

/// Decode a still image into an RGB frame. Alpha is dropped; animated formats yield their first
/// frame.
pub fn decode_image_file(path: &Path) -> ReelResult<Frame> {
    if !path.is_file() {
        return Err(ReelError::source_unavailable(path, "file not found"));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| ReelError::source_unavailable(path, format!("read failed: {e}")))?;
    decode_image(&bytes).map_err(|e| ReelError::source_unavailable(path, e.to_string()))
}

pub fn decode_image(bytes: &[u8]) -> ReelResult<Frame> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ReelError::validation(format!("decode image from memory: {e}")))?;
    let rgb = dyn_img.to_rgb8();
    tracing::debug!(
        width = rgb.width(),
        height = rgb.height(),
        "decoded image"
    );
    Ok(Frame::Rgb(rgb))
}
