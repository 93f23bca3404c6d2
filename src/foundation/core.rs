use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::foundation::error::{ReelError, ReelResult};

/// One decoded raster image.
///
/// Frames are either single-channel (8-bit luma) or three-channel (8-bit RGB). Width and
/// height are fixed once the frame exists; transforms that change pixel content never change
/// geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Frame {
    /// Build a frame from tightly packed row-major bytes.
    ///
    /// `channels` must be 1 (gray) or 3 (RGB).
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| ReelError::validation("frame buffer size overflow"))?;
        if data.len() != expected {
            return Err(ReelError::validation(format!(
                "frame buffer has {} bytes, expected {expected} for {width}x{height}x{channels}",
                data.len()
            )));
        }
        match channels {
            1 => GrayImage::from_raw(width, height, data)
                .map(Frame::Gray)
                .ok_or_else(|| ReelError::validation("invalid gray frame buffer")),
            3 => RgbImage::from_raw(width, height, data)
                .map(Frame::Rgb)
                .ok_or_else(|| ReelError::validation("invalid rgb frame buffer")),
            n => Err(ReelError::validation(format!(
                "unsupported channel count {n} (expected 1 or 3)"
            ))),
        }
    }

    pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Frame::Rgb(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    pub fn solid_gray(width: u32, height: u32, luma: u8) -> Self {
        Frame::Gray(GrayImage::from_pixel(width, height, Luma([luma])))
    }

    pub fn width(&self) -> u32 {
        match self {
            Frame::Gray(img) => img.width(),
            Frame::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Gray(img) => img.height(),
            Frame::Rgb(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn channels(&self) -> usize {
        match self {
            Frame::Gray(_) => 1,
            Frame::Rgb(_) => 3,
        }
    }

    pub fn is_multi_channel(&self) -> bool {
        matches!(self, Frame::Rgb(_))
    }

    /// Row-major pixel bytes, `channels()` bytes per pixel.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Frame::Gray(img) => img.as_raw(),
            Frame::Rgb(img) => img.as_raw(),
        }
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        match self {
            Frame::Gray(img) => &mut **img,
            Frame::Rgb(img) => &mut **img,
        }
    }
}

impl From<GrayImage> for Frame {
    fn from(img: GrayImage) -> Self {
        Frame::Gray(img)
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        Frame::Rgb(img)
    }
}
