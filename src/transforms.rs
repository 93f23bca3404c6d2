//! Per-frame operations of the pipeline catalog.
//!
//! Every sequence-level function maps each frame independently and keeps order and count.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::{
    blur_cpu::blur_u8,
    core::Frame,
    error::ReelResult,
    font,
    sequence::FrameSequence,
};

/// Text is drawn at this multiple of the base glyph cell size.
pub const TEXT_SCALE: u32 = 1;

pub fn grayscale(seq: FrameSequence) -> ReelResult<FrameSequence> {
    seq.map_frames(|f| Ok(grayscale_frame(f)))
}

pub fn to_multi_channel(seq: FrameSequence) -> ReelResult<FrameSequence> {
    seq.map_frames(|f| Ok(to_multi_channel_frame(f)))
}

pub fn blur(seq: FrameSequence, kernel: (u32, u32)) -> ReelResult<FrameSequence> {
    seq.map_frames(|f| blur_frame(f, kernel))
}

pub fn overlay_text(
    seq: FrameSequence,
    text: &str,
    position: (i32, i32),
    color: [u8; 3],
) -> ReelResult<FrameSequence> {
    seq.map_frames(|mut f| {
        draw_text(&mut f, text, position, color);
        Ok(f)
    })
}

/// BT.601 luma in 16.16 fixed point; the weights sum to exactly 65536.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let y = 19_595 * u32::from(rgb[0]) + 38_470 * u32::from(rgb[1]) + 7_471 * u32::from(rgb[2]);
    ((y + 32_768) >> 16) as u8
}

pub fn grayscale_frame(frame: Frame) -> Frame {
    match frame {
        Frame::Gray(_) => frame,
        Frame::Rgb(img) => {
            let (w, h) = img.dimensions();
            let data = img
                .as_raw()
                .chunks_exact(3)
                .map(|px| luma([px[0], px[1], px[2]]))
                .collect::<Vec<_>>();
            GrayImage::from_raw(w, h, data)
                .map(Frame::Gray)
                .unwrap_or_else(|| Frame::Gray(GrayImage::new(w, h)))
        }
    }
}

pub fn to_multi_channel_frame(frame: Frame) -> Frame {
    match frame {
        Frame::Rgb(_) => frame,
        Frame::Gray(img) => {
            let (w, h) = img.dimensions();
            Frame::Rgb(RgbImage::from_fn(w, h, |x, y| {
                let Luma([v]) = *img.get_pixel(x, y);
                Rgb([v, v, v])
            }))
        }
    }
}

pub fn blur_frame(frame: Frame, kernel: (u32, u32)) -> ReelResult<Frame> {
    let (w, h) = frame.dimensions();
    let out = blur_u8(frame.as_raw(), w, h, frame.channels(), kernel)?;
    Frame::from_raw(w, h, frame.channels(), out)
}

/// Draw `text` into `frame` with its bottom-left corner at `position`. Out-of-frame pixels are
/// clipped.
pub fn draw_text(frame: &mut Frame, text: &str, position: (i32, i32), color: [u8; 3]) {
    let (w, h) = frame.dimensions();
    let (w, h) = (i64::from(w), i64::from(h));
    let (x0, y0, x1, y1) = font::text_bounds(text, position, TEXT_SCALE);
    if x1 <= 0 || y1 <= 0 || x0 >= w || y0 >= h {
        tracing::debug!(text, ?position, "text lies entirely outside the frame");
        return;
    }
    let channels = frame.channels();
    let gray = [luma(color)];
    let ink: &[u8] = if channels == 1 { &gray } else { &color };
    let buf = frame.as_raw_mut();

    font::for_each_lit_pixel(text, position, TEXT_SCALE, |x, y| {
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let idx = (y as usize * w as usize + x as usize) * channels;
        buf[idx..idx + channels].copy_from_slice(ink);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_uses_bt601_weights() {
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }

    #[test]
    fn grayscale_converts_rgb_and_keeps_gray() {
        let seq = FrameSequence::from_frames(vec![
            Frame::solid_rgb(2, 2, [255, 0, 0]),
            Frame::solid_gray(2, 2, 42),
        ]);
        let out = grayscale(seq).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.frames()[0], Frame::solid_gray(2, 2, 76));
        assert_eq!(out.frames()[1], Frame::solid_gray(2, 2, 42));
    }

    #[test]
    fn to_multi_channel_is_idempotent() {
        let seq = FrameSequence::from_frames(vec![
            Frame::solid_gray(3, 1, 9),
            Frame::solid_rgb(3, 1, [1, 2, 3]),
        ]);
        let once = to_multi_channel(seq).unwrap();
        let twice = to_multi_channel(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.frames()[0], Frame::solid_rgb(3, 1, [9, 9, 9]));
        assert_eq!(once.frames()[1], Frame::solid_rgb(3, 1, [1, 2, 3]));
    }

    #[test]
    fn blur_keeps_geometry_and_layout() {
        let seq = FrameSequence::from_frames(vec![
            Frame::solid_gray(8, 6, 100),
            Frame::solid_rgb(5, 5, [10, 20, 30]),
        ]);
        let out = blur(seq, (9, 9)).unwrap();
        assert_eq!(out.frames()[0], Frame::solid_gray(8, 6, 100));
        assert_eq!(out.frames()[1], Frame::solid_rgb(5, 5, [10, 20, 30]));
    }

    #[test]
    fn blur_rejects_even_kernel() {
        let seq = FrameSequence::from_frames(vec![Frame::solid_gray(4, 4, 0)]);
        assert!(blur(seq, (2, 3)).is_err());
    }

    #[test]
    fn overlay_text_draws_inside_frame_only() {
        let seq = FrameSequence::from_frames(vec![Frame::solid_rgb(64, 32, [0, 0, 0])]);
        let out = overlay_text(seq, "Hi", (2, 30), [0, 255, 0]).unwrap();
        let frame = &out.frames()[0];
        assert_eq!(frame.dimensions(), (64, 32));

        let lit = frame
            .as_raw()
            .chunks_exact(3)
            .filter(|px| *px == [0, 255, 0])
            .count();
        assert!(lit > 0);
        assert!(
            frame
                .as_raw()
                .chunks_exact(3)
                .all(|px| *px == [0, 0, 0] || *px == [0, 255, 0])
        );
    }

    #[test]
    fn overlay_text_clips_offscreen_positions() {
        let mut f = Frame::solid_rgb(10, 10, [0, 0, 0]);
        draw_text(&mut f, "WWWW", (-40, 200), [255, 255, 255]);
        assert_eq!(f, Frame::solid_rgb(10, 10, [0, 0, 0]));

        draw_text(&mut f, "M", (-3, 12), [255, 255, 255]);
        assert_ne!(f, Frame::solid_rgb(10, 10, [0, 0, 0]));
    }

    #[test]
    fn overlay_text_on_gray_uses_luma_of_color() {
        let mut f = Frame::solid_gray(30, 30, 0);
        draw_text(&mut f, "I", (0, 25), [255, 0, 0]);
        assert!(f.as_raw().contains(&76));
        assert!(f.as_raw().iter().all(|&v| v == 0 || v == 76));
    }
}
