use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    core::Frame,
    error::{ReelError, ReelResult},
};

#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read stream geometry with `ffprobe`. Every failure is a [`ReelError::SourceUnavailable`].
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let unavailable = |reason: String| ReelError::source_unavailable(source_path, reason);

    if !source_path.is_file() {
        return Err(unavailable("file not found".to_string()));
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| unavailable(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(unavailable(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| unavailable(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| unavailable("no video stream found".to_string()))?;
    let (width, height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(unavailable("missing video dimensions".to_string())),
    };
    let (fps_num, fps_den) =
        parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1")).unwrap_or((0, 1));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
    })
}

/// Decode every frame of the source as packed RGB.
pub fn decode_video_frames(source: &VideoSourceInfo) -> ReelResult<Vec<Frame>> {
    let unavailable = |reason: String| ReelError::source_unavailable(&source.source_path, reason);

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(&source.source_path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
        .output()
        .map_err(|e| unavailable(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(unavailable(format!(
            "ffmpeg video decode failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frames = split_rgb24_frames(out.stdout, source.width, source.height)
        .map_err(|e| unavailable(e.to_string()))?;
    tracing::debug!(
        source = %source.source_path.display(),
        frames = frames.len(),
        width = source.width,
        height = source.height,
        fps = source.source_fps(),
        "decoded video"
    );
    Ok(frames)
}

/// Split a raw `rgb24` byte stream into frames of `width`x`height`.
pub fn split_rgb24_frames(bytes: Vec<u8>, width: u32, height: u32) -> ReelResult<Vec<Frame>> {
    let frame_len = width as usize * height as usize * 3;
    if frame_len == 0 {
        return Err(ReelError::validation(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !bytes.len().is_multiple_of(frame_len) {
        return Err(ReelError::validation(format!(
            "decoded video has invalid size: got {} bytes, expected multiples of {frame_len}",
            bytes.len()
        )));
    }

    bytes
        .chunks_exact(frame_len)
        .map(|chunk| Frame::from_raw(width, height, 3, chunk.to_vec()))
        .collect()
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.split_once('/')?;
    let num = num.trim().parse::<u32>().ok()?;
    let den = den.trim().parse::<u32>().ok()?;
    if den == 0 {
        return None;
    }
    Some((num, den))
}
