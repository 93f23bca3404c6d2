use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    assets::media::is_tool_on_path,
    core::Frame,
    error::{ReelError, ReelResult},
    sequence::FrameSequence,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub out_path: PathBuf,
    pub fps: u32,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn new(out_path: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            out_path: out_path.into(),
            fps,
            overwrite: true,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(ReelError::validation("encode output path must be non-empty"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeStats {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
}

/// Encode `seq` to an MP4 at `cfg.out_path`.
///
/// Nothing is spawned or written when the sequence is empty ([`ReelError::EmptySequence`]) or
/// when frame sizes differ ([`ReelError::DimensionMismatch`]).
pub fn encode_video(seq: &FrameSequence, cfg: &EncodeConfig) -> ReelResult<EncodeStats> {
    cfg.validate()?;
    let (width, height) = check_uniform_dimensions(seq)?;

    let mut encoder = FfmpegEncoder::new(cfg.clone(), width, height)?;
    for frame in seq {
        if let Err(err) = encoder.encode_frame(frame) {
            encoder.abort();
            return Err(err);
        }
    }
    encoder.finish()?;

    tracing::info!(
        frames = seq.len(),
        width,
        height,
        out = %cfg.out_path.display(),
        "saved video"
    );
    Ok(EncodeStats {
        frames: seq.len(),
        width,
        height,
    })
}

/// Common size of every frame, or the first frame that disagrees with frame 0.
pub fn check_uniform_dimensions(seq: &FrameSequence) -> ReelResult<(u32, u32)> {
    let first = seq.get(0).ok_or(ReelError::EmptySequence)?;
    let expected = first.dimensions();
    for (index, frame) in seq.iter().enumerate().skip(1) {
        let found = frame.dimensions();
        if found != expected {
            return Err(ReelError::DimensionMismatch {
                index,
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::io(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Streams packed RGB frames into a system `ffmpeg` process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, width: u32, height: u32) -> ReelResult<Self> {
        cfg.validate()?;
        if width == 0 || height == 0 {
            return Err(ReelError::validation(
                "encode width/height must be non-zero",
            ));
        }
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_tool_on_path("ffmpeg") {
            return Err(ReelError::io(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            // yuv420p needs even dimensions.
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::io(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::io("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: Vec::with_capacity(width as usize * height as usize * 3),
            cfg,
            width,
            height,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &Frame) -> ReelResult<()> {
        let (w, h) = frame.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {w}x{h}, expected {}x{}",
                self.width, self.height
            )));
        }

        let bytes: &[u8] = match frame {
            Frame::Rgb(img) => img.as_raw(),
            Frame::Gray(img) => {
                expand_gray_to_rgb(&mut self.scratch, img.as_raw());
                &self.scratch
            }
        };

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::io("ffmpeg encoder is already finalized"));
        };

        stdin
            .write_all(bytes)
            .map_err(|e| ReelError::io(format!("failed to write frame to ffmpeg stdin: {e}")))?;

        Ok(())
    }

    pub fn finish(mut self) -> ReelResult<()> {
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| ReelError::io(format!("failed to wait for ffmpeg to finish: {e}")))?;

        if !output.status.success() {
            remove_partial_output(&self.cfg.out_path);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::io(format!(
                "ffmpeg exited with status {} writing '{}': {}",
                output.status,
                self.cfg.out_path.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Stop ffmpeg, reap it and delete whatever it wrote so far.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "ffmpeg already exited");
        }
        if let Err(e) = self.child.wait() {
            tracing::warn!(error = %e, "failed to reap ffmpeg");
        }
        remove_partial_output(&self.cfg.out_path);
    }
}

fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::warn!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output"),
    }
}

fn expand_gray_to_rgb(dst: &mut Vec<u8>, src: &[u8]) {
    dst.clear();
    dst.extend(src.iter().flat_map(|&v| [v, v, v]));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(EncodeConfig::new("out.mp4", 0).validate().is_err());
        assert!(EncodeConfig::new("", 30).validate().is_err());
        assert!(EncodeConfig::new("out.mp4", 30).validate().is_ok());
    }

    #[test]
    fn empty_sequence_writes_nothing() {
        let out = PathBuf::from("target")
            .join("encode_empty_unit")
            .join("out.mp4");
        let _ = std::fs::remove_file(&out);
        let err = encode_video(&FrameSequence::new(), &EncodeConfig::new(&out, 30)).unwrap_err();
        assert!(matches!(err, ReelError::EmptySequence));
        assert!(!out.exists());
    }

    #[test]
    fn mismatched_frames_are_rejected_before_encoding() {
        let seq = FrameSequence::from_frames(vec![
            Frame::solid_rgb(4, 4, [0, 0, 0]),
            Frame::solid_gray(4, 4, 0),
            Frame::solid_rgb(8, 4, [0, 0, 0]),
        ]);
        let err = check_uniform_dimensions(&seq).unwrap_err();
        match err {
            ReelError::DimensionMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 2);
                assert_eq!(expected, (4, 4));
                assert_eq!(found, (8, 4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn gray_expands_to_packed_rgb() {
        let mut dst = vec![9u8; 2];
        expand_gray_to_rgb(&mut dst, &[1, 2]);
        assert_eq!(dst, vec![1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn parent_dir_is_created() {
        let dir = PathBuf::from("target").join("encode_parent_dir").join("nested");
        let _ = std::fs::remove_dir_all(&dir);
        ensure_parent_dir(&dir.join("out.mp4")).unwrap();
        assert!(dir.is_dir());
        ensure_parent_dir(Path::new("bare.mp4")).unwrap();
    }

    #[test]
    fn existing_output_is_kept_without_overwrite() {
        let dir = PathBuf::from("target").join("encode_no_overwrite");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("out.mp4");
        std::fs::write(&out, b"keep").unwrap();

        let seq = FrameSequence::from_frames(vec![Frame::solid_rgb(4, 4, [0, 0, 0])]);
        let cfg = EncodeConfig::new(&out, 30).with_overwrite(false);
        let err = encode_video(&seq, &cfg).unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)), "{err:?}");
        assert_eq!(std::fs::read(&out).unwrap(), b"keep");
    }

    #[test]
    fn partial_output_removal_tolerates_missing_file() {
        let dir = PathBuf::from("target").join("encode_partial_unit");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("out.mp4");
        std::fs::write(&out, b"truncated").unwrap();

        remove_partial_output(&out);
        assert!(!out.exists());
        remove_partial_output(&out);
    }
}
