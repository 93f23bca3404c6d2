use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    core::Frame,
    error::{ReelError, ReelResult},
};

pub mod decode;
pub mod media;

/// Producer of frames for the `append_*` steps.
///
/// Any failure to open or decode a source is reported as
/// [`ReelError::SourceUnavailable`].
pub trait FrameSource {
    fn decode_video(&mut self, path: &Path) -> ReelResult<Vec<Frame>>;
    fn decode_image(&mut self, path: &Path) -> ReelResult<Frame>;
}

/// Reads sources from disk, resolving relative paths against `root`.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl FrameSource for FsSource {
    fn decode_video(&mut self, path: &Path) -> ReelResult<Vec<Frame>> {
        let full = self.resolve(path);
        let info = media::probe_video(&full)?;
        media::decode_video_frames(&info)
    }

    fn decode_image(&mut self, path: &Path) -> ReelResult<Frame> {
        decode::decode_image_file(&self.resolve(path))
    }
}

/// In-memory source keyed by path, for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    videos: HashMap<PathBuf, Vec<Frame>>,
    images: HashMap<PathBuf, Frame>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, path: impl Into<PathBuf>, frames: Vec<Frame>) -> Self {
        self.videos.insert(path.into(), frames);
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, frame: Frame) -> Self {
        self.images.insert(path.into(), frame);
        self
    }
}

impl FrameSource for MemorySource {
    fn decode_video(&mut self, path: &Path) -> ReelResult<Vec<Frame>> {
        self.videos
            .get(path)
            .cloned()
            .ok_or_else(|| ReelError::source_unavailable(path, "no such video"))
    }

    fn decode_image(&mut self, path: &Path) -> ReelResult<Frame> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| ReelError::source_unavailable(path, "no such image"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_source_joins_relative_paths_only() {
        let src = FsSource::new("input");
        assert_eq!(
            src.resolve(Path::new("maw.webm")),
            PathBuf::from("input").join("maw.webm")
        );
        let abs = std::env::temp_dir().join("x.png");
        assert_eq!(src.resolve(&abs), abs);
    }

    #[test]
    fn fs_source_reports_missing_files_as_unavailable() {
        let mut src = FsSource::new("target/reelcut-no-such-dir");
        let err = src.decode_video(Path::new("missing.webm")).unwrap_err();
        assert!(err.is_recoverable());
        let err = src.decode_image(Path::new("missing.png")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn memory_source_serves_registered_assets() {
        let mut src = MemorySource::new()
            .with_video("a.webm", vec![Frame::solid_gray(1, 1, 1); 3])
            .with_image("b.png", Frame::solid_rgb(2, 2, [1, 2, 3]));
        assert_eq!(src.decode_video(Path::new("a.webm")).unwrap().len(), 3);
        assert_eq!(
            src.decode_image(Path::new("b.png")).unwrap().dimensions(),
            (2, 2)
        );
        assert!(src.decode_image(Path::new("a.webm")).is_err());
    }
}
