use std::ops::Range;

use rayon::prelude::*;

use crate::{
    core::Frame,
    error::{ReelError, ReelResult},
};

/// Ordered, dense list of frames forming the in-progress edit.
///
/// Every edit consumes the sequence and returns the one that replaces it, so a caller never
/// observes a half-applied step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// `self ++ new_frames`. Frame sizes are not checked here; mixed sizes only matter to sinks.
    pub fn append(mut self, new_frames: impl IntoIterator<Item = Frame>) -> Self {
        self.frames.extend(new_frames);
        self
    }

    /// Remove `count` frames ending `start` frames before the current tail.
    ///
    /// The window is computed by [`cut_window`], so `start`/`count` larger than the sequence
    /// clamp instead of wrapping. Negative arguments are rejected, never clamped.
    pub fn cut(mut self, start: i64, count: i64) -> ReelResult<Self> {
        if start < 0 || count < 0 {
            return Err(ReelError::precondition(format!(
                "cut start/count must be non-negative (got start={start}, count={count})"
            )));
        }
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let count = usize::try_from(count).unwrap_or(usize::MAX);

        let window = cut_window(self.frames.len(), start, count);
        tracing::debug!(
            begin = window.start,
            end = window.end,
            removed = window.len(),
            "cut window"
        );
        self.frames.drain(window);
        Ok(self)
    }

    /// Apply `f` to every frame independently.
    ///
    /// Frames are processed in parallel; output order always matches input order. The first
    /// error aborts the whole map.
    pub fn map_frames<F>(self, f: F) -> ReelResult<Self>
    where
        F: Fn(Frame) -> ReelResult<Frame> + Sync + Send,
    {
        let frames = self
            .frames
            .into_par_iter()
            .map(f)
            .collect::<ReelResult<Vec<_>>>()?;
        Ok(Self { frames })
    }
}

/// Window removed by a cut on a sequence of `len` frames.
///
/// `end = len - start` and `begin = end - count`, both clamped so that
/// `0 <= begin <= end <= len`.
pub fn cut_window(len: usize, start: usize, count: usize) -> Range<usize> {
    let end = len.saturating_sub(start);
    let begin = end.saturating_sub(count);
    begin..end
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 RGB frame carrying its original index in the first two channels.
    fn tagged(i: usize) -> Frame {
        Frame::solid_rgb(1, 1, [(i >> 8) as u8, (i & 0xff) as u8, 0])
    }

    fn tag_of(f: &Frame) -> usize {
        let px = f.as_raw();
        ((px[0] as usize) << 8) | px[1] as usize
    }

    fn seq(n: usize) -> FrameSequence {
        (0..n).map(tagged).collect()
    }

    fn tags(s: &FrameSequence) -> Vec<usize> {
        s.iter().map(tag_of).collect()
    }

    #[test]
    fn cut_removes_window_relative_to_tail() {
        let out = seq(500).cut(300, 50).unwrap();
        assert_eq!(out.len(), 450);
        let expected: Vec<usize> = (0..150).chain(200..500).collect();
        assert_eq!(tags(&out), expected);
    }

    #[test]
    fn cut_zero_zero_is_identity() {
        let s = seq(12);
        assert_eq!(s.clone().cut(0, 0).unwrap(), s);
    }

    #[test]
    fn cut_count_past_head_clamps_to_zero() {
        let out = seq(10).cut(2, 100).unwrap();
        assert_eq!(tags(&out), vec![8, 9]);
    }

    #[test]
    fn cut_start_past_len_removes_nothing() {
        let s = seq(10);
        assert_eq!(s.clone().cut(25, 5).unwrap(), s);
        assert_eq!(s.clone().cut(11, 0).unwrap(), s);
        assert_eq!(s.clone().cut(i64::MAX, i64::MAX).unwrap(), s);
    }

    #[test]
    fn cut_on_empty_is_noop() {
        let out = FrameSequence::new().cut(100, 200).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn cut_rejects_negative_arguments() {
        let err = seq(3).cut(-1, 0).unwrap_err();
        assert!(matches!(err, ReelError::Precondition(_)));
        let err = seq(3).cut(0, -5).unwrap_err();
        assert!(matches!(err, ReelError::Precondition(_)));
    }

    #[test]
    fn cut_window_matches_reference_formula() {
        assert_eq!(cut_window(500, 300, 50), 150..200);
        assert_eq!(cut_window(10, 0, 3), 7..10);
        assert_eq!(cut_window(10, 10, 3), 0..0);
        assert_eq!(cut_window(0, 0, 0), 0..0);
    }

    #[test]
    fn append_concatenates_in_order() {
        let out = seq(3).append(vec![tagged(10), tagged(11)]);
        assert_eq!(tags(&out), vec![0, 1, 2, 10, 11]);

        let s = seq(4);
        assert_eq!(s.clone().append(Vec::new()), s);
    }

    #[test]
    fn map_frames_preserves_order() {
        let out = seq(300)
            .map_frames(|f| {
                let t = tag_of(&f);
                Ok(tagged(t + 1))
            })
            .unwrap();
        assert_eq!(tags(&out), (1..301).collect::<Vec<_>>());
    }

    #[test]
    fn map_frames_propagates_errors() {
        let err = seq(5)
            .map_frames(|f| {
                if tag_of(&f) == 3 {
                    Err(ReelError::validation("bad frame"))
                } else {
                    Ok(f)
                }
            })
            .unwrap_err();
        assert!(err.to_string().contains("bad frame"));
    }
}
