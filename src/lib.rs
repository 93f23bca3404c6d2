//! reelcut is a declarative frame-sequence editing pipeline.
//!
//! Sources (videos, stills) are decoded into an in-memory [`FrameSequence`], a static list of
//! [`Step`]s is folded over it in order, and the result is encoded to MP4 or shown in a simple
//! viewer.
//!
//! - Declare a [`PipelineConfig`] (JSON) or build [`Step`]s directly
//! - Resolve it into a [`Pipeline`]
//! - [`Pipeline::run`] against a [`FrameSource`], then hand the sequence to [`encode_video`] or
//!   [`play`]
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod blur_cpu;
pub mod encode_ffmpeg;
pub mod font;
pub mod model;
pub mod pipeline;
pub mod player;
pub mod sequence;
pub mod steps;
pub mod transforms;

pub use foundation::{core, error};

pub use assets::{FrameSource, FsSource, MemorySource};
pub use crate::core::Frame;
pub use crate::error::{ReelError, ReelResult};
pub use encode_ffmpeg::{EncodeConfig, EncodeStats, encode_video};
pub use model::{OutputConfig, PipelineConfig, PlayerConfig, StepDecl};
pub use pipeline::{Pipeline, PipelineRun, apply_step};
pub use player::{PlayerCommand, PlayerMode, PlayerState, play};
pub use sequence::{FrameSequence, cut_window};
pub use steps::{Step, resolve_step};
