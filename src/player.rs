//! Step-through viewer for a finished sequence.
//!
//! The playback logic is the pure [`PlayerState::tick`] transition; the window driver (feature
//! `viewer`) only translates key presses into [`PlayerCommand`]s and blits the current frame.

use crate::{
    error::{ReelError, ReelResult},
    sequence::FrameSequence,
};

pub const CONTROLS_HELP: &str = "Controls:\n  SPACE - Play/Pause\n  \u{2190}/\u{2192}   - Step backward/forward\n  ESC   - Exit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerMode {
    Paused,
    Playing,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// No input this tick.
    Idle,
    Exit,
    TogglePlay,
    StepBack,
    StepForward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub index: usize,
    pub mode: PlayerMode,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            index: 0,
            mode: PlayerMode::Playing,
        }
    }
}

impl PlayerState {
    pub fn is_stopped(&self) -> bool {
        self.mode == PlayerMode::Stopped
    }

    /// Apply one command, then advance one frame if playing (wrapping past the end).
    pub fn tick(self, command: PlayerCommand, len: usize) -> Self {
        if self.is_stopped() {
            return self;
        }
        if len == 0 {
            return Self {
                index: 0,
                mode: PlayerMode::Stopped,
            };
        }

        let mut next = self;
        next.index = next.index.min(len - 1);
        match command {
            PlayerCommand::Idle => {}
            PlayerCommand::Exit => {
                next.mode = PlayerMode::Stopped;
                return next;
            }
            PlayerCommand::TogglePlay => {
                next.mode = match next.mode {
                    PlayerMode::Playing => PlayerMode::Paused,
                    _ => PlayerMode::Playing,
                };
            }
            PlayerCommand::StepBack => next.index = next.index.saturating_sub(1),
            PlayerCommand::StepForward => next.index = (next.index + 1).min(len - 1),
        }

        if next.mode == PlayerMode::Playing {
            next.index = (next.index + 1) % len;
        }
        next
    }
}

/// Show `seq` in a window until the user exits. An empty sequence is a no-op.
pub fn play(seq: &FrameSequence, delay_ms: u64) -> ReelResult<()> {
    if seq.is_empty() {
        tracing::warn!("no frames to display");
        return Ok(());
    }
    play_window(seq, delay_ms)
}

#[cfg(feature = "viewer")]
fn play_window(seq: &FrameSequence, delay_ms: u64) -> ReelResult<()> {
    use minifb::{Key, KeyRepeat, Window, WindowOptions};

    use crate::core::Frame;

    let (w, h) = seq.frames()[0].dimensions();
    let mut window = Window::new(
        "reelcut",
        w as usize,
        h as usize,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| ReelError::io(format!("failed to create window: {e}")))?;
    window.set_target_fps((1000 / delay_ms.max(1)).max(1) as usize);

    let mut buffer = Vec::<u32>::new();
    let mut state = PlayerState::default();
    tracing::info!(frames = seq.len(), delay_ms, "player started");

    while !state.is_stopped() {
        let frame = &seq.frames()[state.index];
        let (fw, fh) = frame.dimensions();
        buffer.clear();
        match frame {
            Frame::Rgb(img) => buffer.extend(img.as_raw().chunks_exact(3).map(|px| {
                (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2])
            })),
            Frame::Gray(img) => buffer.extend(img.as_raw().iter().map(|&v| {
                let v = u32::from(v);
                (v << 16) | (v << 8) | v
            })),
        }
        window
            .update_with_buffer(&buffer, fw as usize, fh as usize)
            .map_err(|e| ReelError::io(format!("window update failed: {e}")))?;

        let command = if !window.is_open() {
            PlayerCommand::Exit
        } else {
            window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .find_map(|key| match key {
                    Key::Escape => Some(PlayerCommand::Exit),
                    Key::Space => Some(PlayerCommand::TogglePlay),
                    Key::Left => Some(PlayerCommand::StepBack),
                    Key::Right => Some(PlayerCommand::StepForward),
                    _ => None,
                })
                .unwrap_or(PlayerCommand::Idle)
        };
        state = state.tick(command, seq.len());
    }

    tracing::info!("player closed");
    Ok(())
}

#[cfg(not(feature = "viewer"))]
fn play_window(_seq: &FrameSequence, _delay_ms: u64) -> ReelResult<()> {
    Err(ReelError::validation(
        "interactive playback requires the 'viewer' feature",
    ))
}
