//! Temporal State Tracking
//!
//! Keeps what temporal anti-aliasing needs to know about the *previous* frame:
//! its view and projection matrices and its jitter offset, plus whether the
//! history buffer currently holds a usable image.
//!
//! # Jitter Sequence
//!
//! Jitter follows the Halton(2, 3) low-discrepancy sequence, restarted every
//! `period` frames and centered on the pixel, so every offset lies in
//! `[-0.5, 0.5)` pixels. The offset is a pure function of the frame number:
//! two runs starting at the same frame counter produce the same sequence.
//!
//! ```text
//! frame:    0      1      2      3     ...   period   period+1
//! index:    1      2      3      4     ...   1        2
//! jitter:  (0.0,-0.17) (-0.25,0.17) (0.25,-0.39) ...
//! ```

use glam::{Mat4, Vec2, Vec3};

use crate::renderer::settings::AntiAliasingMode;

/// The radical inverse of `index` in `base` (`index >= 1` gives values in `(0, 1)`).
#[must_use]
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut f = 1.0_f32;
    let mut r = 0.0_f32;
    let b = base as f32;

    while index > 0 {
        f /= b;
        r += f * (index % base) as f32;
        index /= base;
    }

    r
}

/// Sub-pixel jitter for `frame_number`, in pixels.
///
/// `period` of zero is treated as one (constant offset).
#[must_use]
pub fn jitter_offset(frame_number: u64, period: u32) -> Vec2 {
    let period = u64::from(period.max(1));
    // Index 0 is the origin for every base; start at 1.
    let index = (frame_number % period) as u32 + 1;
    Vec2::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5)
}

/// Applies a pixel-space jitter to a projection matrix for an output of
/// `extent` pixels.
///
/// The offset is added in clip space so that it survives the perspective
/// divide as a constant NDC shift of `2 * jitter / extent`.
#[must_use]
pub fn jittered_projection(projection: Mat4, jitter: Vec2, extent: (u32, u32)) -> Mat4 {
    let (width, height) = extent;
    if width == 0 || height == 0 {
        return projection;
    }

    let ndc = Vec3::new(
        2.0 * jitter.x / width as f32,
        2.0 * jitter.y / height as f32,
        0.0,
    );
    Mat4::from_translation(ndc) * projection
}

/// Camera matrices and jitter of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub jitter: Vec2,
}

/// Previous-frame bookkeeping for temporal reprojection.
#[derive(Debug, Clone)]
pub struct TemporalState {
    period: u32,
    previous: Option<FrameMatrices>,
    history_valid: bool,
}

impl TemporalState {
    #[must_use]
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            previous: None,
            history_valid: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// This frame's jitter; zero unless `mode` is temporal.
    #[must_use]
    pub fn compute_jitter(&self, frame_number: u64, mode: AntiAliasingMode) -> Vec2 {
        if mode.is_temporal() {
            jitter_offset(frame_number, self.period)
        } else {
            Vec2::ZERO
        }
    }

    /// The previous frame's values. Before the first recorded frame this is
    /// the supplied current matrices with a zero jitter.
    #[must_use]
    pub fn previous_or(&self, view: Mat4, projection: Mat4) -> FrameMatrices {
        self.previous.unwrap_or(FrameMatrices {
            view,
            projection,
            jitter: Vec2::ZERO,
        })
    }

    #[inline]
    #[must_use]
    pub fn previous(&self) -> Option<&FrameMatrices> {
        self.previous.as_ref()
    }

    /// Records the values the frame just rendered with. Must be called after
    /// the frame's passes have been issued.
    pub fn advance(&mut self, view: Mat4, projection: Mat4, jitter: Vec2) {
        self.previous = Some(FrameMatrices {
            view,
            projection,
            jitter,
        });
    }

    // ── History buffer ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn history_valid(&self) -> bool {
        self.history_valid
    }

    /// Marks the history buffer as unusable (resize, recreation, mode entry).
    pub fn invalidate_history(&mut self) {
        if self.history_valid {
            log::debug!("TAA history invalidated");
        }
        self.history_valid = false;
    }

    /// A temporal frame wrote the history buffer.
    pub fn mark_history_written(&mut self) {
        self.history_valid = true;
    }

    /// Forgets all previous-frame state.
    pub fn reset(&mut self) {
        self.previous = None;
        self.history_valid = false;
    }
}
