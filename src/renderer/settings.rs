//! Renderer Settings & Anti-Aliasing Configuration
//!
//! The core abstraction is [`AntiAliasingMode`], which decides the shape of the
//! per-frame pass pipeline (see [`crate::renderer::graph`]). Everything else in
//! [`RendererSettings`] tunes resource formats and the temporal resolve.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use aurora::renderer::{AntiAliasingMode, RendererSettings};
//!
//! // Default: no anti-aliasing, 8-frame jitter period when TAA is enabled later
//! let settings = RendererSettings::default();
//!
//! // Start directly in TAA with a longer jitter sequence
//! let settings = RendererSettings {
//!     anti_aliasing: AntiAliasingMode::Temporal,
//!     jitter_period: 16,
//!     ..Default::default()
//! };
//! ```

// ---------------------------------------------------------------------------
// AntiAliasingMode
// ---------------------------------------------------------------------------

/// Anti-aliasing technique, one pipeline shape per variant.
///
/// | Mode          | Extra targets               | Extra passes                      |
/// |---------------|-----------------------------|-----------------------------------|
/// | `None`        | -                           | -                                 |
/// | `Multisample` | MSAA color, MSAA depth      | hardware resolve                  |
/// | `Fxaa`        | -                           | FXAA (color → resolve)            |
/// | `Temporal`    | history                     | temporal resolve, history copy    |
///
/// Changing the mode through [`Renderer::set_aa`](crate::renderer::Renderer::set_aa)
/// takes effect from the next rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AntiAliasingMode {
    #[default]
    None,
    /// Hardware multi-sampling with a resolve step.
    Multisample,
    /// Fast approximate anti-aliasing as a post-process.
    Fxaa,
    /// Temporal anti-aliasing with sub-pixel jitter and a history buffer.
    Temporal,
}

impl AntiAliasingMode {
    /// Returns a human-readable name for the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Multisample => "MSAA",
            Self::Fxaa => "FXAA",
            Self::Temporal => "TAA",
        }
    }

    /// Returns all modes.
    #[must_use]
    pub const fn all() -> &'static [AntiAliasingMode] {
        &[Self::None, Self::Multisample, Self::Fxaa, Self::Temporal]
    }

    /// Whether this mode jitters the projection and keeps a history buffer.
    #[inline]
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Temporal)
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Global configuration consumed by [`Renderer::new`](crate::renderer::Renderer::new).
///
/// # Fields
///
/// | Field             | Description                                   | Default         |
/// |-------------------|-----------------------------------------------|-----------------|
/// | `anti_aliasing`   | Mode used from the first frame                | `None`          |
/// | `jitter_period`   | Length of the repeating TAA jitter sequence   | `8`             |
/// | `history_blend`   | Weight of the current frame in the TAA blend  | `0.1`           |
/// | `msaa_samples`    | Sample count of the MSAA auxiliary targets    | `4`             |
/// | `color_format`    | Scene color / resolve / history format        | `Rgba16Float`   |
/// | `post_format`     | Post target format (should match the surface) | `Bgra8UnormSrgb`|
/// | `depth_format`    | Depth target format                           | `Depth32Float`  |
/// | `velocity_format` | Motion vector target format                   | `Rg16Float`     |
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    // === Pipeline ===
    /// Anti-aliasing mode active on the first frame.
    pub anti_aliasing: AntiAliasingMode,

    // === Temporal ===
    /// Number of distinct jitter offsets before the sequence repeats.
    pub jitter_period: u32,

    /// Exponential blend factor given to the current frame by the temporal
    /// resolve (`1.0` means history is ignored).
    pub history_blend: f32,

    // === Multisampling ===
    /// Sample count for the multisampled color/depth targets. Must be 2, 4 or 8.
    pub msaa_samples: u32,

    // === Formats ===
    /// Format of the HDR scene color, resolve and history targets.
    pub color_format: wgpu::TextureFormat,

    /// Format of the post-process target, copied to the surface on present.
    pub post_format: wgpu::TextureFormat,

    /// Depth buffer format.
    pub depth_format: wgpu::TextureFormat,

    /// Velocity (motion vector) buffer format.
    pub velocity_format: wgpu::TextureFormat,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            anti_aliasing: AntiAliasingMode::default(),
            jitter_period: 8,
            history_blend: 0.1,
            msaa_samples: 4,
            color_format: wgpu::TextureFormat::Rgba16Float,
            post_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            depth_format: wgpu::TextureFormat::Depth32Float,
            velocity_format: wgpu::TextureFormat::Rg16Float,
        }
    }
}

impl RendererSettings {
    /// Returns a copy with out-of-range values replaced by usable ones.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.jitter_period == 0 {
            log::warn!("jitter_period must be at least 1, using 1");
            self.jitter_period = 1;
        }

        if !(self.history_blend > 0.0 && self.history_blend <= 1.0) {
            log::warn!(
                "history_blend {} outside (0, 1], using {}",
                self.history_blend,
                Self::default().history_blend
            );
            self.history_blend = Self::default().history_blend;
        }

        if !matches!(self.msaa_samples, 2 | 4 | 8) {
            log::warn!("msaa_samples {} unsupported, using 4", self.msaa_samples);
            self.msaa_samples = 4;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_keeps_defaults() {
        let settings = RendererSettings::default();
        assert_eq!(settings.clone().validated(), settings);
    }

    #[test]
    fn validated_clamps_bad_values() {
        let settings = RendererSettings {
            jitter_period: 0,
            history_blend: 0.0,
            msaa_samples: 3,
            ..Default::default()
        }
        .validated();

        assert_eq!(settings.jitter_period, 1);
        assert!((settings.history_blend - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.msaa_samples, 4);
    }

    #[test]
    fn only_taa_is_temporal() {
        for mode in AntiAliasingMode::all() {
            assert_eq!(mode.is_temporal(), *mode == AntiAliasingMode::Temporal);
        }
    }
}
