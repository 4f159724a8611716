//! Pass Pipeline Selection
//!
//! One pipeline shape per [`AntiAliasingMode`]. The orchestrator never branches
//! on the mode itself: it asks for [`AntiAliasingMode::pipeline`] and walks the
//! returned descriptor list in order.
//!
//! ```text
//! None         Base ─────────────────────────────→ Resolve → Post
//! Multisample  Base → MsaaColor ─ MsaaResolve ───→ Resolve → Post
//! Fxaa         Base → Color ───── Fxaa ──────────→ Resolve → Post
//! Temporal     Base → Color+Velocity ─ TemporalResolve(History) → Resolve → HistoryCopy → Post
//! ```
//!
//! The resolve target always holds the final linear color consumed by the
//! trailing post step.

use smallvec::SmallVec;
use thiserror::Error;

use super::pass::{FrameResource, PassDesc, PassKind};
use crate::renderer::settings::AntiAliasingMode;

/// Structural problems found by [`PassPipeline::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{pass:?} reads {resource:?} before any pass writes it")]
    UnwrittenInput {
        pass: PassKind,
        resource: FrameResource,
    },

    #[error("pipeline does not end by writing the post target")]
    MissingPostOutput,
}

/// Ordered list of passes for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PassPipeline {
    mode: AntiAliasingMode,
    passes: SmallVec<[PassDesc; 4]>,
}

impl PassPipeline {
    #[must_use]
    pub fn mode(&self) -> AntiAliasingMode {
        self.mode
    }

    #[must_use]
    pub fn passes(&self) -> &[PassDesc] {
        &self.passes
    }

    /// Pass kinds in execution order.
    #[must_use]
    pub fn kinds(&self) -> SmallVec<[PassKind; 4]> {
        self.passes.iter().map(|p| p.kind).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, kind: PassKind) -> bool {
        self.passes.iter().any(|p| p.kind == kind)
    }

    /// Checks that every texture input is produced earlier in the frame
    /// (uniforms and the history buffer come from outside the frame) and that
    /// the final pass writes [`FrameResource::Post`].
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut written: SmallVec<[FrameResource; 8]> = SmallVec::new();

        for pass in &self.passes {
            for &input in &pass.inputs {
                let external = input.is_uniform() || input == FrameResource::History;
                if !external && !written.contains(&input) {
                    return Err(PipelineError::UnwrittenInput {
                        pass: pass.kind,
                        resource: input,
                    });
                }
            }
            written.extend(pass.outputs.iter().copied());
        }

        match self.passes.last() {
            Some(last) if last.writes(FrameResource::Post) => Ok(()),
            _ => Err(PipelineError::MissingPostOutput),
        }
    }
}

impl AntiAliasingMode {
    /// Describes the pass pipeline for this mode.
    #[must_use]
    pub fn pipeline(self) -> PassPipeline {
        use FrameResource as R;

        let base = PassDesc::new(PassKind::Base)
            .read(R::SceneUniforms)
            .read(R::ViewUniforms);

        let post = PassDesc::new(PassKind::Post).read(R::Resolve).write(R::Post);

        let passes: SmallVec<[PassDesc; 4]> = match self {
            Self::None => smallvec::smallvec![base.write(R::Resolve).write(R::Depth), post],
            Self::Multisample => smallvec::smallvec![
                base.write(R::MsaaColor).write(R::MsaaDepth),
                PassDesc::new(PassKind::MsaaResolve)
                    .read(R::MsaaColor)
                    .write(R::Resolve),
                post,
            ],
            Self::Fxaa => smallvec::smallvec![
                base.write(R::Color).write(R::Depth),
                PassDesc::new(PassKind::Fxaa).read(R::Color).write(R::Resolve),
                post,
            ],
            Self::Temporal => smallvec::smallvec![
                base.write(R::Color).write(R::Velocity).write(R::Depth),
                PassDesc::new(PassKind::TemporalResolve)
                    .read(R::Color)
                    .read(R::Velocity)
                    .read(R::Depth)
                    .read(R::History)
                    .read(R::ViewUniforms)
                    .write(R::Resolve),
                PassDesc::new(PassKind::HistoryCopy)
                    .read(R::Resolve)
                    .write(R::History),
                post,
            ],
        };

        PassPipeline { mode: self, passes }
    }

    /// Mode-specific targets that must exist before the pipeline runs.
    #[must_use]
    pub const fn auxiliary_targets(self) -> &'static [FrameResource] {
        match self {
            Self::None | Self::Fxaa => &[],
            Self::Multisample => &[FrameResource::MsaaColor, FrameResource::MsaaDepth],
            Self::Temporal => &[FrameResource::History],
        }
    }
}
