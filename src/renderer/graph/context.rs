//! Per-Pass Execution Context
//!
//! [`PassContext`] is the only thing a pass implementation sees of the frame:
//! the handles bound to its declared inputs/outputs, the frame number, the
//! output extent, the jitter and any mode-specific parameters. It is built
//! fresh for every pass of every frame, so implementations never hold target
//! handles across a resize.

use glam::Vec2;
use smallvec::SmallVec;

use super::pass::{FrameResource, PassDesc, PassKind};
use crate::errors::{RenderError, Result};
use crate::renderer::device::{ResourceHandle, TextureId};

/// Frame-wide values shared by every pass of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame_number: u64,
    pub extent: (u32, u32),
    /// This frame's sub-pixel jitter in pixels (zero outside TAA).
    pub jitter: Vec2,
}

/// Mode-specific pass parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PassParams {
    #[default]
    None,
    MsaaResolve {
        sample_count: u32,
    },
    TemporalResolve {
        /// Weight of the current frame in the exponential blend.
        blend_weight: f32,
        /// `false` when the history buffer holds nothing usable (first TAA
        /// frame, after a resize); the pass must then output current color.
        history_valid: bool,
    },
}

/// A logical resource bound to a device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub resource: FrameResource,
    pub handle: ResourceHandle,
}

/// Everything a pass needs for one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PassContext {
    pub kind: PassKind,
    pub frame: FrameInfo,
    pub inputs: SmallVec<[Binding; 5]>,
    pub outputs: SmallVec<[Binding; 3]>,
    pub params: PassParams,
}

impl PassContext {
    /// Binds `desc` against the current frame's handles.
    ///
    /// `lookup` maps a logical resource to its handle; a resource without a
    /// handle is an [`RenderError::UnboundResource`].
    pub fn bind<F>(
        desc: &PassDesc,
        frame: FrameInfo,
        params: PassParams,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(FrameResource) -> Option<ResourceHandle>,
    {
        let bind_one = |resource: FrameResource| {
            lookup(resource)
                .map(|handle| Binding { resource, handle })
                .ok_or(RenderError::UnboundResource {
                    pass: desc.kind,
                    resource,
                })
        };

        Ok(Self {
            kind: desc.kind,
            frame,
            inputs: desc.inputs.iter().copied().map(&bind_one).collect::<Result<_>>()?,
            outputs: desc.outputs.iter().copied().map(&bind_one).collect::<Result<_>>()?,
            params,
        })
    }

    #[must_use]
    pub fn input(&self, resource: FrameResource) -> Option<ResourceHandle> {
        find(&self.inputs, resource)
    }

    #[must_use]
    pub fn output(&self, resource: FrameResource) -> Option<ResourceHandle> {
        find(&self.outputs, resource)
    }

    #[must_use]
    pub fn input_texture(&self, resource: FrameResource) -> Option<TextureId> {
        self.input(resource).and_then(ResourceHandle::texture)
    }

    #[must_use]
    pub fn output_texture(&self, resource: FrameResource) -> Option<TextureId> {
        self.output(resource).and_then(ResourceHandle::texture)
    }
}

fn find(bindings: &[Binding], resource: FrameResource) -> Option<ResourceHandle> {
    bindings
        .iter()
        .find(|b| b.resource == resource)
        .map(|b| b.handle)
}
