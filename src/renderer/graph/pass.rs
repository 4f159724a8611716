//! Pass Descriptors
//!
//! A [`PassDesc`] names a pass and the logical [`FrameResource`]s it reads and
//! writes. Descriptors carry no GPU handles; the orchestrator binds them to the
//! current frame's handles right before execution (see [`PassContext`]).
//!
//! [`PassContext`]: super::PassContext

use smallvec::SmallVec;

/// The passes the frame core knows how to sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Opaque geometry pass.
    Base,
    /// Hardware downsample of the multisampled color target.
    MsaaResolve,
    /// Edge-detection / blur post-process.
    Fxaa,
    /// Velocity-guided blend of current color with the history buffer.
    TemporalResolve,
    /// Copies this frame's resolve output into the history buffer.
    HistoryCopy,
    /// Tone mapping / final post step into the post target.
    Post,
}

impl PassKind {
    /// Pass name (for debugging and GPU debug groups).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "Base Pass",
            Self::MsaaResolve => "MSAA Resolve",
            Self::Fxaa => "FXAA Pass",
            Self::TemporalResolve => "Temporal Resolve",
            Self::HistoryCopy => "History Copy",
            Self::Post => "Post Pass",
        }
    }
}

/// Logical identifier for the GPU resources a pass can bind.
///
/// | Variant | Lifetime | Description |
/// |---------|----------|-------------|
/// | `SceneUniforms` | Renderer | Scene transform block |
/// | `ViewUniforms` | Renderer | Current + previous camera block |
/// | `Color` | Resize | Scene color |
/// | `Depth` | Resize | Scene depth |
/// | `Velocity` | Resize | Motion vectors |
/// | `Resolve` | Resize | Final linear color |
/// | `Post` | Resize | Tone-mapped output, presented to the surface |
/// | `MsaaColor` | Multisample mode | Multisampled color |
/// | `MsaaDepth` | Multisample mode | Multisampled depth |
/// | `History` | Temporal mode | Previous frame's resolve output |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameResource {
    SceneUniforms,
    ViewUniforms,
    Color,
    Depth,
    Velocity,
    Resolve,
    Post,
    MsaaColor,
    MsaaDepth,
    History,
}

impl FrameResource {
    /// The five targets every mode shares, in allocation order.
    pub const CORE_TARGETS: [FrameResource; 5] = [
        Self::Color,
        Self::Depth,
        Self::Velocity,
        Self::Resolve,
        Self::Post,
    ];

    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SceneUniforms => "Scene Uniforms",
            Self::ViewUniforms => "View Uniforms",
            Self::Color => "Color Target",
            Self::Depth => "Depth Target",
            Self::Velocity => "Velocity Target",
            Self::Resolve => "Resolve Target",
            Self::Post => "Post Target",
            Self::MsaaColor => "MSAA Color Target",
            Self::MsaaDepth => "MSAA Depth Target",
            Self::History => "History Target",
        }
    }

    /// Uniform buffers rather than textures.
    #[inline]
    #[must_use]
    pub const fn is_uniform(self) -> bool {
        matches!(self, Self::SceneUniforms | Self::ViewUniforms)
    }

    /// Mode-specific targets allocated lazily.
    #[inline]
    #[must_use]
    pub const fn is_auxiliary(self) -> bool {
        matches!(self, Self::MsaaColor | Self::MsaaDepth | Self::History)
    }
}

/// A pass and the resources it reads and writes, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub kind: PassKind,
    pub inputs: SmallVec<[FrameResource; 5]>,
    pub outputs: SmallVec<[FrameResource; 3]>,
}

impl PassDesc {
    #[must_use]
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }

    /// Adds an input (chained).
    #[inline]
    #[must_use]
    pub fn read(mut self, resource: FrameResource) -> Self {
        self.inputs.push(resource);
        self
    }

    /// Adds an output (chained).
    #[inline]
    #[must_use]
    pub fn write(mut self, resource: FrameResource) -> Self {
        self.outputs.push(resource);
        self
    }

    #[inline]
    #[must_use]
    pub fn reads(&self, resource: FrameResource) -> bool {
        self.inputs.contains(&resource)
    }

    #[inline]
    #[must_use]
    pub fn writes(&self, resource: FrameResource) -> bool {
        self.outputs.contains(&resource)
    }
}
