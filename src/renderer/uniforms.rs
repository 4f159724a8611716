//! Per-Frame Uniform Blocks
//!
//! Two fixed-layout blocks are uploaded by the frame core:
//!
//! | Block            | Size      | Written                        |
//! |------------------|-----------|--------------------------------|
//! | [`SceneUniforms`] | 256 bytes | only when the scene is dirty   |
//! | [`ViewUniforms`]  | 272 bytes | every rendered frame           |
//!
//! Storage is single-buffered: the device abstraction must make sure the GPU
//! is done reading last frame's contents before a new write lands.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::errors::Result;
use crate::renderer::device::{BufferId, RenderDevice};
use crate::renderer::temporal::TemporalState;
use crate::scene::{CameraSource, SceneSource};

/// Scene transform, padded to a 256-byte stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub transform: Mat4,
    pub(crate) _pad0: Mat4,
    pub(crate) _pad1: Mat4,
    pub(crate) _pad2: Mat4,
}

impl SceneUniforms {
    #[must_use]
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            _pad0: Mat4::ZERO,
            _pad1: Mat4::ZERO,
            _pad2: Mat4::ZERO,
        }
    }
}

/// Current and previous camera state for the base and temporal passes.
///
/// `projection` is the unjittered camera projection; the jitter is carried
/// separately in pixels (see [`jittered_projection`]).
///
/// [`jittered_projection`]: crate::renderer::temporal::jittered_projection
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub prev_view: Mat4,
    pub prev_projection: Mat4,
    pub jitter: Vec2,
    pub prev_jitter: Vec2,
}

impl Default for ViewUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            prev_view: Mat4::IDENTITY,
            prev_projection: Mat4::IDENTITY,
            jitter: Vec2::ZERO,
            prev_jitter: Vec2::ZERO,
        }
    }
}

/// Fills the uniform buffers from scene / camera state.
#[derive(Debug)]
pub struct UniformUpdater {
    scene_dirty: bool,
    /// Change version of the scene at its last upload.
    uploaded_scene_version: Option<u64>,
    scene: SceneUniforms,
    view: ViewUniforms,
    scene_uploads: u64,
    view_uploads: u64,
}

impl Default for UniformUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformUpdater {
    /// The scene starts dirty so the first frame always uploads it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene_dirty: true,
            uploaded_scene_version: None,
            scene: SceneUniforms::default(),
            view: ViewUniforms::default(),
            scene_uploads: 0,
            view_uploads: 0,
        }
    }

    #[inline]
    pub fn mark_scene_dirty(&mut self) {
        self.scene_dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn is_scene_dirty(&self) -> bool {
        self.scene_dirty
    }

    /// Uploads the scene block if the scene is dirty or reported a new change
    /// version since the last upload. Returns whether a write happened.
    pub fn update_scene_buffer<D: RenderDevice>(
        &mut self,
        device: &mut D,
        buffer: BufferId,
        scene: &dyn SceneSource,
    ) -> Result<bool> {
        let version = scene.version();
        if !self.scene_dirty && self.uploaded_scene_version == Some(version) {
            return Ok(false);
        }

        let block = SceneUniforms::new(scene.transform());
        device.write_buffer(buffer, 0, bytemuck::bytes_of(&block))?;

        self.scene = block;
        self.scene_dirty = false;
        self.uploaded_scene_version = Some(version);
        self.scene_uploads += 1;
        log::trace!("Scene uniforms uploaded (version {version})");
        Ok(true)
    }

    /// Uploads the view block: current camera matrices, this frame's jitter,
    /// and the previous frame's matrices and jitter from `temporal`.
    pub fn update_view_buffer<D: RenderDevice>(
        &mut self,
        device: &mut D,
        buffer: BufferId,
        camera: &dyn CameraSource,
        temporal: &TemporalState,
        jitter: Vec2,
    ) -> Result<ViewUniforms> {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let prev = temporal.previous_or(view, projection);

        let block = ViewUniforms {
            view,
            projection,
            prev_view: prev.view,
            prev_projection: prev.projection,
            jitter,
            prev_jitter: prev.jitter,
        };
        device.write_buffer(buffer, 0, bytemuck::bytes_of(&block))?;

        self.view = block;
        self.view_uploads += 1;
        Ok(block)
    }

    /// Last uploaded scene block.
    #[inline]
    #[must_use]
    pub fn scene_block(&self) -> &SceneUniforms {
        &self.scene
    }

    /// Last uploaded view block.
    #[inline]
    #[must_use]
    pub fn view_block(&self) -> &ViewUniforms {
        &self.view
    }

    #[inline]
    #[must_use]
    pub fn scene_uploads(&self) -> u64 {
        self.scene_uploads
    }

    #[inline]
    #[must_use]
    pub fn view_uploads(&self) -> u64 {
        self.view_uploads
    }
}
