//! Shared test fixtures: a recording [`RenderDevice`] and a sized surface.

#![allow(dead_code)]

use std::sync::Arc;

use aurora::renderer::device::{
    BufferDesc, BufferId, DeviceError, RenderDevice, SurfaceExtent, TargetDesc, TextureId,
};
use aurora::renderer::graph::{PassContext, PassKind};
use aurora::renderer::{Renderer, RendererSettings, ViewUniforms};
use aurora::scene::{PerspectiveCamera, SceneTransform};
use parking_lot::RwLock;
use slotmap::SlotMap;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A presentation target with a fixed extent.
#[derive(Debug, Clone, Copy)]
pub struct TestSurface {
    pub width: u32,
    pub height: u32,
}

impl TestSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl SurfaceExtent for TestSurface {
    fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct BufferWrite {
    pub buffer: BufferId,
    pub label: &'static str,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Records every request and allocates handles from slotmaps.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub textures: SlotMap<TextureId, TargetDesc>,
    pub buffers: SlotMap<BufferId, BufferDesc>,
    pub writes: Vec<BufferWrite>,
    pub passes: Vec<PassContext>,
    pub presents: Vec<(TextureId, (u32, u32))>,
    pub textures_created: usize,
    pub textures_destroyed: usize,
    /// Passes recorded since the last present.
    pub pending_passes: usize,
    pub aborted_frames: usize,

    /// Texture label whose creation fails.
    pub fail_texture: Option<&'static str>,
    /// Buffer label whose creation fails.
    pub fail_buffer: Option<&'static str>,
    /// Pass whose execution fails.
    pub fail_pass: Option<PassKind>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_labels(&self) -> Vec<&'static str> {
        self.textures.values().map(|d| d.label).collect()
    }

    pub fn has_live(&self, label: &str) -> bool {
        self.textures.values().any(|d| d.label == label)
    }

    pub fn writes_to(&self, label: &str) -> usize {
        self.writes.iter().filter(|w| w.label == label).count()
    }

    pub fn last_view_block(&self) -> Option<ViewUniforms> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.label == "View Uniforms")
            .map(|w| bytemuck::pod_read_unaligned(&w.data))
    }

    /// Pass kinds recorded since the given pass index.
    pub fn kinds_since(&self, start: usize) -> Vec<PassKind> {
        self.passes[start..].iter().map(|p| p.kind).collect()
    }

    pub fn last_pass(&self, kind: PassKind) -> Option<&PassContext> {
        self.passes.iter().rev().find(|p| p.kind == kind)
    }
}

impl RenderDevice for RecordingDevice {
    type Surface = TestSurface;

    fn create_texture(&mut self, desc: &TargetDesc) -> Result<TextureId, DeviceError> {
        if self.fail_texture == Some(desc.label) {
            return Err(DeviceError::OutOfMemory { label: desc.label });
        }
        self.textures_created += 1;
        Ok(self.textures.insert(desc.clone()))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(id).is_some() {
            self.textures_destroyed += 1;
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, DeviceError> {
        if self.fail_buffer == Some(desc.label) {
            return Err(DeviceError::OutOfMemory { label: desc.label });
        }
        Ok(self.buffers.insert(desc.clone()))
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(id);
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let desc = self
            .buffers
            .get(id)
            .ok_or(DeviceError::UnknownHandle { kind: "buffer" })?;
        assert!(offset + data.len() as u64 <= desc.size, "write past end of {}", desc.label);

        self.writes.push(BufferWrite {
            buffer: id,
            label: desc.label,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn execute_pass(&mut self, pass: &PassContext) -> Result<(), DeviceError> {
        if self.fail_pass == Some(pass.kind) {
            return Err(DeviceError::PassUnavailable(pass.kind));
        }
        for binding in pass.inputs.iter().chain(&pass.outputs) {
            if let Some(id) = binding.handle.texture() {
                assert!(self.textures.contains_key(id), "{:?} bound a dead texture", pass.kind);
            }
        }
        self.passes.push(pass.clone());
        self.pending_passes += 1;
        Ok(())
    }

    fn present(&mut self, source: TextureId, surface: &TestSurface) -> Result<(), DeviceError> {
        let desc = self
            .textures
            .get(source)
            .ok_or(DeviceError::UnknownHandle { kind: "texture" })?;
        let source_extent = (desc.width, desc.height);
        if source_extent != surface.extent() {
            return Err(DeviceError::PresentMismatch {
                source_extent,
                surface_extent: surface.extent(),
            });
        }
        self.presents.push((source, source_extent));
        self.pending_passes = 0;
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.pending_passes = 0;
        self.aborted_frames += 1;
    }
}

pub type SharedScene = Arc<RwLock<SceneTransform>>;
pub type SharedCamera = Arc<RwLock<PerspectiveCamera>>;

/// A renderer over a fresh [`RecordingDevice`] with a scene and camera set.
pub fn setup(settings: RendererSettings) -> (Renderer<RecordingDevice>, SharedScene, SharedCamera) {
    init_logger();

    let scene = Arc::new(RwLock::new(SceneTransform::default()));
    let camera = Arc::new(RwLock::new(PerspectiveCamera::default()));

    let mut renderer = Renderer::new(RecordingDevice::new(), settings);
    renderer.set_scene(&scene);
    renderer.set_camera(&camera);

    (renderer, scene, camera)
}
