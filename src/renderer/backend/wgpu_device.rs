//! wgpu Device
//!
//! [`WgpuDevice`] owns the `wgpu::Device` / `wgpu::Queue` pair and every
//! texture and buffer the frame core asks for, keyed by slotmap handles.
//!
//! # Command Recording
//!
//! All passes of a frame are recorded into one `CommandEncoder`, created by
//! the first [`execute_pass`](RenderDevice::execute_pass) of the frame and
//! submitted by [`present`](RenderDevice::present). A failing pass or
//! [`abort_frame`](RenderDevice::abort_frame) drops the encoder unsubmitted.
//! Uniform writes go through `Queue::write_buffer`, which wgpu orders before
//! the next submission, so the single-buffered uniform blocks never race the
//! GPU.
//!
//! # Allocation Errors
//!
//! Texture and buffer creation run inside an out-of-memory error scope, so a
//! device allocation failure comes back as [`DeviceError::OutOfMemory`]
//! instead of reaching the device's uncaptured-error handler.
//!
//! # Pass Encoders
//!
//! The hardware MSAA resolve and the history copy are built in. Shading passes
//! (base, FXAA, temporal resolve, post) belong to the application and are
//! plugged in with [`WgpuDevice::register_pass`]; running a pipeline that
//! needs an unregistered pass fails with [`DeviceError::PassUnavailable`].

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use super::passes::{HistoryCopyEncoder, MsaaResolveEncoder};
use crate::renderer::device::{
    BufferDesc, BufferId, DeviceError, RenderDevice, SurfaceExtent, TargetDesc, TextureId,
};
use crate::renderer::graph::{FrameResource, PassContext, PassKind};

/// A render target and its default view.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Handle-to-object tables visible to pass encoders.
#[derive(Debug, Default)]
pub struct WgpuResources {
    textures: SlotMap<TextureId, GpuTexture>,
    buffers: SlotMap<BufferId, wgpu::Buffer>,
}

impl WgpuResources {
    #[inline]
    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(id)
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id)
    }

    /// Texture bound to `resource` in `pass`, as input or output.
    pub fn bound_texture(
        &self,
        pass: &PassContext,
        resource: FrameResource,
    ) -> Result<&GpuTexture, DeviceError> {
        pass.input_texture(resource)
            .or_else(|| pass.output_texture(resource))
            .and_then(|id| self.textures.get(id))
            .ok_or(DeviceError::UnknownHandle { kind: "texture" })
    }

    /// Buffer bound to `resource` in `pass`.
    pub fn bound_buffer(
        &self,
        pass: &PassContext,
        resource: FrameResource,
    ) -> Result<&wgpu::Buffer, DeviceError> {
        pass.input(resource)
            .and_then(|handle| handle.buffer())
            .and_then(|id| self.buffers.get(id))
            .ok_or(DeviceError::UnknownHandle { kind: "buffer" })
    }

    #[inline]
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

/// Records one pass into the frame's command encoder.
pub trait PassEncoder {
    fn encode(
        &mut self,
        device: &wgpu::Device,
        resources: &WgpuResources,
        pass: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<(), DeviceError>;
}

/// [`RenderDevice`] over a `wgpu` device and queue.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    resources: WgpuResources,
    encoders: FxHashMap<PassKind, Box<dyn PassEncoder>>,
    frame_encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuDevice {
    /// Wraps an existing device. The built-in MSAA resolve and history copy
    /// encoders are registered.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let mut encoders: FxHashMap<PassKind, Box<dyn PassEncoder>> = FxHashMap::default();
        encoders.insert(PassKind::MsaaResolve, Box::new(MsaaResolveEncoder));
        encoders.insert(PassKind::HistoryCopy, Box::new(HistoryCopyEncoder));

        Self {
            device,
            queue,
            resources: WgpuResources::default(),
            encoders,
            frame_encoder: None,
        }
    }

    /// Requests a device from the default instance without a surface.
    pub async fn headless() -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Aurora Frame Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        Ok(Self::new(device, queue))
    }

    /// Installs (or replaces) the encoder used for `kind`.
    pub fn register_pass(&mut self, kind: PassKind, encoder: Box<dyn PassEncoder>) {
        if self.encoders.insert(kind, encoder).is_some() {
            log::debug!("Replaced encoder for {}", kind.name());
        }
    }

    #[inline]
    #[must_use]
    pub fn has_pass(&self, kind: PassKind) -> bool {
        self.encoders.contains_key(&kind)
    }

    #[inline]
    #[must_use]
    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    #[must_use]
    pub fn resources(&self) -> &WgpuResources {
        &self.resources
    }

    /// Whether passes have been recorded that no `present` has submitted.
    #[inline]
    #[must_use]
    pub fn has_pending_commands(&self) -> bool {
        self.frame_encoder.is_some()
    }
}

impl RenderDevice for WgpuDevice {
    /// The acquired surface texture (`SurfaceTexture::texture`). It must have
    /// `COPY_DST` usage and the post target's format.
    type Surface = wgpu::Texture;

    fn create_texture(&mut self, desc: &TargetDesc) -> Result<TextureId, DeviceError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(DeviceError::ExtentTooLarge {
                width: desc.width,
                height: desc.height,
                max,
            });
        }

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: desc.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        if let Some(error) = pollster::block_on(scope.pop()) {
            log::warn!("{} ({}x{}): {error}", desc.label, desc.width, desc.height);
            texture.destroy();
            return Err(DeviceError::OutOfMemory { label: desc.label });
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(self.resources.textures.insert(GpuTexture { texture, view }))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(gpu) = self.resources.textures.remove(id) {
            gpu.texture.destroy();
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, DeviceError> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(error) = pollster::block_on(scope.pop()) {
            log::warn!("{} ({} bytes): {error}", desc.label, desc.size);
            buffer.destroy();
            return Err(DeviceError::OutOfMemory { label: desc.label });
        }
        Ok(self.resources.buffers.insert(buffer))
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if let Some(buffer) = self.resources.buffers.remove(id) {
            buffer.destroy();
        }
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let buffer = self
            .resources
            .buffers
            .get(id)
            .ok_or(DeviceError::UnknownHandle { kind: "buffer" })?;
        self.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn execute_pass(&mut self, pass: &PassContext) -> Result<(), DeviceError> {
        let Some(pass_encoder) = self.encoders.get_mut(&pass.kind) else {
            self.frame_encoder = None;
            return Err(DeviceError::PassUnavailable(pass.kind));
        };

        let encoder = self.frame_encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                })
        });

        encoder.push_debug_group(pass.kind.name());
        let result = pass_encoder.encode(&self.device, &self.resources, pass, encoder);
        encoder.pop_debug_group();

        if result.is_err() {
            self.frame_encoder = None;
        }
        result
    }

    fn present(&mut self, source: TextureId, surface: &wgpu::Texture) -> Result<(), DeviceError> {
        let post = self
            .resources
            .textures
            .get(source)
            .ok_or(DeviceError::UnknownHandle { kind: "texture" })?;

        let source_extent = (post.texture.width(), post.texture.height());
        let surface_extent = surface.extent();
        if source_extent != surface_extent {
            return Err(DeviceError::PresentMismatch {
                source_extent,
                surface_extent,
            });
        }

        let mut encoder = self.frame_encoder.take().unwrap_or_else(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                })
        });

        encoder.copy_texture_to_texture(
            post.texture.as_image_copy(),
            surface.as_image_copy(),
            post.texture.size(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.frame_encoder.take().is_some() {
            log::debug!("Discarded unsubmitted frame commands");
        }
    }
}
