//! Built-in pass encoders that need no shaders.

use super::wgpu_device::{PassEncoder, WgpuResources};
use crate::renderer::device::DeviceError;
use crate::renderer::graph::{FrameResource, PassContext};

/// Resolves the multisampled color target into the resolve target.
///
/// Runs an empty render pass whose only job is the attachment resolve; the
/// multisampled contents are discarded afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsaaResolveEncoder;

impl PassEncoder for MsaaResolveEncoder {
    fn encode(
        &mut self,
        _device: &wgpu::Device,
        resources: &WgpuResources,
        pass: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<(), DeviceError> {
        let msaa = resources.bound_texture(pass, FrameResource::MsaaColor)?;
        let resolve = resources.bound_texture(pass, FrameResource::Resolve)?;

        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("MSAA Resolve"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &msaa.view,
                resolve_target: Some(&resolve.view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Ok(())
    }
}

/// Copies this frame's resolve output into the history target.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryCopyEncoder;

impl PassEncoder for HistoryCopyEncoder {
    fn encode(
        &mut self,
        _device: &wgpu::Device,
        resources: &WgpuResources,
        pass: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<(), DeviceError> {
        let resolve = resources.bound_texture(pass, FrameResource::Resolve)?;
        let history = resources.bound_texture(pass, FrameResource::History)?;

        encoder.copy_texture_to_texture(
            resolve.texture.as_image_copy(),
            history.texture.as_image_copy(),
            resolve.texture.size(),
        );

        Ok(())
    }
}
