//! Frame Resource Allocator
//!
//! Owns every GPU resource the frame core creates:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      FrameResources                           │
//! │                                                               │
//! │  uniforms:  scene, view          (once per renderer lifetime) │
//! │  targets:   color, depth, velocity, resolve, post             │
//! │             (recreated together on every extent change)       │
//! │  auxiliary: msaa color, msaa depth, history                   │
//! │             (lazily, only while their mode is active)         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Semantics
//!
//! A resize allocates the complete new target set, including the auxiliary
//! targets of the mode about to be used, *before* touching the old one. If
//! any allocation fails the partial new set is destroyed and the old targets
//! keep their extent. The error is returned and a frame never runs against
//! partially allocated targets.

use smallvec::SmallVec;

use crate::errors::{RenderError, Result};
use crate::renderer::device::{
    BufferDesc, BufferId, RenderDevice, ResourceHandle, TargetDesc, TextureId,
};
use crate::renderer::graph::FrameResource;
use crate::renderer::settings::{AntiAliasingMode, RendererSettings};
use crate::renderer::uniforms::{SceneUniforms, ViewUniforms};

/// The five extent-dependent targets shared by every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargets {
    pub color: TextureId,
    pub depth: TextureId,
    pub velocity: TextureId,
    pub resolve: TextureId,
    pub post: TextureId,
    pub width: u32,
    pub height: u32,
}

impl RenderTargets {
    #[inline]
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ids(&self) -> [TextureId; 5] {
        [self.color, self.depth, self.velocity, self.resolve, self.post]
    }
}

/// Scene and view uniform buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBuffers {
    pub scene: BufferId,
    pub view: BufferId,
}

/// Mode-specific targets, `None` until first needed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuxiliaryTargets {
    pub msaa_color: Option<TextureId>,
    pub msaa_depth: Option<TextureId>,
    pub history: Option<TextureId>,
}

impl AuxiliaryTargets {
    fn slot(&mut self, resource: FrameResource) -> Option<&mut Option<TextureId>> {
        match resource {
            FrameResource::MsaaColor => Some(&mut self.msaa_color),
            FrameResource::MsaaDepth => Some(&mut self.msaa_depth),
            FrameResource::History => Some(&mut self.history),
            _ => None,
        }
    }

    fn get(&self, resource: FrameResource) -> Option<TextureId> {
        match resource {
            FrameResource::MsaaColor => self.msaa_color,
            FrameResource::MsaaDepth => self.msaa_depth,
            FrameResource::History => self.history,
            _ => None,
        }
    }
}

/// What [`FrameResources::ensure_frame_targets`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetChanges {
    /// The core targets were (re)allocated.
    pub resized: bool,
    /// Auxiliary targets created by the call.
    pub created: SmallVec<[FrameResource; 2]>,
}

/// Formats and sample count used for target descriptors.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetFormats {
    color: wgpu::TextureFormat,
    post: wgpu::TextureFormat,
    depth: wgpu::TextureFormat,
    velocity: wgpu::TextureFormat,
    msaa_samples: u32,
}

/// Allocator and owner of the frame's render targets and uniform buffers.
#[derive(Debug)]
pub struct FrameResources {
    formats: TargetFormats,
    targets: Option<RenderTargets>,
    auxiliary: AuxiliaryTargets,
    uniforms: Option<UniformBuffers>,
    /// Number of target-set (re)allocations so far.
    generation: u64,
}

impl FrameResources {
    #[must_use]
    pub fn new(settings: &RendererSettings) -> Self {
        Self {
            formats: TargetFormats {
                color: settings.color_format,
                post: settings.post_format,
                depth: settings.depth_format,
                velocity: settings.velocity_format,
                msaa_samples: settings.msaa_samples,
            },
            targets: None,
            auxiliary: AuxiliaryTargets::default(),
            uniforms: None,
            generation: 0,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn targets(&self) -> Option<&RenderTargets> {
        self.targets.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn auxiliary(&self) -> &AuxiliaryTargets {
        &self.auxiliary
    }

    #[inline]
    #[must_use]
    pub fn uniform_buffers(&self) -> Option<&UniformBuffers> {
        self.uniforms.as_ref()
    }

    /// Extent of the current target set.
    #[inline]
    #[must_use]
    pub fn extent(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(RenderTargets::extent)
    }

    /// How many times the core target set has been allocated.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current handle for a logical resource, if it is allocated.
    #[must_use]
    pub fn resolve(&self, resource: FrameResource) -> Option<ResourceHandle> {
        let texture = |id: TextureId| Some(ResourceHandle::Texture(id));
        match resource {
            FrameResource::SceneUniforms => {
                self.uniforms.map(|u| ResourceHandle::Buffer(u.scene))
            }
            FrameResource::ViewUniforms => {
                self.uniforms.map(|u| ResourceHandle::Buffer(u.view))
            }
            FrameResource::Color => self.targets.and_then(|t| texture(t.color)),
            FrameResource::Depth => self.targets.and_then(|t| texture(t.depth)),
            FrameResource::Velocity => self.targets.and_then(|t| texture(t.velocity)),
            FrameResource::Resolve => self.targets.and_then(|t| texture(t.resolve)),
            FrameResource::Post => self.targets.and_then(|t| texture(t.post)),
            FrameResource::MsaaColor | FrameResource::MsaaDepth | FrameResource::History => {
                self.auxiliary.get(resource).map(ResourceHandle::Texture)
            }
        }
    }

    // ── Allocation ─────────────────────────────────────────────────────────

    /// Allocates the scene and view uniform buffers on first call.
    pub fn ensure_uniform_buffers<D: RenderDevice>(
        &mut self,
        device: &mut D,
    ) -> Result<UniformBuffers> {
        if let Some(buffers) = self.uniforms {
            return Ok(buffers);
        }

        let scene = create_buffer(
            device,
            FrameResource::SceneUniforms,
            size_of::<SceneUniforms>(),
        )?;
        let view = match create_buffer(
            device,
            FrameResource::ViewUniforms,
            size_of::<ViewUniforms>(),
        ) {
            Ok(view) => view,
            Err(e) => {
                device.destroy_buffer(scene);
                return Err(e);
            }
        };

        log::debug!("Allocated uniform buffers");
        let buffers = UniformBuffers { scene, view };
        self.uniforms = Some(buffers);
        Ok(buffers)
    }

    /// Makes the core targets match `width` x `height` and allocates the
    /// auxiliary targets `mode` needs, as one all-or-nothing step.
    ///
    /// On an extent change the new core set and every auxiliary target of
    /// `mode` are created before anything old is destroyed. If any creation
    /// fails, everything created by this call is destroyed and the previous
    /// targets, auxiliary targets and extent are left in place.
    pub fn ensure_frame_targets<D: RenderDevice>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
        mode: Option<AntiAliasingMode>,
    ) -> Result<TargetChanges> {
        let auxiliary = mode.map_or(&[][..], AntiAliasingMode::auxiliary_targets);

        if self.extent() == Some((width, height)) {
            let missing: SmallVec<[FrameResource; 3]> = auxiliary
                .iter()
                .copied()
                .filter(|&r| self.auxiliary.get(r).is_none())
                .collect();
            let allocated = self.allocate(device, &missing, width, height)?;
            let created = self.install_auxiliary(&allocated);
            return Ok(TargetChanges {
                resized: false,
                created,
            });
        }

        let wanted: SmallVec<[FrameResource; 8]> = FrameResource::CORE_TARGETS
            .iter()
            .chain(auxiliary)
            .copied()
            .collect();
        let allocated = self.allocate(device, &wanted, width, height)?;
        let (core, extra) = allocated.split_at(FrameResource::CORE_TARGETS.len());

        self.release_auxiliary_except(device, None);
        let new_targets = RenderTargets {
            color: core[0].1,
            depth: core[1].1,
            velocity: core[2].1,
            resolve: core[3].1,
            post: core[4].1,
            width,
            height,
        };
        if let Some(old) = self.targets.replace(new_targets) {
            log::info!(
                "Render targets resized {}x{} -> {width}x{height}",
                old.width,
                old.height
            );
            for id in old.ids() {
                device.destroy_texture(id);
            }
        } else {
            log::debug!("Render targets allocated at {width}x{height}");
        }
        self.generation += 1;

        let created = self.install_auxiliary(extra);
        Ok(TargetChanges {
            resized: true,
            created,
        })
    }

    /// Makes the core targets match `width` x `height`.
    ///
    /// Returns `true` when the set was (re)created, `false` when the existing
    /// set already matched. All auxiliary targets are discarded on recreation.
    pub fn ensure_render_targets<D: RenderDevice>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<bool> {
        self.ensure_frame_targets(device, width, height, None)
            .map(|changes| changes.resized)
    }

    /// Allocates the auxiliary targets `mode` needs that do not exist yet.
    ///
    /// Returns the resources that were newly created. Does nothing before
    /// the core targets exist.
    pub fn ensure_auxiliary<D: RenderDevice>(
        &mut self,
        device: &mut D,
        mode: AntiAliasingMode,
    ) -> Result<SmallVec<[FrameResource; 2]>> {
        let Some((width, height)) = self.extent() else {
            return Ok(SmallVec::new());
        };
        self.ensure_frame_targets(device, width, height, Some(mode))
            .map(|changes| changes.created)
    }

    /// Creates a texture for each of `resources`, or none of them.
    fn allocate<D: RenderDevice>(
        &self,
        device: &mut D,
        resources: &[FrameResource],
        width: u32,
        height: u32,
    ) -> Result<SmallVec<[(FrameResource, TextureId); 8]>> {
        let mut created: SmallVec<[(FrameResource, TextureId); 8]> = SmallVec::new();
        for &resource in resources {
            match device.create_texture(&self.describe(resource, width, height)) {
                Ok(id) => created.push((resource, id)),
                Err(source) => {
                    log::warn!(
                        "Failed to allocate {} at {width}x{height}: {source}",
                        resource.name()
                    );
                    for (_, id) in created {
                        device.destroy_texture(id);
                    }
                    return Err(RenderError::TargetAllocation {
                        target: resource.name(),
                        width,
                        height,
                        source,
                    });
                }
            }
        }
        Ok(created)
    }

    fn install_auxiliary(
        &mut self,
        allocated: &[(FrameResource, TextureId)],
    ) -> SmallVec<[FrameResource; 2]> {
        let mut created = SmallVec::new();
        for &(resource, id) in allocated {
            if let Some(slot) = self.auxiliary.slot(resource) {
                *slot = Some(id);
                log::debug!("Allocated {}", resource.name());
                created.push(resource);
            }
        }
        created
    }

    /// Destroys auxiliary targets not used by `keep` (all of them for `None`).
    pub fn release_auxiliary_except<D: RenderDevice>(
        &mut self,
        device: &mut D,
        keep: Option<AntiAliasingMode>,
    ) {
        let needed = keep.map_or(&[][..], AntiAliasingMode::auxiliary_targets);

        for resource in [
            FrameResource::MsaaColor,
            FrameResource::MsaaDepth,
            FrameResource::History,
        ] {
            if needed.contains(&resource) {
                continue;
            }
            if let Some(id) = self.auxiliary.slot(resource).and_then(Option::take) {
                log::debug!("Released {}", resource.name());
                device.destroy_texture(id);
            }
        }
    }

    /// Destroys every resource owned by the allocator.
    pub fn release<D: RenderDevice>(&mut self, device: &mut D) {
        self.release_auxiliary_except(device, None);
        if let Some(targets) = self.targets.take() {
            for id in targets.ids() {
                device.destroy_texture(id);
            }
        }
        if let Some(buffers) = self.uniforms.take() {
            device.destroy_buffer(buffers.scene);
            device.destroy_buffer(buffers.view);
        }
    }

    // ── Descriptors ────────────────────────────────────────────────────────

    /// Descriptor for `resource` at the given extent.
    #[must_use]
    pub fn describe(&self, resource: FrameResource, width: u32, height: u32) -> TargetDesc {
        use wgpu::TextureUsages as U;

        let sampled = U::RENDER_ATTACHMENT | U::TEXTURE_BINDING;
        let samples = self.formats.msaa_samples;
        let (format, sample_count, usage) = match resource {
            FrameResource::Color => (self.formats.color, 1, sampled),
            FrameResource::Depth => (self.formats.depth, 1, sampled),
            FrameResource::Velocity => (self.formats.velocity, 1, sampled),
            FrameResource::Resolve => (self.formats.color, 1, sampled | U::COPY_SRC),
            FrameResource::Post => (self.formats.post, 1, sampled | U::COPY_SRC),
            FrameResource::MsaaColor => (self.formats.color, samples, U::RENDER_ATTACHMENT),
            FrameResource::MsaaDepth => (self.formats.depth, samples, U::RENDER_ATTACHMENT),
            FrameResource::History => (self.formats.color, 1, U::TEXTURE_BINDING | U::COPY_DST),
            FrameResource::SceneUniforms | FrameResource::ViewUniforms => {
                (self.formats.color, 1, U::empty())
            }
        };

        TargetDesc {
            label: resource.name(),
            width,
            height,
            format,
            sample_count,
            usage,
        }
    }
}

fn create_buffer<D: RenderDevice>(
    device: &mut D,
    resource: FrameResource,
    size: usize,
) -> Result<BufferId> {
    let size = size as u64;
    device
        .create_buffer(&BufferDesc {
            label: resource.name(),
            size,
        })
        .map_err(|source| RenderError::BufferAllocation {
            buffer: resource.name(),
            size,
            source,
        })
}
