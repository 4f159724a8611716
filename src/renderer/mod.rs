//! Frame Orchestrator
//!
//! [`Renderer`] drives one frame per [`render`](Renderer::render) call:
//!
//! ```text
//! surface extent ─► scene / camera ─► targets & uniforms buffers
//!        │                                   │
//!        ▼                                   ▼
//!   (zero: skip)        apply pending mode / scene, jitter
//!                                            │
//!                                            ▼
//!                       scene block (if dirty) ─► view block
//!                                            │
//!                                            ▼
//!                       mode pipeline: bind + execute each pass
//!                                            │
//!                                            ▼
//!                       present post ─► record temporal state ─► frame++
//! ```
//!
//! All GPU work goes through the [`RenderDevice`] the renderer was created
//! with. The scene and camera are borrowed through `Weak` references and
//! re-validated every frame.

pub mod backend;
pub mod device;
pub mod graph;
pub mod settings;
pub mod targets;
pub mod temporal;
pub mod uniforms;

use std::sync::{Arc, Weak};

use glam::Vec2;
use smallvec::SmallVec;

use crate::errors::{RenderError, Result};
use crate::scene::{CameraSource, SceneSource};

pub use self::device::{RenderDevice, SurfaceExtent};
pub use self::graph::{FrameInfo, PassContext, PassKind, PassParams};
pub use self::settings::{AntiAliasingMode, RendererSettings};
pub use self::targets::{FrameResources, RenderTargets, TargetChanges};
pub use self::temporal::TemporalState;
pub use self::uniforms::{SceneUniforms, UniformUpdater, ViewUniforms};

use self::graph::{FrameResource, PassPipeline};

/// Why a frame was not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The surface has a zero width or height (e.g. a minimized window).
    ZeroExtent,
}

/// Summary of one presented frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_number: u64,
    pub mode: AntiAliasingMode,
    pub extent: (u32, u32),
    /// Passes executed, in order.
    pub passes: SmallVec<[PassKind; 4]>,
    /// The core targets were (re)allocated this frame.
    pub resized: bool,
    /// The scene uniform block was written this frame.
    pub scene_uploaded: bool,
    /// Scene block uploads since the renderer was created.
    pub scene_uploads: u64,
    /// View block uploads since the renderer was created.
    pub view_uploads: u64,
    pub jitter: Vec2,
    /// History validity handed to the temporal resolve (always `false`
    /// outside TAA).
    pub history_valid: bool,
}

/// Result of a [`Renderer::render`] call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Presented(FrameReport),
    Skipped(SkipReason),
}

impl FrameOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            Self::Presented(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Per-frame orchestration over a [`RenderDevice`].
pub struct Renderer<D: RenderDevice> {
    device: D,
    settings: RendererSettings,

    // === Anti-aliasing ===
    aa: AntiAliasingMode,
    pending_aa: Option<AntiAliasingMode>,

    // === Frame inputs (not owned) ===
    scene: Option<Weak<dyn SceneSource>>,
    pending_scene: Option<Weak<dyn SceneSource>>,
    camera: Option<Weak<dyn CameraSource>>,

    // === Subsystems ===
    resources: FrameResources,
    temporal: TemporalState,
    uniforms: UniformUpdater,

    frame_number: u64,
}

impl<D: RenderDevice> Renderer<D> {
    /// Creates a renderer. No device resources are allocated until the first
    /// rendered frame.
    pub fn new(device: D, settings: RendererSettings) -> Self {
        let settings = settings.validated();
        log::debug!(
            "Renderer created (AA: {}, jitter period: {})",
            settings.anti_aliasing.name(),
            settings.jitter_period
        );

        Self {
            resources: FrameResources::new(&settings),
            temporal: TemporalState::new(settings.jitter_period),
            uniforms: UniformUpdater::new(),
            aa: settings.anti_aliasing,
            pending_aa: None,
            scene: None,
            pending_scene: None,
            camera: None,
            frame_number: 0,
            device,
            settings,
        }
    }

    // ========================================================================
    // Frame inputs
    // ========================================================================

    /// Sets the scene to draw from the next rendered frame on.
    ///
    /// Only a weak reference is kept. Replacing the scene always re-uploads
    /// the scene uniform block, even if the same scene is set again.
    pub fn set_scene<S: SceneSource + 'static>(&mut self, scene: &Arc<S>) {
        let weak: Weak<S> = Arc::downgrade(scene);
        self.pending_scene = Some(weak as Weak<dyn SceneSource>);
    }

    /// Sets the camera. Only a weak reference is kept.
    pub fn set_camera<C: CameraSource + 'static>(&mut self, camera: &Arc<C>) {
        let weak: Weak<C> = Arc::downgrade(camera);
        self.camera = Some(weak as Weak<dyn CameraSource>);
    }

    /// Requests an anti-aliasing mode. Applied at the start of the next
    /// rendered frame; a later call before that frame replaces the request.
    pub fn set_aa(&mut self, mode: AntiAliasingMode) {
        if mode == self.aa && self.pending_aa.is_none() {
            return;
        }
        log::debug!("AA mode requested: {}", mode.name());
        self.pending_aa = Some(mode);
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Renders and presents one frame into `surface`.
    ///
    /// A zero-sized surface returns [`FrameOutcome::Skipped`] without touching
    /// any state. On an allocation error no partial target set is kept and
    /// the mode, scene and frame counter are left as they were; calling
    /// `render` again retries. When a pass or the present fails, the work
    /// recorded for the frame is discarded through
    /// [`RenderDevice::abort_frame`].
    pub fn render(&mut self, surface: &D::Surface) -> Result<FrameOutcome> {
        let (width, height) = surface.extent();
        if width == 0 || height == 0 {
            log::debug!(
                "Frame {} skipped: surface extent {width}x{height}",
                self.frame_number
            );
            return Ok(FrameOutcome::Skipped(SkipReason::ZeroExtent));
        }

        let scene = self
            .pending_scene
            .as_ref()
            .or(self.scene.as_ref())
            .and_then(Weak::upgrade)
            .ok_or(RenderError::MissingScene)?;
        let camera = self
            .camera
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(RenderError::MissingCamera)?;

        // 1. Resources
        let buffers = self.resources.ensure_uniform_buffers(&mut self.device)?;
        let mode = self.pending_aa.unwrap_or(self.aa);
        let changes = self.resources.ensure_frame_targets(
            &mut self.device,
            width,
            height,
            Some(mode),
        )?;
        if changes.resized || changes.created.contains(&FrameResource::History) {
            self.temporal.invalidate_history();
        }

        // 2. Pending state
        if let Some(mode) = self.pending_aa.take() {
            self.apply_mode(mode);
        }
        if let Some(scene) = self.pending_scene.take() {
            self.scene = Some(scene);
            self.uniforms.mark_scene_dirty();
        }

        // 3. Uniforms
        let jitter = self.temporal.compute_jitter(self.frame_number, self.aa);
        let scene_uploaded =
            self.uniforms
                .update_scene_buffer(&mut self.device, buffers.scene, &*scene)?;
        let view = self.uniforms.update_view_buffer(
            &mut self.device,
            buffers.view,
            &*camera,
            &self.temporal,
            jitter,
        )?;

        // 4. Passes and present
        let pipeline = self.aa.pipeline();
        debug_assert!(
            pipeline.validate().is_ok(),
            "invalid {} pipeline: {:?}",
            self.aa.name(),
            pipeline.validate()
        );

        let frame = FrameInfo {
            frame_number: self.frame_number,
            extent: (width, height),
            jitter,
        };
        let history_valid = self.aa.is_temporal() && self.temporal.history_valid();

        if let Err(e) = self.execute_pipeline(&pipeline, frame, surface) {
            log::warn!("Frame {} aborted: {e}", self.frame_number);
            self.device.abort_frame();
            return Err(e);
        }

        // 5. Bookkeeping
        self.temporal.advance(view.view, view.projection, jitter);
        if self.aa.is_temporal() {
            self.temporal.mark_history_written();
        }

        let report = FrameReport {
            frame_number: self.frame_number,
            mode: self.aa,
            extent: (width, height),
            passes: pipeline.kinds(),
            resized: changes.resized,
            scene_uploaded,
            scene_uploads: self.uniforms.scene_uploads(),
            view_uploads: self.uniforms.view_uploads(),
            jitter,
            history_valid,
        };
        log::debug!(
            "Frame {} presented ({}, {width}x{height}, {} passes)",
            report.frame_number,
            report.mode.name(),
            report.passes.len()
        );

        self.frame_number += 1;
        Ok(FrameOutcome::Presented(report))
    }

    /// Binds and executes every pass of `pipeline`, then presents the post
    /// target.
    fn execute_pipeline(
        &mut self,
        pipeline: &PassPipeline,
        frame: FrameInfo,
        surface: &D::Surface,
    ) -> Result<()> {
        for desc in pipeline.passes() {
            let params = self.pass_params(desc.kind);
            let resources = &self.resources;
            let pass = PassContext::bind(desc, frame, params, |r| resources.resolve(r))?;
            log::trace!("Frame {}: {}", frame.frame_number, desc.kind.name());
            self.device.execute_pass(&pass)?;
        }

        let post = self
            .resources
            .resolve(FrameResource::Post)
            .and_then(device::ResourceHandle::texture)
            .ok_or(RenderError::UnboundResource {
                pass: PassKind::Post,
                resource: FrameResource::Post,
            })?;
        self.device.present(post, surface)?;
        Ok(())
    }

    fn apply_mode(&mut self, mode: AntiAliasingMode) {
        if mode == self.aa {
            return;
        }

        log::debug!("AA mode {} -> {}", self.aa.name(), mode.name());
        self.resources
            .release_auxiliary_except(&mut self.device, Some(mode));
        if mode.is_temporal() {
            self.temporal.invalidate_history();
        }
        self.aa = mode;
    }

    fn pass_params(&self, kind: PassKind) -> PassParams {
        match kind {
            PassKind::MsaaResolve => PassParams::MsaaResolve {
                sample_count: self.settings.msaa_samples,
            },
            PassKind::TemporalResolve => PassParams::TemporalResolve {
                blend_weight: self.settings.history_blend,
                history_valid: self.temporal.history_valid(),
            },
            _ => PassParams::None,
        }
    }

    /// Releases every device resource and forgets the previous frame. The
    /// next `render` allocates afresh.
    pub fn shutdown(&mut self) {
        self.resources.release(&mut self.device);
        self.temporal.reset();
        self.uniforms.mark_scene_dirty();
        log::debug!("Renderer resources released");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Mode used by the last rendered frame (or the initial mode).
    #[inline]
    #[must_use]
    pub fn aa(&self) -> AntiAliasingMode {
        self.aa
    }

    #[inline]
    #[must_use]
    pub fn pending_aa(&self) -> Option<AntiAliasingMode> {
        self.pending_aa
    }

    /// Number of frames presented so far.
    #[inline]
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[inline]
    #[must_use]
    pub fn extent(&self) -> Option<(u32, u32)> {
        self.resources.extent()
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> Option<&RenderTargets> {
        self.resources.targets()
    }

    #[inline]
    #[must_use]
    pub fn resources(&self) -> &FrameResources {
        &self.resources
    }

    #[inline]
    #[must_use]
    pub fn temporal(&self) -> &TemporalState {
        &self.temporal
    }

    /// Last uploaded view block.
    #[inline]
    #[must_use]
    pub fn view_uniforms(&self) -> &ViewUniforms {
        self.uniforms.view_block()
    }

    /// Last uploaded scene block.
    #[inline]
    #[must_use]
    pub fn scene_uniforms(&self) -> &SceneUniforms {
        self.uniforms.scene_block()
    }

    #[inline]
    #[must_use]
    pub fn uniforms(&self) -> &UniformUpdater {
        &self.uniforms
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable device access, e.g. to register pass encoders.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
