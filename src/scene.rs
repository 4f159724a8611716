//! Scene & Camera Query Surface
//!
//! The frame core never owns scene or camera data. It reads them through two
//! small traits each frame:
//!
//! - [`SceneSource`]: the scene transform plus a change version
//! - [`CameraSource`]: the current view and projection matrices
//!
//! The renderer keeps only `Weak` references to them (see
//! [`Renderer::set_scene`](crate::renderer::Renderer::set_scene)), so the
//! application decides their lifetime. Data that the application mutates while
//! the renderer holds a reference can be wrapped in a
//! [`parking_lot::RwLock`], which implements both traits by delegation.
//!
//! [`SceneTransform`] and [`PerspectiveCamera`] are minimal implementations.

use glam::{Mat4, Vec3};
use parking_lot::RwLock;

/// Read-only view of a scene as needed by the frame core.
pub trait SceneSource {
    /// Scene-wide transform uploaded into the scene uniform block.
    fn transform(&self) -> Mat4;

    /// Change version, bumped whenever the transform changes.
    ///
    /// Sources that never change may keep the default.
    fn version(&self) -> u64 {
        0
    }
}

/// Read-only view of a camera.
pub trait CameraSource {
    fn view_matrix(&self) -> Mat4;

    /// Unjittered projection matrix.
    fn projection_matrix(&self) -> Mat4;
}

impl<T: SceneSource> SceneSource for RwLock<T> {
    fn transform(&self) -> Mat4 {
        self.read().transform()
    }

    fn version(&self) -> u64 {
        self.read().version()
    }
}

impl<T: CameraSource> CameraSource for RwLock<T> {
    fn view_matrix(&self) -> Mat4 {
        self.read().view_matrix()
    }

    fn projection_matrix(&self) -> Mat4 {
        self.read().projection_matrix()
    }
}

// ============================================================================
// Minimal implementations
// ============================================================================

/// A scene reduced to its transform, with a change version.
#[derive(Debug, Clone)]
pub struct SceneTransform {
    transform: Mat4,
    version: u64,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

impl SceneTransform {
    #[must_use]
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            version: 0,
        }
    }

    /// Replaces the transform and bumps the version.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.version = self.version.wrapping_add(1);
    }
}

impl SceneSource for SceneTransform {
    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Right-handed perspective camera looking from `eye` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    /// Updates the aspect ratio from an output extent. Zero heights are ignored.
    pub fn set_extent(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

impl CameraSource for PerspectiveCamera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}
