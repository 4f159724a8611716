//! Device Abstraction Seam
//!
//! Everything the frame core asks of the GPU goes through [`RenderDevice`].
//! The core only issues logical requests ("allocate a target of WxH",
//! "upload N bytes to buffer B", "run pass P with these bindings",
//! "present texture T") and refers to GPU objects through opaque
//! [`TextureId`] / [`BufferId`] handles.
//!
//! # Contract
//!
//! | Request | Method |
//! |---------|--------|
//! | Render target creation / destruction | [`create_texture`](RenderDevice::create_texture), [`destroy_texture`](RenderDevice::destroy_texture) |
//! | Uniform buffer creation / destruction | [`create_buffer`](RenderDevice::create_buffer), [`destroy_buffer`](RenderDevice::destroy_buffer) |
//! | Uniform upload | [`write_buffer`](RenderDevice::write_buffer) |
//! | Pass execution | [`execute_pass`](RenderDevice::execute_pass) |
//! | Presentation | [`present`](RenderDevice::present) |
//! | Discarding a failed frame's recorded work | [`abort_frame`](RenderDevice::abort_frame) |
//!
//! Implementations are responsible for synchronization: a write issued with
//! `write_buffer` must not overwrite contents the GPU is still reading from
//! the previous frame, and pass outputs must be visible to later passes of
//! the same frame.

use thiserror::Error;

use crate::renderer::graph::{PassContext, PassKind};

slotmap::new_key_type! {
    /// Opaque handle to a device texture (render target).
    pub struct TextureId;
    /// Opaque handle to a device buffer (uniform storage).
    pub struct BufferId;
}

/// A bound GPU object, as seen by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceHandle {
    Texture(TextureId),
    Buffer(BufferId),
}

impl ResourceHandle {
    #[inline]
    #[must_use]
    pub fn texture(self) -> Option<TextureId> {
        match self {
            Self::Texture(id) => Some(id),
            Self::Buffer(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn buffer(self) -> Option<BufferId> {
        match self {
            Self::Buffer(id) => Some(id),
            Self::Texture(_) => None,
        }
    }
}

/// Anything the renderer can present into.
///
/// Only the current pixel extent matters to the frame core.
pub trait SurfaceExtent {
    /// Current `(width, height)` in pixels. Either may be zero (minimized window).
    fn extent(&self) -> (u32, u32);
}

impl SurfaceExtent for wgpu::Texture {
    fn extent(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

/// Descriptor for a 2D render target request.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub usage: wgpu::TextureUsages,
}

/// Descriptor for a uniform buffer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: &'static str,
    pub size: u64,
}

/// Failures reported by a [`RenderDevice`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The device could not satisfy an allocation.
    #[error("Out of device memory while allocating '{label}'")]
    OutOfMemory {
        /// Label of the resource being allocated
        label: &'static str,
    },

    /// The requested extent exceeds what the device supports.
    #[error("Extent {width}x{height} exceeds device limit {max}")]
    ExtentTooLarge { width: u32, height: u32, max: u32 },

    /// A handle that the device does not know (already destroyed or foreign).
    #[error("Unknown {kind} handle")]
    UnknownHandle {
        /// "texture" or "buffer"
        kind: &'static str,
    },

    /// No implementation is registered for the requested pass.
    #[error("No encoder registered for pass {0:?}")]
    PassUnavailable(PassKind),

    /// The presented texture does not match the surface.
    #[error("Cannot present {source_extent:?} into surface of {surface_extent:?}")]
    PresentMismatch {
        source_extent: (u32, u32),
        surface_extent: (u32, u32),
    },

    /// No adapter or device could be obtained.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// The device was lost.
    #[error("Device lost: {0}")]
    Lost(String),

    /// Command recording or submission failed.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
}

/// The GPU primitives the frame core is written against.
///
/// See the [module docs](self) for the synchronization contract.
pub trait RenderDevice {
    /// Presentation target type accepted by [`present`](Self::present).
    type Surface: SurfaceExtent + ?Sized;

    fn create_texture(&mut self, desc: &TargetDesc) -> Result<TextureId, DeviceError>;

    /// Destroys a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, id: TextureId);

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, DeviceError>;

    /// Destroys a buffer. Unknown handles are ignored.
    fn destroy_buffer(&mut self, id: BufferId);

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError>;

    /// Runs one pass with the bindings carried by `pass`.
    fn execute_pass(&mut self, pass: &PassContext) -> Result<(), DeviceError>;

    /// Copies / composites `source` into `surface` and flushes the frame's work.
    fn present(&mut self, source: TextureId, surface: &Self::Surface) -> Result<(), DeviceError>;

    /// Discards work recorded for the current frame that has not been
    /// submitted yet. Called when a pass or the present of a frame fails.
    fn abort_frame(&mut self) {}
}
