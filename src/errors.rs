//! Error Types
//!
//! This module defines the error types returned by the frame core.
//!
//! # Overview
//!
//! [`RenderError`] covers every way a frame can fail:
//! - Render target or uniform buffer allocation failures (fatal to the frame,
//!   renderer state left as it was before the frame)
//! - Precondition violations (no scene or camera set)
//! - Device failures surfaced unchanged from the device abstraction
//!
//! A zero-sized surface is *not* an error; `Renderer::render` reports it as a
//! skipped frame.
//!
//! ```rust,ignore
//! use aurora::errors::{RenderError, Result};
//!
//! fn draw(renderer: &mut Renderer<MyDevice>, surface: &MySurface) -> Result<()> {
//!     renderer.render(surface)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::device::DeviceError;
use crate::renderer::graph::{FrameResource, PassKind};

/// The main error type for the frame core.
#[derive(Error, Debug)]
pub enum RenderError {
    // ========================================================================
    // Resource Allocation Errors
    // ========================================================================
    /// A render target could not be created at the requested size.
    #[error("Failed to allocate {target} ({width}x{height}): {source}")]
    TargetAllocation {
        /// Name of the target being allocated
        target: &'static str,
        width: u32,
        height: u32,
        #[source]
        source: DeviceError,
    },

    /// A uniform buffer could not be created.
    #[error("Failed to allocate {buffer} ({size} bytes): {source}")]
    BufferAllocation {
        /// Name of the buffer being allocated
        buffer: &'static str,
        size: u64,
        #[source]
        source: DeviceError,
    },

    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// `render` was called with no live scene reference.
    #[error("No scene set (or the scene was dropped) before render")]
    MissingScene,

    /// `render` was called with no live camera reference.
    #[error("No camera set (or the camera was dropped) before render")]
    MissingCamera,

    /// A pass declared a resource that has no handle this frame.
    #[error("{pass:?} requires {resource:?}, which is not allocated")]
    UnboundResource {
        pass: PassKind,
        resource: FrameResource,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Failure reported by the device abstraction, passed through unchanged.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

impl RenderError {
    /// Whether the error came from a failed allocation.
    #[must_use]
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            Self::TargetAllocation { .. } | Self::BufferAllocation { .. }
        )
    }
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
