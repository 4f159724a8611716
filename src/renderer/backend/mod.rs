//! Device Backends
//!
//! Concrete [`RenderDevice`](crate::renderer::device::RenderDevice)
//! implementations. [`WgpuDevice`] runs the frame on a `wgpu` device; tests use
//! a recording mock instead.

mod passes;
mod wgpu_device;

pub use passes::{HistoryCopyEncoder, MsaaResolveEncoder};
pub use wgpu_device::{GpuTexture, PassEncoder, WgpuDevice, WgpuResources};
