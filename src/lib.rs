#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod renderer;
pub mod scene;

pub use errors::{RenderError, Result};
pub use renderer::backend::{PassEncoder, WgpuDevice};
pub use renderer::device::{DeviceError, RenderDevice, SurfaceExtent};
pub use renderer::{
    AntiAliasingMode, FrameOutcome, FrameReport, Renderer, RendererSettings, SkipReason,
};
pub use scene::{CameraSource, PerspectiveCamera, SceneSource, SceneTransform};
