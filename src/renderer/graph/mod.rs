//! Pass pipeline organisation
//!
//! Provides:
//! - PassKind / FrameResource / PassDesc: what a pass is and what it touches
//! - PassPipeline: the ordered pass list selected by the anti-aliasing mode
//! - PassContext: per-pass bindings handed to the device each frame

pub mod context;
pub mod pass;
pub mod pipeline;

pub use context::{Binding, FrameInfo, PassContext, PassParams};
pub use pass::{FrameResource, PassDesc, PassKind};
pub use pipeline::{PassPipeline, PipelineError};
