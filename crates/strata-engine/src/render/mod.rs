//! GPU rendering subsystem.
//!
//! Draw calls on a [`Context`](crate::context::Context) are planned on the CPU
//! ([`DrawPlan`]) and queued; [`PathRenderer`] later drains the queue and
//! issues GPU commands via wgpu. The renderer owns its pipelines and buffers;
//! textures are owned by the paints and images they mirror.
//!
//! Convention:
//! - CPU geometry is in user space; each pass carries the user-to-surface matrix.
//! - Surface space has a bottom-left origin, +Y up, in pixels.
//! - Coverage is resolved on a stencil attachment (`Stencil8` by default).

pub mod blend;
mod cache;
mod ctx;
pub mod mesh;
mod pipeline;
pub mod plan;
mod renderer;
mod texture;

pub use blend::{blend_state, BlendMode};
pub use cache::GeometryCache;
pub(crate) use cache::{update_fill, update_stroke};
pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{shade, PaintShading, SamplerKey, ShaderMode, TextureRef, Wrap};
pub use pipeline::{stencil_state, PipelineKey};
pub use plan::{
    ColorOutput, DrawPass, DrawPlan, DrawUniform, PathVertex, PlanEnv, ScissorBox, StencilMode, Topology,
    HAIRLINE_WIDTH,
};
pub use renderer::PathRenderer;
pub use texture::TextureMirror;

/// Default stencil attachment format.
pub const DEFAULT_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Stencil8;
