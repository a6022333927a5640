//! Strata engine crate.
//!
//! A 2D vector-graphics engine: paths are flattened and stroked on the CPU,
//! then filled and painted on the GPU through a stencil coverage mask.
//!
//! - [`context`]: the rendering context, object registries and draw API
//! - [`path`] / [`stroke`]: geometry and stroke expansion
//! - [`paint`] / [`image`]: paint sources and pixel images
//! - [`render`]: draw planning and the wgpu renderer
//! - [`device`]: headless device bootstrap

pub mod device;
pub mod logging;

pub mod context;
pub mod coords;
pub mod image;
pub mod paint;
pub mod path;
pub mod render;
pub mod stroke;
