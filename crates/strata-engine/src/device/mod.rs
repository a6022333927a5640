//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - allocating offscreen color and stencil targets
//! - providing encoders and render targets, and reading frames back
//!
//! Window surfaces belong to the embedding application.

mod frame;
mod init;
mod offscreen;

pub use frame::OffscreenFrame;
pub use init::OffscreenInit;
pub use offscreen::OffscreenGpu;
