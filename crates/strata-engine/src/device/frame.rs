/// Commands recorded for one offscreen frame.
///
/// Short-lived: obtain with [`OffscreenGpu::begin_frame`](super::OffscreenGpu::begin_frame),
/// record through a render target, then hand back to
/// [`OffscreenGpu::submit`](super::OffscreenGpu::submit).
pub struct OffscreenFrame {
    pub encoder: wgpu::CommandEncoder,
}
