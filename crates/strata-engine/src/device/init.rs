use crate::render::DEFAULT_STENCIL_FORMAT;

/// Initialization parameters for a headless GPU device.
///
/// Keep this structure minimal. Add flags only when a concrete backend
/// requirement exists.
#[derive(Debug, Clone)]
pub struct OffscreenInit {
    /// Color target format.
    ///
    /// A unorm format keeps the stored bytes equal to the blended values,
    /// which is what readback callers compare against.
    pub format: wgpu::TextureFormat,

    /// Coverage attachment format. Must carry a stencil aspect.
    pub stencil_format: wgpu::TextureFormat,

    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for OffscreenInit {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Rgba8Unorm,
            stencil_format: DEFAULT_STENCIL_FORMAT,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}
