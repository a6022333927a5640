use anyhow::{Context, Result};

use crate::coords::Viewport;
use crate::render::{RenderCtx, RenderTarget};

use super::{OffscreenFrame, OffscreenInit};

/// Owns wgpu core objects and a color + stencil render target pair.
///
/// This type is the headless rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - allocates the color target and its stencil attachment
/// - hands out encoders and reads finished frames back
pub struct OffscreenGpu {
    /// Kept alive for the adapter and device.
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    format: wgpu::TextureFormat,
    stencil_format: wgpu::TextureFormat,
    attachments: Attachments,
}

struct Attachments {
    width: u32,
    height: u32,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _stencil: wgpu::Texture,
    stencil_view: wgpu::TextureView,
}

impl Attachments {
    fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        stencil_format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = |label, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let color = texture(
            "strata color target",
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let stencil = texture("strata stencil target", stencil_format, wgpu::TextureUsages::RENDER_ATTACHMENT);
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let stencil_view = stencil.create_view(&wgpu::TextureViewDescriptor::default());

        Self { width, height, color, color_view, _stencil: stencil, stencil_view }
    }
}

impl OffscreenGpu {
    /// Creates a headless GPU context with `width × height` targets.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(width: u32, height: u32, init: OffscreenInit) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");
        anyhow::ensure!(
            init.stencil_format.has_stencil_aspect(),
            "{:?} has no stencil aspect",
            init.stencil_format
        );

        let OffscreenInit { format, stencil_format, power_preference, required_features, required_limits } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("strata-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::debug!("offscreen device ready: {:?}, {width}x{height} {format:?}", adapter.get_info().backend);

        let attachments = Attachments::new(&device, width, height, format, stencil_format);
        Ok(Self { _instance: instance, adapter, device, queue, format, stencil_format, attachments })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn new_blocking(width: u32, height: u32, init: OffscreenInit) -> Result<Self> {
        pollster::block_on(Self::new(width, height, init))
    }

    #[inline]
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub fn stencil_format(&self) -> wgpu::TextureFormat {
        self.stencil_format
    }

    /// Target size in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.attachments.width, self.attachments.height)
    }

    #[inline]
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.attachments.color
    }

    /// Reallocates both targets. Zero sizes are ignored; the previous
    /// contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return;
        }
        self.attachments = Attachments::new(&self.device, width, height, self.format, self.stencil_format);
    }

    /// Renderer-facing view of this device and its target size.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        let (w, h) = self.size();
        RenderCtx::new(
            &self.device,
            &self.queue,
            self.format,
            self.stencil_format,
            Viewport::new(w as f32, h as f32),
        )
    }

    pub fn begin_frame(&self) -> OffscreenFrame {
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("strata frame encoder"),
        });
        OffscreenFrame { encoder }
    }

    /// Render target recording into `frame`.
    pub fn target<'a>(&'a self, frame: &'a mut OffscreenFrame) -> RenderTarget<'a> {
        RenderTarget::new(&mut frame.encoder, &self.attachments.color_view, &self.attachments.stencil_view)
    }

    /// Clears the color target to `color` (straight RGBA).
    pub fn clear(&self, frame: &mut OffscreenFrame, color: [f64; 4]) {
        let [r, g, b, a] = color;
        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("strata target clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.attachments.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    /// Submits the recorded commands for the given frame.
    pub fn submit(&self, frame: OffscreenFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
    }

    /// Copies the color target to the CPU as tightly packed rows, top row
    /// first. Only 4-byte color formats are supported.
    pub fn read_pixels(&self) -> Result<Vec<u8>> {
        let bytes = self.format.block_copy_size(None).unwrap_or(0);
        anyhow::ensure!(bytes == 4, "readback needs a 4-byte color format, got {:?}", self.format);

        let (width, height) = self.size();
        let row = width * 4;
        let padded = row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("strata readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.attachments.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for readback")?;
        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        let mut out = Vec::with_capacity(row as usize * height as usize);
        {
            let mapped = buffer.slice(..).get_mapped_range();
            for chunk in mapped.chunks_exact(padded as usize) {
                out.extend_from_slice(&chunk[..row as usize]);
            }
        }
        buffer.unmap();
        Ok(out)
    }
}
