use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::context::Context;
use crate::render::{RenderCtx, RenderTarget};

use super::mesh::{SamplerKey, TextureRef, Wrap};
use super::pipeline::{create_pipeline, PipelineKey};
use super::plan::{DrawPlan, DrawUniform, PathVertex, ScissorBox};

/// One pass of a queued plan, flattened into frame-wide buffers.
struct Draw {
    key: PipelineKey,
    vertices: std::ops::Range<u32>,
    uniform_offset: u32,
    bind_group: usize,
    stencil_ref: u32,
    scissor: Option<ScissorBox>,
}

/// Executes the draw plans a [`Context`] has queued.
///
/// All plans queued since the previous call are drawn in one render pass, in
/// call order. The color attachment is loaded and stored; the stencil
/// attachment starts cleared and every plan leaves it zeroed.
///
/// Pipelines are created lazily per fixed-function variant and cached until
/// the attachment formats change.
#[derive(Default)]
pub struct PathRenderer {
    formats: Option<(wgpu::TextureFormat, wgpu::TextureFormat)>,
    shader: Option<wgpu::ShaderModule>,
    uniform_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    samplers: HashMap<SamplerKey, wgpu::Sampler>,
    white_view: Option<wgpu::TextureView>,

    uniform_ubo: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_capacity: usize,
    uniform_stride: u64,

    vbo: Option<wgpu::Buffer>,
    vertex_capacity: usize,

    warned_missing_texture: bool,
}

impl PathRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains `context`'s queued plans into `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, context: &mut Context) {
        let plans = context.take_plans();
        if plans.is_empty() {
            context.release_retired();
            return;
        }

        self.ensure_layouts(ctx);
        self.ensure_default_texture(ctx);
        self.sync_textures(ctx, context, &plans);

        // ── flatten plans into frame buffers ───────────────────────────────
        let uniform_stride = self.uniform_stride(ctx);
        let mut vertices: Vec<PathVertex> = Vec::new();
        let mut uniforms: Vec<DrawUniform> = Vec::new();
        let mut bind_groups: Vec<wgpu::BindGroup> = Vec::new();
        let mut bind_group_index: HashMap<(TextureRef, SamplerKey), usize> = HashMap::new();
        let mut draws: Vec<Draw> = Vec::new();

        for plan in &plans {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&plan.vertices);
            for pass in &plan.passes {
                let key = (pass.texture, pass.sampler);
                let bind_group = match bind_group_index.get(&key) {
                    Some(&i) => i,
                    None => {
                        let Some(bg) = self.texture_bind_group(ctx, context, pass.texture, pass.sampler) else {
                            continue;
                        };
                        bind_groups.push(bg);
                        bind_group_index.insert(key, bind_groups.len() - 1);
                        bind_groups.len() - 1
                    }
                };
                draws.push(Draw {
                    key: PipelineKey::of(pass),
                    vertices: base + pass.vertices.start..base + pass.vertices.end,
                    uniform_offset: (uniforms.len() as u64 * uniform_stride) as u32,
                    bind_group,
                    stencil_ref: pass.stencil.reference(),
                    scissor: plan.scissor,
                });
                uniforms.push(pass.uniform);
            }
        }
        context.release_retired();

        if draws.is_empty() || vertices.is_empty() {
            return;
        }

        for d in &draws {
            self.ensure_pipeline(ctx, d.key);
        }
        self.ensure_vertex_capacity(ctx, vertices.len());
        self.ensure_uniform_capacity(ctx, uniforms.len());

        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(ubo) = self.uniform_ubo.as_ref() else { return };
        let Some(uniform_bg) = self.uniform_bind_group.as_ref() else { return };

        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
        let mut staging = vec![0u8; uniforms.len() * uniform_stride as usize];
        for (i, u) in uniforms.iter().enumerate() {
            let at = i * uniform_stride as usize;
            staging[at..at + std::mem::size_of::<DrawUniform>()].copy_from_slice(bytemuck::bytes_of(u));
        }
        ctx.queue.write_buffer(ubo, 0, &staging);

        let (vw, vh) = ctx.viewport.extent();

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("strata path pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.stencil_view,
                depth_ops: None,
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Discard,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, vbo.slice(..));

        for d in &draws {
            let Some(pipeline) = self.pipelines.get(&d.key) else { continue };
            let (sx, sy, sw, sh) = match d.scissor {
                Some(s) => (s.x.min(vw), s.y.min(vh), s.width, s.height),
                None => (0, 0, vw, vh),
            };
            let sw = sw.min(vw - sx);
            let sh = sh.min(vh - sy);
            if sw == 0 || sh == 0 {
                continue;
            }
            rpass.set_scissor_rect(sx, sy, sw, sh);
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, uniform_bg, &[d.uniform_offset]);
            rpass.set_bind_group(1, &bind_groups[d.bind_group], &[]);
            rpass.set_stencil_reference(d.stencil_ref);
            rpass.draw(d.vertices.clone(), 0..1);
        }
    }

    fn uniform_stride(&mut self, ctx: &RenderCtx<'_>) -> u64 {
        if self.uniform_stride == 0 {
            let align = ctx.device.limits().min_uniform_buffer_offset_alignment.max(1) as u64;
            let size = std::mem::size_of::<DrawUniform>() as u64;
            self.uniform_stride = size.div_ceil(align) * align;
        }
        self.uniform_stride
    }

    fn sync_textures(&mut self, ctx: &RenderCtx<'_>, context: &mut Context, plans: &[DrawPlan]) {
        for t in plans.iter().flat_map(DrawPlan::textures) {
            match t {
                TextureRef::None => {}
                TextureRef::Ramp(h) => {
                    if let Some(paint) = context.paint_resource_mut(h) {
                        paint.sync_texture(ctx.device, ctx.queue);
                    }
                }
                TextureRef::Image(h) => {
                    if let Some(image) = context.image_resource_mut(h) {
                        image.sync_texture(ctx.device, ctx.queue);
                    }
                }
            }
        }
    }

    fn texture_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        context: &Context,
        texture: TextureRef,
        sampler: SamplerKey,
    ) -> Option<wgpu::BindGroup> {
        self.ensure_sampler(ctx, sampler);
        let layout = self.texture_layout.as_ref()?;
        let sampler = self.samplers.get(&sampler)?;

        let view = match texture {
            TextureRef::None => self.white_view.as_ref(),
            TextureRef::Ramp(h) => context.paint_resource(h).and_then(|p| p.texture.view()),
            TextureRef::Image(h) => context.image_resource(h).and_then(|i| i.texture.view()),
        };
        let Some(view) = view else {
            if !self.warned_missing_texture {
                log::debug!("PathRenderer: {texture:?} has no GPU texture; pass skipped");
                self.warned_missing_texture = true;
            }
            return None;
        };

        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata paint bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        }))
    }

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        let formats = (ctx.surface_format, ctx.stencil_format);
        if self.formats == Some(formats) && self.pipeline_layout.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("strata path shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/path.wgsl").into()),
        });

        let uniform_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata draw uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata paint texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata path pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        self.formats = Some(formats);
        self.shader = Some(shader);
        self.uniform_layout = Some(uniform_layout);
        self.texture_layout = Some(texture_layout);
        self.pipeline_layout = Some(pipeline_layout);
        self.pipelines.clear();

        self.uniform_ubo = None;
        self.uniform_bind_group = None;
        self.uniform_capacity = 0;
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(layout) = self.pipeline_layout.as_ref() else { return };
        let Some(shader) = self.shader.as_ref() else { return };
        let pipeline = create_pipeline(ctx.device, layout, shader, key, ctx.surface_format, ctx.stencil_format);
        log::debug!("PathRenderer: pipeline created for {key:?}");
        self.pipelines.insert(key, pipeline);
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>, key: SamplerKey) {
        if self.samplers.contains_key(&key) {
            return;
        }
        let address = match key.wrap {
            Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::Mirror => wgpu::AddressMode::MirrorRepeat,
        };
        let filter = if key.linear { wgpu::FilterMode::Linear } else { wgpu::FilterMode::Nearest };
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("strata paint sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });
        self.samplers.insert(key, sampler);
    }

    /// 1×1 white texture bound when a pass samples nothing.
    fn ensure_default_texture(&mut self, ctx: &RenderCtx<'_>) {
        if self.white_view.is_some() {
            return;
        }
        let texture = ctx.device.create_texture_with_data(
            ctx.queue,
            &wgpu::TextureDescriptor {
                label: Some("strata white texture"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        self.white_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vertex_capacity && self.vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(64);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata path vbo"),
            size: (new_cap * std::mem::size_of::<PathVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertex_capacity = new_cap;
    }

    fn ensure_uniform_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.uniform_capacity && self.uniform_bind_group.is_some() {
            return;
        }
        let Some(layout) = self.uniform_layout.as_ref() else { return };

        let new_cap = required.next_power_of_two().max(64);
        let stride = self.uniform_stride;
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata draw ubo"),
            size: new_cap as u64 * stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata draw uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });

        self.uniform_ubo = Some(ubo);
        self.uniform_bind_group = Some(bind_group);
        self.uniform_capacity = new_cap;
    }
}
