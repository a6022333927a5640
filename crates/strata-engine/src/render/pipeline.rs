//! Pipeline variants used by path drawing.
//!
//! Draw passes differ only in fixed-function state (stencil, blend, color
//! writes, primitive topology); every variant shares one shader and one
//! pipeline layout.

use super::blend::blend_state;
use super::plan::{ColorOutput, DrawPass, PathVertex, StencilMode, Topology};

/// Fixed-function state selecting a cached pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub stencil: StencilMode,
    pub color: Option<ColorOutput>,
    pub topology: Topology,
}

impl PipelineKey {
    pub fn of(pass: &DrawPass) -> Self {
        Self { stencil: pass.stencil, color: pass.color, topology: pass.topology }
    }
}

fn face(compare: wgpu::CompareFunction, pass_op: wgpu::StencilOperation) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    }
}

/// Stencil test and update for `mode`; the pass supplies the reference.
pub fn stencil_state(mode: StencilMode) -> wgpu::StencilState {
    use wgpu::CompareFunction as Cmp;
    use wgpu::StencilOperation as Op;

    let both = |f: wgpu::StencilFaceState, write_mask: u32| wgpu::StencilState {
        front: f,
        back: f,
        read_mask: 0xff,
        write_mask,
    };
    match mode {
        StencilMode::None => wgpu::StencilState {
            front: wgpu::StencilFaceState::IGNORE,
            back: wgpu::StencilFaceState::IGNORE,
            read_mask: 0,
            write_mask: 0,
        },
        StencilMode::FillEvenOdd => both(face(Cmp::Always, Op::Invert), 0x01),
        StencilMode::FillNonZero => wgpu::StencilState {
            front: face(Cmp::Always, Op::IncrementWrap),
            back: face(Cmp::Always, Op::DecrementWrap),
            read_mask: 0xff,
            write_mask: 0xff,
        },
        StencilMode::Stroke => both(face(Cmp::NotEqual, Op::IncrementClamp), 0xff),
        StencilMode::CoverEqualOne => both(face(Cmp::Equal, Op::Zero), 0xff),
        StencilMode::CoverNonZero => both(face(Cmp::NotEqual, Op::Zero), 0xff),
        StencilMode::Clear => both(face(Cmp::Always, Op::Zero), 0xff),
    }
}

fn topology(t: Topology) -> wgpu::PrimitiveTopology {
    match t {
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    key: PipelineKey,
    color_format: wgpu::TextureFormat,
    stencil_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let (blend, write_mask) = match key.color {
        Some(out) => (Some(blend_state(out.blend, out.opaque)), wgpu::ColorWrites::ALL),
        None => (None, wgpu::ColorWrites::empty()),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("strata path pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[PathVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState { format: color_format, blend, write_mask })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: topology(key.topology),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        // The pass always carries a stencil attachment, so every variant
        // declares it even when the test is disabled.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: stencil_format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: stencil_state(key.stencil),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}
