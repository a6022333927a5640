//! Porter-Duff and separable blend modes mapped onto fixed-function blending.
//!
//! Colors reach the blender in straight (non-premultiplied) alpha, so every
//! mode weights the source by its own alpha where the formula calls for a
//! premultiplied source.

use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

/// Compositing mode applied when paint is written to the surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Replace the destination.
    Src,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    Multiply,
    Screen,
    Darken,
    Lighten,
    Additive,
}

const fn component(src: BlendFactor, dst: BlendFactor, op: BlendOperation) -> BlendComponent {
    BlendComponent { src_factor: src, dst_factor: dst, operation: op }
}

const fn add(src: BlendFactor, dst: BlendFactor) -> BlendComponent {
    component(src, dst, BlendOperation::Add)
}

/// Blend state for `mode`.
///
/// `opaque` promises that every source fragment has alpha 1; src-over then
/// degrades to a plain replace.
pub fn blend_state(mode: BlendMode, opaque: bool) -> BlendState {
    use BlendFactor::*;

    match mode {
        BlendMode::Src => BlendState::REPLACE,
        BlendMode::SrcOver if opaque => BlendState::REPLACE,
        BlendMode::SrcOver => BlendState {
            color: add(SrcAlpha, OneMinusSrcAlpha),
            alpha: add(One, OneMinusSrcAlpha),
        },
        BlendMode::DstOver => BlendState {
            color: add(OneMinusDstAlpha, DstAlpha),
            alpha: add(OneMinusDstAlpha, One),
        },
        BlendMode::SrcIn => BlendState {
            color: add(DstAlpha, Zero),
            alpha: add(DstAlpha, Zero),
        },
        BlendMode::DstIn => BlendState {
            color: add(Zero, SrcAlpha),
            alpha: add(Zero, SrcAlpha),
        },
        BlendMode::Multiply => BlendState {
            color: add(OneMinusDstAlpha, OneMinusSrcAlpha),
            alpha: add(One, OneMinusSrcAlpha),
        },
        BlendMode::Screen => BlendState {
            color: add(OneMinusDst, One),
            alpha: add(One, OneMinusSrcAlpha),
        },
        BlendMode::Darken => BlendState {
            color: component(One, One, BlendOperation::Min),
            alpha: add(One, OneMinusSrcAlpha),
        },
        BlendMode::Lighten => BlendState {
            color: component(One, One, BlendOperation::Max),
            alpha: component(One, One, BlendOperation::Max),
        },
        BlendMode::Additive => BlendState {
            color: add(SrcAlpha, DstAlpha),
            alpha: add(SrcAlpha, DstAlpha),
        },
    }
}
