//! Image objects: pixel formats, CPU storage and filters.
//!
//! Pixels live in the image's own format; conversions go through straight
//! alpha [`Color`](crate::paint::Color) values. The GPU texture is a mirror
//! refreshed from [`Image::revision`].

pub mod filter;
mod format;
mod image;

pub use filter::{
    ChannelMask, Convolution, FilterOptions, ImageChannel, SeparableConvolution, MAX_GAUSSIAN_STD_DEVIATION,
    MAX_KERNEL_SIZE,
};
pub use format::{BaseFormat, Channel, ChannelOrder, FormatDesc, ImageFormat};
pub use image::{Image, ImageQuality, TilingMode, MAX_IMAGE_DIMENSION};
