/// GPU copy of CPU-side pixels (a paint's color ramp or an image).
///
/// The owner bumps a revision whenever its pixels change; [`sync`](Self::sync)
/// re-uploads only when the uploaded revision is stale, and recreates the
/// texture only when the size changes. Dropping the owner drops the texture.
#[derive(Debug, Default)]
pub struct TextureMirror {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    size: (u32, u32),
    uploaded: Option<u64>,
    /// Incremented whenever `texture` is recreated; bind groups built
    /// against an older generation are stale.
    generation: u64,
}

impl TextureMirror {
    /// True when revision `revision` is already on the GPU.
    #[inline]
    pub fn is_current(&self, revision: u64) -> bool {
        self.uploaded == Some(revision) && self.view.is_some()
    }

    #[inline]
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Uploads `pixels()` (tightly packed RGBA8 rows) when stale.
    ///
    /// A zero-sized request releases the texture instead.
    #[allow(clippy::too_many_arguments)]
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        revision: u64,
        pixels: impl FnOnce() -> Vec<u8>,
    ) {
        if width == 0 || height == 0 {
            self.release();
            return;
        }
        if self.is_current(revision) && self.size == (width, height) {
            return;
        }

        if self.texture.is_none() || self.size != (width, height) {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            self.texture = Some(texture);
            self.size = (width, height);
            self.generation = self.generation.wrapping_add(1);
            log::debug!("{label}: texture allocated ({width}x{height})");
        }

        let Some(texture) = self.texture.as_ref() else { return };
        let bytes = pixels();
        let expected = width as usize * height as usize * 4;
        if bytes.len() < expected {
            log::debug!("{label}: {} bytes supplied for a {expected}-byte upload; skipped", bytes.len());
            return;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes[..expected],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.uploaded = Some(revision);
    }

    /// Drops the GPU texture; the next sync re-creates it.
    pub fn release(&mut self) {
        if self.texture.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        self.view = None;
        self.size = (0, 0);
        self.uploaded = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_mirror_is_never_current() {
        let m = TextureMirror::default();
        assert!(!m.is_current(0));
        assert!(m.view().is_none());
        assert_eq!(m.generation(), 0);
    }

    #[test]
    fn release_without_texture_keeps_generation() {
        let mut m = TextureMirror::default();
        m.release();
        assert_eq!(m.generation(), 0);
        assert!(!m.is_current(0));
    }
}
