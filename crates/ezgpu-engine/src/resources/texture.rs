use bytemuck::Pod;

use crate::device::Gpu;
use crate::error::{Error, Result};

/// Sampling parameters shared by 2D and cube textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub wrap: wgpu::AddressMode,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            wrap: wgpu::AddressMode::Repeat,
        }
    }
}

impl TextureParams {
    /// Same filter for magnification and minification.
    pub const fn new(filter: wgpu::FilterMode, wrap: wgpu::AddressMode) -> Self {
        Self {
            mag_filter: filter,
            min_filter: filter,
            wrap,
        }
    }

    /// Nearest filtering, clamped edges: the usual render-target sampling.
    pub const fn nearest_clamp() -> Self {
        Self::new(wgpu::FilterMode::Nearest, wgpu::AddressMode::ClampToEdge)
    }

    pub(crate) fn create_sampler(&self, gpu: &Gpu, label: &str) -> wgpu::Sampler {
        gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.wrap,
            address_mode_v: self.wrap,
            address_mode_w: self.wrap,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            ..Default::default()
        })
    }
}

/// Bytes per texel for formats accepting CPU uploads.
pub(crate) fn texel_size(format: wgpu::TextureFormat) -> Result<u32> {
    if format.is_depth_stencil_format() || format.block_dimensions() != (1, 1) {
        return Err(Error::UnsupportedFormat(format));
    }
    format
        .block_copy_size(None)
        .ok_or(Error::UnsupportedFormat(format))
}

/// Usages requested for every texture, filtered by what the adapter allows.
pub(crate) fn texture_usages(allowed: wgpu::TextureUsages) -> wgpu::TextureUsages {
    let wanted = wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_DST
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::STORAGE_BINDING;
    wanted & allowed
}

struct Allocated {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// 2D texture that may exist before it has a size.
///
/// Render targets are typically declared first and sized by their
/// framebuffer; [`Texture2D::resize`] allocates (or reallocates) the storage.
/// Reallocation discards the previous content.
pub struct Texture2D {
    label: String,
    format: wgpu::TextureFormat,
    params: TextureParams,
    sampler: Option<wgpu::Sampler>,
    storage: Option<Allocated>,
}

impl Texture2D {
    /// Declares a texture without GPU storage.
    pub fn new(label: &str, format: wgpu::TextureFormat, params: TextureParams) -> Self {
        Self {
            label: label.to_string(),
            format,
            params,
            sampler: None,
            storage: None,
        }
    }

    /// Declares and allocates a `width x height` texture.
    pub fn with_size(
        gpu: &Gpu,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        params: TextureParams,
    ) -> Result<Self> {
        let mut tex = Self::new(label, format, params);
        tex.alloc(gpu, width, height)?;
        Ok(tex)
    }

    /// Allocates storage.
    ///
    /// Zero sizes are rejected with [`Error::ZeroSize`]; sizes above the
    /// device limits with [`Error::Wgpu`]. On error the previous storage is
    /// kept.
    pub fn alloc(&mut self, gpu: &Gpu, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroSize("texture alloc"));
        }
        self.allocate(gpu, width, height)
    }

    /// Reallocates when the size changes. Zero sizes are ignored.
    ///
    /// Returns whether a new allocation was made.
    pub fn resize(&mut self, gpu: &Gpu, width: u32, height: u32) -> Result<bool> {
        if width == 0 || height == 0 || self.size() == Some((width, height)) {
            return Ok(false);
        }
        self.allocate(gpu, width, height)?;
        Ok(true)
    }

    fn allocate(&mut self, gpu: &Gpu, width: u32, height: u32) -> Result<()> {
        let ((texture, view), error) = gpu.validated(|device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&self.label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.format,
                usage: texture_usages(gpu.format_usages(self.format)),
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });
        if let Some(e) = error {
            return Err(Error::wgpu(&self.label, e));
        }

        if self.sampler.is_none() {
            self.sampler = Some(self.params.create_sampler(gpu, &self.label));
        }

        log::debug!("texture `{}`: {}x{} {:?}", self.label, width, height, self.format);
        self.storage = Some(Allocated {
            texture,
            view,
            width,
            height,
        });
        Ok(())
    }

    /// Uploads the whole image (rows tightly packed).
    pub fn update(&self, gpu: &Gpu, data: &[u8]) -> Result<()> {
        let storage = self.storage()?;
        let texel = texel_size(self.format)?;
        let expected = u64::from(storage.width) * u64::from(storage.height) * u64::from(texel);
        if data.len() as u64 != expected {
            return Err(Error::SizeMismatch {
                what: "texture update",
                expected,
                actual: data.len() as u64,
            });
        }

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &storage.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(storage.width * texel),
                rows_per_image: Some(storage.height),
            },
            storage.texture.size(),
        );
        Ok(())
    }

    /// Typed variant of [`update`](Self::update) (e.g. `[f32; 4]` texels).
    pub fn update_texels<T: Pod>(&self, gpu: &Gpu, texels: &[T]) -> Result<()> {
        self.update(gpu, bytemuck::cast_slice(texels))
    }

    fn storage(&self) -> Result<&Allocated> {
        self.storage
            .as_ref()
            .ok_or_else(|| Error::NotAllocated(self.label.clone()))
    }

    /// Whether GPU storage exists.
    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    /// `(width, height)` once allocated.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.storage.as_ref().map(|s| (s.width, s.height))
    }

    /// Width in texels (0 before allocation).
    pub fn width(&self) -> u32 {
        self.size().map_or(0, |(w, _)| w)
    }

    /// Height in texels (0 before allocation).
    pub fn height(&self) -> u32 {
        self.size().map_or(0, |(_, h)| h)
    }

    /// Texel format, fixed at declaration.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn params(&self) -> TextureParams {
        self.params
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Underlying wgpu texture; [`Error::NotAllocated`] before allocation.
    pub fn texture(&self) -> Result<&wgpu::Texture> {
        Ok(&self.storage()?.texture)
    }

    /// Default view of the whole texture.
    pub fn view(&self) -> Result<&wgpu::TextureView> {
        Ok(&self.storage()?.view)
    }

    pub fn sampler(&self) -> Result<&wgpu::Sampler> {
        self.sampler
            .as_ref()
            .ok_or_else(|| Error::NotAllocated(self.label.clone()))
    }
}
