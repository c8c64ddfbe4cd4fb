use crate::device::Gpu;
use crate::error::{Error, Result};

use super::texture::{texel_size, texture_usages, TextureParams};

/// Cube face, in array-layer order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Array layer holding this face.
    #[inline]
    pub fn layer(self) -> u32 {
        self as u32
    }
}

/// Six square faces sampled as a cube (environment maps).
pub struct TextureCubeMap {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: u32,
    format: wgpu::TextureFormat,
}

impl TextureCubeMap {
    /// Allocates six `size x size` faces.
    ///
    /// Storage usage is never requested. A zero size is rejected with
    /// [`Error::ZeroSize`].
    pub fn alloc(
        gpu: &Gpu,
        label: &str,
        size: u32,
        format: wgpu::TextureFormat,
        params: TextureParams,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::ZeroSize("cube map alloc"));
        }

        let ((texture, view), error) = gpu.validated(|device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: texture_usages(gpu.format_usages(format))
                    - wgpu::TextureUsages::STORAGE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(label),
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            });
            (texture, view)
        });
        if let Some(e) = error {
            return Err(Error::wgpu(label, e));
        }

        Ok(Self {
            sampler: params.create_sampler(gpu, label),
            texture,
            view,
            size,
            format,
        })
    }

    /// Uploads one face (rows tightly packed).
    pub fn update_face(&self, gpu: &Gpu, face: CubeFace, data: &[u8]) -> Result<()> {
        let texel = texel_size(self.format)?;
        let expected = u64::from(self.size) * u64::from(self.size) * u64::from(texel);
        if data.len() as u64 != expected {
            return Err(Error::SizeMismatch {
                what: "cube map face update",
                expected,
                actual: data.len() as u64,
            });
        }

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: face.layer(),
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size * texel),
                rows_per_image: Some(self.size),
            },
            wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Face edge length in texels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Cube view (`texture_cube` in WGSL).
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_layers_are_distinct_and_ordered() {
        let layers: Vec<u32> = CubeFace::ALL.iter().map(|f| f.layer()).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    }
}
