use bytemuck::Pod;

use crate::device::Gpu;
use crate::error::{Error, Result};

use super::buffer::{Ebo, Vbo};
use super::ssbo::Ssbo;
use super::texture::Texture2D;
use super::ubo::Ubo;

/// Collects the resources of one bind group.
///
/// Uniform and storage blocks bring their own binding index; raw buffers,
/// views and samplers take it explicitly.
#[derive(Default)]
pub struct BindGroupBuilder<'a> {
    entries: Vec<wgpu::BindGroupEntry<'a>>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform<T: Pod>(self, ubo: &'a Ubo<T>) -> Self {
        self.entry(ubo.binding(), ubo.as_binding())
    }

    pub fn storage(self, ssbo: &'a Ssbo) -> Self {
        self.entry(ssbo.binding(), ssbo.as_binding())
    }

    /// Vertex buffer as a storage binding (compute-generated vertices).
    pub fn vertex_storage(self, binding: u32, vbo: &'a Vbo) -> Self {
        self.entry(binding, vbo.as_binding())
    }

    pub fn index_storage(self, binding: u32, ebo: &'a Ebo) -> Self {
        self.entry(binding, ebo.as_binding())
    }

    pub fn buffer(self, binding: u32, buffer: &'a wgpu::Buffer) -> Self {
        self.entry(binding, buffer.as_entire_binding())
    }

    pub fn texture(self, binding: u32, view: &'a wgpu::TextureView) -> Self {
        self.entry(binding, wgpu::BindingResource::TextureView(view))
    }

    pub fn sampler(self, binding: u32, sampler: &'a wgpu::Sampler) -> Self {
        self.entry(binding, wgpu::BindingResource::Sampler(sampler))
    }

    /// Texture view at `binding` and its sampler at `sampler_binding`.
    pub fn sampled(self, binding: u32, sampler_binding: u32, tex: &'a Texture2D) -> Result<Self> {
        Ok(self
            .texture(binding, tex.view()?)
            .sampler(sampler_binding, tex.sampler()?))
    }

    fn entry(mut self, binding: u32, resource: wgpu::BindingResource<'a>) -> Self {
        self.entries.push(wgpu::BindGroupEntry { binding, resource });
        self
    }

    pub fn bindings(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.binding).collect()
    }

    pub fn build(
        self,
        gpu: &Gpu,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> Result<wgpu::BindGroup> {
        check_unique(&self.bindings())?;
        Ok(gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &self.entries,
        }))
    }
}

fn check_unique(bindings: &[u32]) -> Result<()> {
    for (i, b) in bindings.iter().enumerate() {
        if bindings[..i].contains(b) {
            return Err(Error::DuplicateBinding(*b));
        }
    }
    Ok(())
}
