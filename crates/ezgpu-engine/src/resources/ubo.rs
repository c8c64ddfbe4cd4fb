use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::device::Gpu;

/// Typed uniform block.
///
/// `T` must follow the WGSL uniform layout rules (16-byte aligned `vec3`/`vec4`
/// members, explicit padding). `binding` is the `@binding(n)` index the block
/// is bound at inside its bind group.
pub struct Ubo<T: Pod> {
    buffer: wgpu::Buffer,
    binding: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> Ubo<T> {
    /// Creates the block initialised with `value`, bound at `binding`.
    pub fn new(gpu: &Gpu, value: &T, binding: u32, label: &str) -> Self {
        let buffer = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(value),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        Self {
            buffer,
            binding,
            _marker: PhantomData,
        }
    }

    /// Overwrites the whole block.
    pub fn update(&self, gpu: &Gpu, value: &T) {
        gpu.queue()
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Size of `T` in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        std::mem::size_of::<T>() as u64
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}
