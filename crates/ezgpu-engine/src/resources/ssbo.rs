use bytemuck::Pod;

use crate::device::Gpu;
use crate::error::{Error, Result};

/// Fixed-size shader storage block updated by byte ranges.
pub struct Ssbo {
    buffer: wgpu::Buffer,
    size: u64,
    binding: u32,
}

impl Ssbo {
    /// `size` is rounded up to a multiple of 4 bytes (and at least 4).
    pub fn new(gpu: &Gpu, size: u64, binding: u32, label: &str) -> Self {
        let size = size.max(4).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            size,
            binding,
        }
    }

    /// Writes `data` at byte `offset`.
    pub fn update<T: Pod>(&self, gpu: &Gpu, offset: u64, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        check_write(offset, bytes.len() as u64, self.size)?;
        if !bytes.is_empty() {
            gpu.queue().write_buffer(&self.buffer, offset, bytes);
        }
        Ok(())
    }

    /// Size in bytes after rounding.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// `@binding(n)` index inside the bind group.
    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Range and alignment rules of `Queue::write_buffer`.
fn check_write(offset: u64, len: u64, capacity: u64) -> Result<()> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    if offset % align != 0 || len % align != 0 {
        return Err(Error::Misaligned {
            what: "ssbo update",
            offset,
            size: len,
            align,
        });
    }
    let end = offset.saturating_add(len);
    if end > capacity {
        return Err(Error::OutOfRange {
            what: "ssbo update",
            start: offset,
            end,
            capacity,
        });
    }
    Ok(())
}
