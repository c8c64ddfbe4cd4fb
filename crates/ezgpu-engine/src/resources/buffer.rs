use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::device::Gpu;
use crate::error::{Error, Result};

/// Element type storable in a [`Vbo`]: `N` packed `f32` components.
pub trait VertexData: Pod {
    const COMPONENTS: u32;
}

impl VertexData for f32 {
    const COMPONENTS: u32 = 1;
}
impl VertexData for [f32; 2] {
    const COMPONENTS: u32 = 2;
}
impl VertexData for [f32; 3] {
    const COMPONENTS: u32 = 3;
}
impl VertexData for [f32; 4] {
    const COMPONENTS: u32 = 4;
}
impl VertexData for Vec2 {
    const COMPONENTS: u32 = 2;
}
impl VertexData for Vec3 {
    const COMPONENTS: u32 = 3;
}
impl VertexData for Vec4 {
    const COMPONENTS: u32 = 4;
}

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Float vertex format for a component count.
pub(crate) fn vertex_format(components: u32) -> Result<wgpu::VertexFormat> {
    match components {
        1 => Ok(wgpu::VertexFormat::Float32),
        2 => Ok(wgpu::VertexFormat::Float32x2),
        3 => Ok(wgpu::VertexFormat::Float32x3),
        4 => Ok(wgpu::VertexFormat::Float32x4),
        n => Err(Error::InvalidComponents(n)),
    }
}

const VBO_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX
    .union(wgpu::BufferUsages::STORAGE)
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

/// Vertex buffer of `f32` vectors with 1..=4 components.
///
/// The buffer is also usable as a compute storage buffer, so a compute pass
/// can generate vertices in place. Growing the buffer replaces the GPU
/// allocation and its id; vertex arrays built before must be rebuilt.
pub struct Vbo {
    id: u64,
    label: String,
    buffer: wgpu::Buffer,
    components: u32,
    length: u32,
    capacity: u32,
}

impl Vbo {
    /// Creates an empty buffer for vectors of `components` floats.
    pub fn new(gpu: &Gpu, components: u32, label: &str) -> Result<Self> {
        vertex_format(components)?;
        let buffer = create_vbo(gpu, label, components, 1);
        Ok(Self {
            id: next_id(),
            label: label.to_string(),
            buffer,
            components,
            length: 0,
            capacity: 1,
        })
    }

    /// Creates a buffer holding `data`; the component count comes from `T`.
    pub fn from_data<T: VertexData>(gpu: &Gpu, data: &[T], label: &str) -> Self {
        if data.is_empty() {
            let buffer = create_vbo(gpu, label, T::COMPONENTS, 1);
            return Self {
                id: next_id(),
                label: label.to_string(),
                buffer,
                components: T::COMPONENTS,
                length: 0,
                capacity: 1,
            };
        }

        let buffer = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: VBO_USAGE,
            });

        Self {
            id: next_id(),
            label: label.to_string(),
            buffer,
            components: T::COMPONENTS,
            length: data.len() as u32,
            capacity: data.len() as u32,
        }
    }

    /// Reallocates room for `nb_vectors` vectors (zero-initialised).
    pub fn allocate(&mut self, gpu: &Gpu, nb_vectors: u32) {
        let capacity = nb_vectors.max(1);
        self.buffer = create_vbo(gpu, &self.label, self.components, capacity);
        self.id = next_id();
        self.capacity = capacity;
        self.length = nb_vectors;
    }

    /// Replaces the content; grows the allocation when `data` does not fit.
    pub fn update<T: VertexData>(&mut self, gpu: &Gpu, data: &[T]) -> Result<()> {
        self.check_components::<T>()?;
        let n = data.len() as u32;
        if n > self.capacity {
            log::debug!("vbo `{}`: growing {} -> {} vectors", self.label, self.capacity, n);
            self.allocate(gpu, n);
        }
        if !data.is_empty() {
            gpu.queue()
                .write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.length = n;
        Ok(())
    }

    /// Overwrites vectors `first..first + data.len()` of the current content.
    pub fn update_region<T: VertexData>(&self, gpu: &Gpu, first: u32, data: &[T]) -> Result<()> {
        self.check_components::<T>()?;
        let end = u64::from(first) + data.len() as u64;
        if end > u64::from(self.length) {
            return Err(Error::OutOfRange {
                what: "vbo update_region",
                start: u64::from(first),
                end,
                capacity: u64::from(self.length),
            });
        }
        if !data.is_empty() {
            let offset = u64::from(first) * self.vector_size();
            gpu.queue()
                .write_buffer(&self.buffer, offset, bytemuck::cast_slice(data));
        }
        Ok(())
    }

    fn check_components<T: VertexData>(&self) -> Result<()> {
        if T::COMPONENTS != self.components {
            return Err(Error::InvalidComponents(T::COMPONENTS));
        }
        Ok(())
    }

    /// Process-unique id of the current GPU allocation.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of vectors stored.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Number of vectors the allocation can hold.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Floats per vector (1 to 4).
    #[inline]
    pub fn components(&self) -> u32 {
        self.components
    }

    /// Size in bytes of one vector.
    #[inline]
    pub fn vector_size(&self) -> u64 {
        u64::from(self.components) * 4
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Whole buffer as a storage binding (compute read/write).
    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

fn create_vbo(gpu: &Gpu, label: &str, components: u32, capacity: u32) -> wgpu::Buffer {
    gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: u64::from(components) * 4 * u64::from(capacity),
        usage: VBO_USAGE,
        mapped_at_creation: false,
    })
}

const EBO_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::INDEX
    .union(wgpu::BufferUsages::STORAGE)
    .union(wgpu::BufferUsages::COPY_DST);

/// Index buffer of `u32` indices.
pub struct Ebo {
    label: String,
    buffer: wgpu::Buffer,
    len: u32,
    capacity: u32,
}

impl Ebo {
    /// Creates a buffer holding `indices` (possibly none).
    pub fn from_indices(gpu: &Gpu, indices: &[u32], label: &str) -> Self {
        if indices.is_empty() {
            return Self {
                label: label.to_string(),
                buffer: create_ebo(gpu, label, 1),
                len: 0,
                capacity: 1,
            };
        }
        let buffer = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: EBO_USAGE,
            });
        Self {
            label: label.to_string(),
            buffer,
            len: indices.len() as u32,
            capacity: indices.len() as u32,
        }
    }

    /// Replaces the content; grows the allocation when needed.
    pub fn update(&mut self, gpu: &Gpu, indices: &[u32]) {
        let n = indices.len() as u32;
        if n > self.capacity {
            self.buffer = create_ebo(gpu, &self.label, n);
            self.capacity = n;
        }
        if !indices.is_empty() {
            gpu.queue()
                .write_buffer(&self.buffer, 0, bytemuck::cast_slice(indices));
        }
        self.len = n;
    }

    /// Number of live indices.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Slice covering the live indices (`None` when empty).
    pub fn slice(&self) -> Option<wgpu::BufferSlice<'_>> {
        if self.len == 0 {
            return None;
        }
        Some(self.buffer.slice(..u64::from(self.len) * 4))
    }

    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

fn create_ebo(gpu: &Gpu, label: &str, capacity: u32) -> wgpu::Buffer {
    gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: u64::from(capacity.max(1)) * 4,
        usage: EBO_USAGE,
        mapped_at_creation: false,
    })
}
