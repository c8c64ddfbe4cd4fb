use std::collections::HashSet;

use super::buffer::{vertex_format, Vbo};
use crate::error::{Error, Result};

/// One attribute binding: shader `@location`, source buffer and layout.
///
/// `stride` and `offset` are counted in floats; a stride of 0 means tightly
/// packed vectors. `divisor` 0 advances per vertex, 1 per instance.
#[derive(Clone, Copy)]
pub struct AttribSpec<'a> {
    pub location: u32,
    pub vbo: &'a Vbo,
    pub stride: u32,
    pub offset: u32,
    pub divisor: u32,
}

impl<'a> AttribSpec<'a> {
    /// Tightly packed, per-vertex attribute.
    pub fn new(location: u32, vbo: &'a Vbo) -> Self {
        Self {
            location,
            vbo,
            stride: 0,
            offset: 0,
            divisor: 0,
        }
    }

    /// Interleaved access: `stride` and `offset` in floats.
    pub fn interleaved(mut self, stride: u32, offset: u32) -> Self {
        self.stride = stride;
        self.offset = offset;
        self
    }

    /// Advances once per instance instead of once per vertex.
    pub fn per_instance(mut self) -> Self {
        self.divisor = 1;
        self
    }

    fn desc(&self) -> AttribDesc {
        AttribDesc {
            location: self.location,
            buffer_id: self.vbo.id(),
            components: self.vbo.components(),
            stride: self.stride,
            offset: self.offset,
            divisor: self.divisor,
        }
    }
}

/// Buffer-independent view of an [`AttribSpec`], used for layout planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribDesc {
    pub location: u32,
    pub buffer_id: u64,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
    pub divisor: u32,
}

/// One vertex-buffer slot of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlan {
    pub buffer_id: u64,
    pub array_stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Groups attributes into vertex-buffer slots.
///
/// Attributes reading the same buffer with the same stride and step mode share
/// a slot (interleaved data). Slots keep first-seen order.
pub fn plan_layout(descs: &[AttribDesc]) -> Result<Vec<SlotPlan>> {
    let mut locations = HashSet::new();
    let mut slots: Vec<SlotPlan> = Vec::new();

    for d in descs {
        let format = vertex_format(d.components)?;

        if !locations.insert(d.location) {
            return Err(Error::DuplicateLocation(d.location));
        }

        let step_mode = match d.divisor {
            0 => wgpu::VertexStepMode::Vertex,
            1 => wgpu::VertexStepMode::Instance,
            divisor => {
                return Err(Error::UnsupportedDivisor {
                    location: d.location,
                    divisor,
                });
            }
        };

        let stride_floats = if d.stride == 0 {
            d.components
        } else {
            d.stride
        };
        let end = d.offset.checked_add(d.components);
        if end.is_none_or(|end| end > stride_floats) {
            return Err(Error::AttributeOutOfStride {
                location: d.location,
                offset: d.offset,
                components: d.components,
                stride: stride_floats,
            });
        }

        let attribute = wgpu::VertexAttribute {
            format,
            offset: u64::from(d.offset) * 4,
            shader_location: d.location,
        };
        let array_stride = u64::from(stride_floats) * 4;

        match slots.iter_mut().find(|s| {
            s.buffer_id == d.buffer_id && s.array_stride == array_stride && s.step_mode == step_mode
        }) {
            Some(slot) => slot.attributes.push(attribute),
            None => slots.push(SlotPlan {
                buffer_id: d.buffer_id,
                array_stride,
                step_mode,
                attributes: vec![attribute],
            }),
        }
    }

    Ok(slots)
}

struct Slot {
    plan: SlotPlan,
    buffer: wgpu::Buffer,
    /// Elements reachable with `plan.array_stride` over the buffer's live bytes.
    count: u32,
}

/// Vertex input layout plus the buffers feeding it.
///
/// Holds its own handles to the GPU buffers: dropping the source [`Vbo`]s is
/// fine, but a `Vbo` that reallocates afterwards is not seen by this array.
pub struct VertexArray {
    slots: Vec<Slot>,
}

impl VertexArray {
    /// Plans the slots for `specs` and keeps a handle to each source buffer.
    pub fn new(specs: &[AttribSpec<'_>]) -> Result<Self> {
        let descs: Vec<AttribDesc> = specs.iter().map(AttribSpec::desc).collect();
        let plans = plan_layout(&descs)?;

        let mut slots = Vec::with_capacity(plans.len());
        for plan in plans {
            // plan_layout only emits ids taken from `specs`
            let Some(vbo) = specs.iter().map(|s| s.vbo).find(|v| v.id() == plan.buffer_id) else {
                continue;
            };
            let bytes = u64::from(vbo.length()) * vbo.vector_size();
            slots.push(Slot {
                count: (bytes / plan.array_stride) as u32,
                buffer: vbo.buffer().clone(),
                plan,
            });
        }

        Ok(Self { slots })
    }

    /// Array with no attributes (vertices generated from `vertex_index`).
    pub fn none() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of vertex-buffer slots.
    pub fn nb_slots(&self) -> usize {
        self.slots.len()
    }

    /// Layouts for `wgpu::VertexState::buffers`, in slot order.
    pub fn buffer_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.slots
            .iter()
            .map(|s| wgpu::VertexBufferLayout {
                array_stride: s.plan.array_stride,
                step_mode: s.plan.step_mode,
                attributes: &s.plan.attributes,
            })
            .collect()
    }

    /// Binds every slot's buffer at its slot index.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        for (i, s) in self.slots.iter().enumerate() {
            pass.set_vertex_buffer(i as u32, s.buffer.slice(..));
        }
    }

    /// Smallest per-vertex element count (0 when no per-vertex slot).
    pub fn vertex_count(&self) -> u32 {
        self.count_for(wgpu::VertexStepMode::Vertex).unwrap_or(0)
    }

    /// Smallest per-instance element count (1 when no per-instance slot).
    pub fn instance_count(&self) -> u32 {
        self.count_for(wgpu::VertexStepMode::Instance).unwrap_or(1)
    }

    fn count_for(&self, step: wgpu::VertexStepMode) -> Option<u32> {
        self.slots
            .iter()
            .filter(|s| s.plan.step_mode == step)
            .map(|s| s.count)
            .min()
    }
}
