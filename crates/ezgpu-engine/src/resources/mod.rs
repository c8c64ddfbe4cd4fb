//! GPU resource wrappers: buffers, vertex arrays, textures, framebuffers,
//! shader programs and bind groups.

mod bindings;
mod buffer;
mod cubemap;
mod fbo;
mod shader;
mod ssbo;
mod texture;
mod ubo;
mod vao;

pub use bindings::BindGroupBuilder;
pub use buffer::{Ebo, Vbo, VertexData};
pub use cubemap::{CubeFace, TextureCubeMap};
pub use fbo::{ClearOps, DEPTH_FORMAT, Fbo};
pub use shader::{
    RenderPipelineConfig, ShaderProgram, check_stages, shader_capabilities, validate_stage,
};
pub use ssbo::Ssbo;
pub use texture::{Texture2D, TextureParams};
pub use ubo::Ubo;
pub use vao::{AttribDesc, AttribSpec, SlotPlan, VertexArray, plan_layout};
