//! Mesh drawing and compute dispatch on top of `resources`.

mod compute;
mod mesh_renderer;
mod primitive;

pub use compute::{dispatch, workgroups_for};
pub use mesh_renderer::{AttribLocations, MeshRenderer};
pub use primitive::Primitive;
