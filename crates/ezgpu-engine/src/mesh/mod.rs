//! CPU-side meshes: vertex/index arrays, materials and procedural shapes.
//!
//! Meshes are plain data. Upload goes through `render::MeshRenderer`.

mod material;
#[allow(clippy::module_inception)]
mod mesh;
mod primitives;
pub mod topology;

pub use material::{Material, MaterialUniform};
pub use mesh::{Mesh, MeshDefect};
