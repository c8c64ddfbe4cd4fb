//! ezgpu engine crate.
//!
//! Thin typed wrappers over wgpu for off-screen rendering and compute:
//! buffers, vertex arrays, textures, framebuffers, WGSL programs, plus CPU
//! meshes and the math used to draw them.

pub mod device;
pub mod error;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod render;
pub mod resources;

pub use error::{Error, Result, Stage};
