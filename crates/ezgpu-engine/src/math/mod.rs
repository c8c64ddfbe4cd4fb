//! CPU-side math helpers built on `glam`.

mod bbox;
mod camera;
mod transfo;

pub use bbox::BoundingBox;
pub use camera::SceneCamera;
pub use transfo::Transfo;
