use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Phong material (ambient, diffuse, specular colours and shininess).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub ka: Vec3,
    pub kd: Vec3,
    pub ks: Vec3,
    /// Specular exponent; `0` disables the specular term.
    pub ns: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ka: Vec3::splat(0.1),
            kd: Vec3::new(0.8, 0.8, 0.8),
            ks: Vec3::ONE,
            ns: 100.0,
        }
    }
}

impl Material {
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            ka: self.ka.to_array(),
            _pad0: 0.0,
            kd: self.kd.to_array(),
            _pad1: 0.0,
            ks: self.ks.to_array(),
            ns: self.ns,
        }
    }
}

/// std140 layout of [`Material`]: each `vec3` is padded to 16 bytes, `ns`
/// fills the last slot.
///
/// ```wgsl
/// struct Material { ka: vec3<f32>, kd: vec3<f32>, ks: vec3<f32>, ns: f32 }
/// ```
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub ka: [f32; 3],
    pub _pad0: f32,
    pub kd: [f32; 3],
    pub _pad1: f32,
    pub ks: [f32; 3],
    pub ns: f32,
}
