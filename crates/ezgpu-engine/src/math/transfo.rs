//! Affine transform shorthands (angles in degrees).

use glam::{Mat3, Mat4, Vec3};

/// Namespace for `Mat4`/`Mat3` constructors used by scene code.
pub struct Transfo;

impl Transfo {
    #[inline]
    pub fn translate(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    #[inline]
    pub fn scale(s: f32) -> Mat4 {
        Mat4::from_scale(Vec3::splat(s))
    }

    #[inline]
    pub fn scale_xyz(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4::from_scale(Vec3::new(sx, sy, sz))
    }

    #[inline]
    pub fn rotate_x(degrees: f32) -> Mat4 {
        Mat4::from_rotation_x(degrees.to_radians())
    }

    #[inline]
    pub fn rotate_y(degrees: f32) -> Mat4 {
        Mat4::from_rotation_y(degrees.to_radians())
    }

    #[inline]
    pub fn rotate_z(degrees: f32) -> Mat4 {
        Mat4::from_rotation_z(degrees.to_radians())
    }

    /// Rotation around an arbitrary axis. A zero axis yields the identity.
    pub fn rotate(axis: Vec3, degrees: f32) -> Mat4 {
        match axis.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, degrees.to_radians()),
            None => Mat4::IDENTITY,
        }
    }

    /// Upper-left 3x3 block.
    #[inline]
    pub fn sub(m: &Mat4) -> Mat3 {
        Mat3::from_mat4(*m)
    }

    /// Normal matrix: inverse transpose of the upper-left 3x3 block.
    ///
    /// Singular matrices fall back to the plain 3x3 block. Small but
    /// invertible scales are inverted normally.
    pub fn inverse_transpose(m: &Mat4) -> Mat3 {
        let m3 = Mat3::from_mat4(*m);
        if m3.determinant() != 0.0 {
            let it = m3.inverse().transpose();
            if it.is_finite() {
                return it;
            }
        }
        log::debug!("inverse_transpose: singular matrix, returning its 3x3 block");
        m3
    }

    /// Transforms a point, including the perspective divide.
    #[inline]
    pub fn apply(m: &Mat4, p: Vec3) -> Vec3 {
        m.project_point3(p)
    }
}
