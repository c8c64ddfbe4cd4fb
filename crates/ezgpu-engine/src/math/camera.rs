use glam::{Mat3, Mat4, Quat, Vec3};

use super::{BoundingBox, Transfo};

/// Orbit camera framing a scene sphere.
///
/// The camera looks at `center` from a distance derived from `radius` and the
/// vertical field of view, so the whole sphere fits the view. Orientation is a
/// rotation of the scene around its centre; `zoom` scales the distance.
#[derive(Debug, Clone)]
pub struct SceneCamera {
    center: Vec3,
    radius: f32,
    fov_y: f32,
    aspect: f32,
    orientation: Quat,
    zoom: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            orientation: Quat::IDENTITY,
            zoom: 1.0,
        }
    }
}

impl SceneCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames a bounding box (centre and radius). Empty boxes are ignored.
    pub fn frame(&mut self, bb: &BoundingBox) {
        if bb.is_empty() {
            return;
        }
        self.set_scene_center(bb.center());
        self.set_scene_radius(bb.radius());
    }

    pub fn set_scene_center(&mut self, center: Vec3) {
        self.center = center;
    }

    /// Radius is clamped to a small positive value so the depth range stays valid.
    pub fn set_scene_radius(&mut self, radius: f32) {
        self.radius = radius.max(1e-4);
    }

    /// Sets the aspect ratio from a framebuffer size (zero sizes are ignored).
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Vertical field of view in degrees, clamped to `[5, 150]`.
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov_y = degrees.clamp(5.0, 150.0).to_radians();
    }

    pub fn scene_center(&self) -> Vec3 {
        self.center
    }

    pub fn scene_radius(&self) -> f32 {
        self.radius
    }

    /// Rotates the scene around its centre.
    pub fn orbit(&mut self, axis: Vec3, degrees: f32) {
        if let Some(axis) = axis.try_normalize() {
            self.orientation =
                (Quat::from_axis_angle(axis, degrees.to_radians()) * self.orientation).normalize();
        }
    }

    /// Multiplies the viewing distance; `zoom` stays within `[0.05, 20]`.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(0.05, 20.0);
        }
    }

    /// Restores orientation and zoom.
    pub fn reset(&mut self) {
        self.orientation = Quat::IDENTITY;
        self.zoom = 1.0;
    }

    /// Eye-to-centre distance.
    pub fn distance(&self) -> f32 {
        let fit = self.radius / (self.fov_y * 0.5).sin();
        fit * self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance()))
            * Mat4::from_quat(self.orientation)
            * Mat4::from_translation(-self.center)
    }

    /// Right-handed perspective with a `[0, 1]` depth range.
    ///
    /// Near/far planes bracket the scene sphere so depth precision is spent on
    /// the scene only.
    pub fn projection_matrix(&self) -> Mat4 {
        let d = self.distance();
        let near = (d - self.radius * 1.1).max(self.radius * 0.01);
        let far = d + self.radius * 1.1;
        Mat4::perspective_rh(self.fov_y, self.aspect, near, far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn normal_matrix(&self) -> Mat3 {
        Transfo::inverse_transpose(&self.view_matrix())
    }
}
