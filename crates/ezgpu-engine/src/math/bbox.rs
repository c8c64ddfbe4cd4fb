use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
///
/// A box is empty while `min > max` on any axis; [`BoundingBox::empty`] starts
/// at `(+inf, -inf)` so the first added point defines both corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut bb = Self::empty();
        for p in points {
            bb.add_point(*p);
        }
        bb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn add_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grows `self` to enclose `other`. Merging an empty box is a no-op.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut bb = *self;
        bb.merge(other);
        bb
    }

    /// Returns `Vec3::ZERO` for an empty box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    /// Radius of the sphere centred on [`center`](Self::center) that encloses
    /// the box (half of the diagonal).
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// Closed containment: `[min, max]`.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        !self.is_empty() && p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Bounds of the eight transformed corners.
    #[must_use]
    pub fn transform(&self, m: &Mat4) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        let mut out = BoundingBox::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.add_point(m.transform_point3(corner));
        }
        out
    }
}
