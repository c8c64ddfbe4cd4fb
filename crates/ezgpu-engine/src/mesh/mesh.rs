use glam::{Vec2, Vec3};

use crate::math::BoundingBox;

use super::topology;
use super::Material;

/// Indexed triangle mesh held in CPU memory.
///
/// Optional attributes are empty vectors when absent; when present they have
/// one entry per position. `tri_indices` holds triangles (3 per face),
/// `line_indices` holds edges (2 per segment).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub tangents: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub tri_indices: Vec<u32>,
    pub line_indices: Vec<u32>,
    material: Material,
}

/// Problem found by [`Mesh::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshDefect {
    #[error("{attribute} has {len} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("triangle index count {0} is not a multiple of 3")]
    TriangleIndexCount(usize),
    #[error("line index count {0} is not a multiple of 2")]
    LineIndexCount(usize),
    #[error("index {index} out of bounds ({nb_vertices} vertices)")]
    IndexOutOfBounds {
        index: u32,
        nb_vertices: usize,
    },
    #[error("{attribute} requested at location {location} but the mesh has none")]
    MissingAttribute {
        attribute: &'static str,
        location: u32,
    },
}

impl Mesh {
    /// Mesh with positions and triangles only; other attributes empty.
    pub fn new(positions: Vec<Vec3>, tri_indices: Vec<u32>) -> Self {
        Self {
            positions,
            tri_indices,
            ..Self::default()
        }
    }

    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn nb_triangles(&self) -> usize {
        self.tri_indices.len() / 3
    }

    #[inline]
    pub fn nb_lines(&self) -> usize {
        self.line_indices.len() / 2
    }

    pub fn bb(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Recomputes per-vertex normals from the triangles (area weighted).
    pub fn compute_normals(&mut self) {
        self.normals = topology::vertex_normals(&self.positions, &self.tri_indices);
    }

    /// Recomputes per-vertex tangents; no-op without texture coordinates.
    pub fn compute_tangents(&mut self) {
        if self.tex_coords.len() != self.positions.len() {
            log::debug!("compute_tangents: mesh has no texture coordinates");
            return;
        }
        if self.normals.len() != self.positions.len() {
            self.compute_normals();
        }
        self.tangents = topology::vertex_tangents(
            &self.positions,
            &self.normals,
            &self.tex_coords,
            &self.tri_indices,
        );
    }

    /// Rebuilds `line_indices` from the unique edges of the triangles.
    pub fn compute_line_indices(&mut self) {
        self.line_indices = topology::unique_edges(&self.tri_indices);
    }

    /// Checks attribute lengths and index bounds.
    pub fn validate(&self) -> Result<(), MeshDefect> {
        let n = self.positions.len();
        let optional = [
            ("normals", self.normals.len()),
            ("tex_coords", self.tex_coords.len()),
            ("tangents", self.tangents.len()),
            ("colors", self.colors.len()),
        ];
        for (attribute, len) in optional {
            if len != 0 && len != n {
                return Err(MeshDefect::AttributeLength {
                    attribute,
                    len,
                    expected: n,
                });
            }
        }

        if self.tri_indices.len() % 3 != 0 {
            return Err(MeshDefect::TriangleIndexCount(self.tri_indices.len()));
        }
        if self.line_indices.len() % 2 != 0 {
            return Err(MeshDefect::LineIndexCount(self.line_indices.len()));
        }

        let out_of_bounds = self
            .tri_indices
            .iter()
            .chain(self.line_indices.iter())
            .find(|&&i| i as usize >= n);
        if let Some(&index) = out_of_bounds {
            return Err(MeshDefect::IndexOutOfBounds {
                index,
                nb_vertices: n,
            });
        }

        Ok(())
    }
}
