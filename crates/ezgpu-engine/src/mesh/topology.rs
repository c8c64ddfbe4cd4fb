//! Derived per-vertex data computed from triangle lists.

use std::collections::HashSet;

use glam::{Vec2, Vec3};

/// Area-weighted vertex normals.
///
/// Each face contributes its unnormalized cross product (twice its area) to
/// its three vertices. Vertices without a non-degenerate face get `Vec3::Z`.
pub fn vertex_normals(positions: &[Vec3], tri_indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in tri_indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
        .collect()
}

/// Per-vertex tangents aligned with the `u` texture direction and
/// orthogonalized against the normals (Gram-Schmidt).
pub fn vertex_tangents(
    positions: &[Vec3],
    normals: &[Vec3],
    tex_coords: &[Vec2],
    tri_indices: &[u32],
) -> Vec<Vec3> {
    let n = positions.len();
    let mut acc = vec![Vec3::ZERO; n];

    for tri in tri_indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= n || b >= n || c >= n {
            continue;
        }
        let e1 = positions[b] - positions[a];
        let e2 = positions[c] - positions[a];
        let d1 = tex_coords[b] - tex_coords[a];
        let d2 = tex_coords[c] - tex_coords[a];

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let t = (e1 * d2.y - e2 * d1.y) / det;
        acc[a] += t;
        acc[b] += t;
        acc[c] += t;
    }

    acc.into_iter()
        .zip(normals.iter())
        .map(|(t, &nrm)| {
            let ortho = t - nrm * nrm.dot(t);
            ortho
                .try_normalize()
                .unwrap_or_else(|| nrm.any_orthonormal_vector())
        })
        .collect()
}

/// Unique undirected edges of a triangle list, in first-seen order.
pub fn unique_edges(tri_indices: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::with_capacity(tri_indices.len());
    let mut lines = Vec::with_capacity(tri_indices.len());
    for tri in tri_indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if a == b {
                continue;
            }
            if seen.insert((a.min(b), a.max(b))) {
                lines.push(a);
                lines.push(b);
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edges_are_emitted_once() {
        let edges = unique_edges(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(edges, vec![0, 1, 1, 2, 2, 0, 1, 3, 3, 2]);
    }

    #[test]
    fn degenerate_edges_are_skipped() {
        assert_eq!(unique_edges(&[0, 0, 1]), vec![0, 1]);
    }

    #[test]
    fn normals_weight_by_area() {
        // Two faces sharing vertex 0: a large one facing +Z and a small one facing +X.
        let p = [
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let n = vertex_normals(&p, &[0, 1, 2, 0, 3, 4]);
        assert!(n[0].z > 0.99);
        assert!((n[3] - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn isolated_vertex_gets_default_normal() {
        let n = vertex_normals(&[Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE], &[0, 1, 2]);
        assert_eq!(n[3], Vec3::Z);
    }

    #[test]
    fn tangents_are_orthogonal_to_normals() {
        let p = [Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.0, 0.5)];
        let n = vertex_normals(&p, &[0, 1, 2]);
        let tc = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let t = vertex_tangents(&p, &n, &tc, &[0, 1, 2]);
        for (t, n) in t.iter().zip(n.iter()) {
            assert!(t.dot(*n).abs() < 1e-5);
            assert!((t.length() - 1.0).abs() < 1e-5);
        }
    }
}
