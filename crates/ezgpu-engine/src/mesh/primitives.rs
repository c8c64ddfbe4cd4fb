//! Procedural meshes.
//!
//! Parametric surfaces are sampled on a `(nu + 1) x (nv + 1)` vertex grid with
//! duplicated seams, so texture coordinates stay continuous. Their line
//! indices follow the parameter grid (no triangle diagonals).

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::Mesh;

impl Mesh {
    /// Flat `[-1, 1]^2` grid in the `z = 0` plane with `n x n` cells.
    pub fn grid(n: u32) -> Mesh {
        let n = n.max(1);
        parametric(n, n, |u, v| {
            (Vec3::new(2.0 * u - 1.0, 2.0 * v - 1.0, 0.0), Some(Vec3::Z))
        })
    }

    /// `[-1, 1]^2` grid displaced by a damped radial cosine wave.
    pub fn wave(n: u32) -> Mesh {
        let n = n.max(1);
        let mut mesh = parametric(n, n, |u, v| {
            let x = 2.0 * u - 1.0;
            let y = 2.0 * v - 1.0;
            (Vec3::new(x, y, wave_height(x, y)), None)
        });
        mesh.compute_normals();
        mesh.compute_tangents();
        mesh
    }

    /// Unit sphere with `n` meridian slices and `n / 2` parallels.
    pub fn sphere(n: u32) -> Mesh {
        let nu = n.max(3);
        let nv = (n / 2).max(2);
        parametric(nu, nv, |u, v| {
            let theta = u * TAU;
            let phi = v * PI - PI * 0.5;
            let p = Vec3::new(phi.cos() * theta.cos(), phi.cos() * theta.sin(), phi.sin());
            (p, Some(p))
        })
    }

    /// Torus of major radius 1 around `z` with tube radius `ratio`.
    ///
    /// `n_big` samples the main circle, `n_small` the tube.
    pub fn torus(n_big: u32, n_small: u32, ratio: f32) -> Mesh {
        let nu = n_big.max(3);
        let nv = n_small.max(3);
        let r = ratio.clamp(1e-3, 1.0);
        parametric(nu, nv, |u, v| {
            let a = u * TAU;
            let b = v * TAU;
            let ring = Vec3::new(a.cos(), a.sin(), 0.0);
            let normal = ring * b.cos() + Vec3::Z * b.sin();
            (ring + normal * r, Some(normal))
        })
    }

    /// `[-1, 1]^3` cube with per-face normals and texture coordinates.
    pub fn cube() -> Mesh {
        // (normal, u axis, v axis) for each face
        let faces = [
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
        ];
        let corners = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];

        let mut mesh = Mesh::default();
        for (f, (n, u, v)) in faces.into_iter().enumerate() {
            let base = (f * 4) as u32;
            for c in corners {
                let uv = c * 2.0 - Vec2::ONE;
                mesh.positions.push(n + u * uv.x + v * uv.y);
                mesh.normals.push(n);
                mesh.tangents.push(u);
                mesh.tex_coords.push(c);
            }
            mesh.tri_indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            mesh.line_indices.extend_from_slice(&[
                base,
                base + 1,
                base + 1,
                base + 2,
                base + 2,
                base + 3,
                base + 3,
                base,
            ]);
        }
        mesh
    }

    /// `[-1, 1]^3` cube with shared corners and positions only.
    pub fn cube_pos_only() -> Mesh {
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                )
            })
            .collect();
        #[rustfmt::skip]
        let tri_indices = vec![
            0, 2, 3, 0, 3, 1, // -z
            4, 5, 7, 4, 7, 6, // +z
            0, 1, 5, 0, 5, 4, // -y
            2, 6, 7, 2, 7, 3, // +y
            0, 4, 6, 0, 6, 2, // -x
            1, 3, 7, 1, 7, 5, // +x
        ];
        #[rustfmt::skip]
        let line_indices = vec![
            0, 1, 1, 3, 3, 2, 2, 0,
            4, 5, 5, 7, 7, 6, 6, 4,
            0, 4, 1, 5, 2, 6, 3, 7,
        ];
        let mut mesh = Mesh::new(positions, tri_indices);
        mesh.line_indices = line_indices;
        mesh
    }
}

fn wave_height(x: f32, y: f32) -> f32 {
    let r = (x * x + y * y).sqrt();
    (r * 4.0 * PI).cos() * 0.1 * (1.0 - r / std::f32::consts::SQRT_2)
}

/// Samples `f(u, v)` on `[0, 1]^2`. When `f` gives no normal, normals are left
/// for the caller to compute.
fn parametric<F>(nu: u32, nv: u32, f: F) -> Mesh
where
    F: Fn(f32, f32) -> (Vec3, Option<Vec3>),
{
    let row = nu + 1;
    let count = (row * (nv + 1)) as usize;

    let mut mesh = Mesh::default();
    mesh.positions.reserve(count);
    mesh.tex_coords.reserve(count);

    let mut analytic_normals = Vec::with_capacity(count);
    for j in 0..=nv {
        let v = j as f32 / nv as f32;
        for i in 0..=nu {
            let u = i as f32 / nu as f32;
            let (p, n) = f(u, v);
            mesh.positions.push(p);
            mesh.tex_coords.push(Vec2::new(u, v));
            analytic_normals.push(n);
        }
    }

    if analytic_normals.iter().all(Option::is_some) {
        mesh.normals = analytic_normals.into_iter().flatten().collect();
    }

    for j in 0..nv {
        for i in 0..nu {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row + 1;
            let d = a + row;
            mesh.tri_indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    // parameter-grid lines: along u on every row, along v on every column
    for j in 0..=nv {
        for i in 0..nu {
            let a = j * row + i;
            mesh.line_indices.extend_from_slice(&[a, a + 1]);
        }
    }
    for j in 0..nv {
        for i in 0..=nu {
            let a = j * row + i;
            mesh.line_indices.extend_from_slice(&[a, a + row]);
        }
    }

    if !mesh.normals.is_empty() {
        mesh.compute_tangents();
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(m: &Mesh) {
        assert_eq!(m.validate(), Ok(()));
        assert!(m.nb_triangles() > 0);
        assert!(m.nb_lines() > 0);
    }

    #[test]
    fn grid_counts() {
        let m = Mesh::grid(4);
        assert_well_formed(&m);
        assert_eq!(m.nb_vertices(), 25);
        assert_eq!(m.nb_triangles(), 32);
        // 5 rows x 4 segments + 4 x 5 columns
        assert_eq!(m.nb_lines(), 40);
        assert_eq!(m.normals.len(), 25);
        assert_eq!(m.tangents.len(), 25);
    }

    #[test]
    fn wave_stays_in_unit_square() {
        let m = Mesh::wave(60);
        assert_well_formed(&m);
        assert_eq!(m.nb_vertices(), 61 * 61);
        let bb = m.bb();
        assert!((bb.min.x + 1.0).abs() < 1e-6 && (bb.max.x - 1.0).abs() < 1e-6);
        assert!(bb.max.z <= 0.1 + 1e-6 && bb.min.z >= -0.1 - 1e-6);
        assert!(m.normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-4 && n.z > 0.0));
    }

    #[test]
    fn sphere_is_unit_and_normals_point_out() {
        let m = Mesh::sphere(16);
        assert_well_formed(&m);
        for (p, n) in m.positions.iter().zip(m.normals.iter()) {
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert!((*p - *n).length() < 1e-6);
        }
        let bb = m.bb();
        assert!((bb.radius() - 3f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn torus_radius() {
        let m = Mesh::torus(40, 12, 0.25);
        assert_well_formed(&m);
        for p in &m.positions {
            let ring = Vec3::new(p.x, p.y, 0.0).normalize();
            assert!(((*p - ring).length() - 0.25).abs() < 1e-4);
        }
    }

    #[test]
    fn cube_faces() {
        let m = Mesh::cube();
        assert_well_formed(&m);
        assert_eq!(m.nb_vertices(), 24);
        assert_eq!(m.nb_triangles(), 12);
        // every face triangle winds counter-clockwise around its normal
        for tri in m.tri_indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let n = (m.positions[b] - m.positions[a]).cross(m.positions[c] - m.positions[a]);
            assert!(n.dot(m.normals[a]) > 0.0);
        }
    }

    #[test]
    fn cube_pos_only_winds_outward() {
        let m = Mesh::cube_pos_only();
        assert_well_formed(&m);
        assert_eq!(m.nb_lines(), 12);
        for tri in m.tri_indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let n = (m.positions[b] - m.positions[a]).cross(m.positions[c] - m.positions[a]);
            let centroid = (m.positions[a] + m.positions[b] + m.positions[c]) / 3.0;
            assert!(n.dot(centroid) > 0.0);
        }
    }
}
