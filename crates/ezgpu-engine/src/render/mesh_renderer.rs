use crate::device::Gpu;
use crate::error::Result;
use crate::mesh::{Material, Mesh, MeshDefect};
use crate::resources::{AttribSpec, Ebo, Vbo, VertexArray, VertexData};

use super::Primitive;

/// Shader `@location` for each mesh attribute; `None` leaves it unbound.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttribLocations {
    pub position: Option<u32>,
    pub normal: Option<u32>,
    pub tex_coord: Option<u32>,
    pub tangent: Option<u32>,
    pub color: Option<u32>,
}

impl Default for AttribLocations {
    /// Positions only, at location 1.
    fn default() -> Self {
        Self {
            position: Some(1),
            normal: None,
            tex_coord: None,
            tangent: None,
            color: None,
        }
    }
}

impl AttribLocations {
    /// Explicit locations, one per attribute.
    pub fn new(
        position: Option<u32>,
        normal: Option<u32>,
        tex_coord: Option<u32>,
        tangent: Option<u32>,
        color: Option<u32>,
    ) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent,
            color,
        }
    }

    /// Positions at 1, normals at 2, texture coordinates at 3.
    pub fn pos_normal_uv() -> Self {
        Self::new(Some(1), Some(2), Some(3), None, None)
    }
}

/// GPU copy of a [`Mesh`]: one vertex buffer per bound attribute, plus the
/// triangle and line index buffers.
pub struct MeshRenderer {
    vbos: Vec<Vbo>,
    vao: VertexArray,
    tri_ebo: Ebo,
    line_ebo: Ebo,
    material: Material,
    nb_vertices: u32,
}

impl MeshRenderer {
    /// Uploads `mesh`, binding each attribute at its location.
    ///
    /// A location requested for an attribute the mesh lacks is an
    /// [`MeshDefect::MissingAttribute`] error.
    pub fn new(gpu: &Gpu, mesh: &Mesh, locations: AttribLocations) -> Result<Self> {
        Self::instanced(gpu, mesh, locations, &[])
    }

    /// Like [`new`](Self::new), with extra attributes (usually per-instance)
    /// appended to the vertex array.
    pub fn instanced(
        gpu: &Gpu,
        mesh: &Mesh,
        locations: AttribLocations,
        extra: &[AttribSpec<'_>],
    ) -> Result<Self> {
        mesh.validate()?;
        check_locations(mesh, &locations)?;

        let mut vbos: Vec<(u32, Vbo)> = Vec::new();
        upload(gpu, &mut vbos, locations.position, &mesh.positions, "positions");
        upload(gpu, &mut vbos, locations.normal, &mesh.normals, "normals");
        upload(gpu, &mut vbos, locations.tex_coord, &mesh.tex_coords, "tex_coords");
        upload(gpu, &mut vbos, locations.tangent, &mesh.tangents, "tangents");
        upload(gpu, &mut vbos, locations.color, &mesh.colors, "colors");

        let mut specs: Vec<AttribSpec<'_>> = vbos
            .iter()
            .map(|(loc, vbo)| AttribSpec::new(*loc, vbo))
            .collect();
        specs.extend_from_slice(extra);
        let vao = VertexArray::new(&specs)?;

        Ok(Self {
            vao,
            vbos: vbos.into_iter().map(|(_, v)| v).collect(),
            tri_ebo: Ebo::from_indices(gpu, &mesh.tri_indices, "mesh triangles"),
            line_ebo: Ebo::from_indices(gpu, &mesh.line_indices, "mesh lines"),
            material: *mesh.material(),
            nb_vertices: mesh.nb_vertices() as u32,
        })
    }

    /// Draws the mesh with the pipeline and bind groups already set on `pass`.
    ///
    /// `Triangles` and `Lines` use the mesh index buffers; the other
    /// primitives draw the vertices in order.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, primitive: Primitive) {
        self.vao.bind(pass);
        let instances = 0..self.vao.instance_count();

        let ebo = match primitive {
            Primitive::Triangles => Some(&self.tri_ebo),
            Primitive::Lines => Some(&self.line_ebo),
            _ => None,
        };
        match ebo {
            Some(ebo) => {
                if let Some(slice) = ebo.slice() {
                    pass.set_index_buffer(slice, wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..ebo.len(), 0, instances);
                }
            }
            None => pass.draw(0..self.nb_vertices, instances),
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn nb_vertices(&self) -> u32 {
        self.nb_vertices
    }

    pub fn nb_triangles(&self) -> u32 {
        self.tri_ebo.len() / 3
    }

    pub fn nb_lines(&self) -> u32 {
        self.line_ebo.len() / 2
    }

    /// Vertex layout to build pipelines against.
    pub fn vertex_array(&self) -> &VertexArray {
        &self.vao
    }

    /// Attribute buffers, in binding order (positions first when bound).
    pub fn vbos(&self) -> &[Vbo] {
        &self.vbos
    }
}

/// Every requested location must have data behind it.
fn check_locations(
    mesh: &Mesh,
    locations: &AttribLocations,
) -> std::result::Result<(), MeshDefect> {
    let requested = [
        ("positions", locations.position, mesh.positions.len()),
        ("normals", locations.normal, mesh.normals.len()),
        ("tex_coords", locations.tex_coord, mesh.tex_coords.len()),
        ("tangents", locations.tangent, mesh.tangents.len()),
        ("colors", locations.color, mesh.colors.len()),
    ];
    for (attribute, location, len) in requested {
        match location {
            Some(location) if len == 0 => {
                return Err(MeshDefect::MissingAttribute {
                    attribute,
                    location,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn upload<T: VertexData>(
    gpu: &Gpu,
    vbos: &mut Vec<(u32, Vbo)>,
    location: Option<u32>,
    data: &[T],
    name: &str,
) {
    if let Some(loc) = location {
        vbos.push((loc, Vbo::from_data(gpu, data, &format!("mesh {name}"))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locations_bind_positions_only() {
        let l = AttribLocations::default();
        assert_eq!(l.position, Some(1));
        assert_eq!((l.normal, l.tex_coord, l.tangent, l.color), (None, None, None, None));
    }

    #[test]
    fn requested_attribute_must_exist() {
        let mesh = Mesh::cube_pos_only();
        assert_eq!(check_locations(&mesh, &AttribLocations::default()), Ok(()));
        assert_eq!(
            check_locations(&mesh, &AttribLocations::new(Some(1), Some(2), None, None, None)),
            Err(MeshDefect::MissingAttribute {
                attribute: "normals",
                location: 2
            })
        );
        assert!(check_locations(&Mesh::cube(), &AttribLocations::pos_normal_uv()).is_ok());
    }

    #[test]
    fn pos_normal_uv_locations() {
        let l = AttribLocations::pos_normal_uv();
        assert_eq!((l.position, l.normal, l.tex_coord), (Some(1), Some(2), Some(3)));
    }
}
