//! Headless GPU Tests
//!
//! Tests for:
//! - Vertex/index/storage buffer allocation and updates
//! - Texture and cube map sizing and uploads
//! - Framebuffer resize
//! - Mesh drawing into a framebuffer (plain and instanced)
//! - Compute dispatch over a vertex buffer
//! - wgpu validation errors surfacing as `Error::Wgpu`
//!
//! Results are read back from the GPU through a mappable staging buffer.
//! Every test returns early when no adapter is available.

use glam::{Mat4, Vec3};

use ezgpu_engine::device::{Gpu, GpuInit};
use ezgpu_engine::logging::{LoggingConfig, init_logging};
use ezgpu_engine::math::SceneCamera;
use ezgpu_engine::mesh::{MaterialUniform, Mesh, MeshDefect};
use ezgpu_engine::render::{AttribLocations, MeshRenderer, Primitive, dispatch, workgroups_for};
use ezgpu_engine::resources::{
    AttribSpec, BindGroupBuilder, ClearOps, CubeFace, Ebo, Fbo, RenderPipelineConfig,
    ShaderProgram, Ssbo, Texture2D, TextureCubeMap, TextureParams, Ubo, Vbo, VertexArray,
};
use ezgpu_engine::{Error, Stage};

fn gpu() -> Option<Gpu> {
    init_logging(LoggingConfig {
        env_filter: Some("ezgpu_engine=debug,wgpu_core=warn".to_string()),
        ..Default::default()
    });
    match Gpu::new_blocking(GpuInit::downlevel()) {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("no GPU adapter, skipping: {e:#}");
            None
        }
    }
}

// ============================================================================
// Readback
// ============================================================================

/// Maps `staging` after the queue drains and copies its content out.
fn map_read(gpu: &Gpu, staging: &wgpu::Buffer) -> Vec<u8> {
    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    gpu.wait_idle().unwrap();
    rx.recv().unwrap().unwrap();
    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    bytes
}

fn staging_buffer(gpu: &Gpu, size: u64) -> wgpu::Buffer {
    gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// First `size` bytes of `src` (which needs `COPY_SRC`).
fn read_buffer(gpu: &Gpu, src: &wgpu::Buffer, size: u64) -> Vec<u8> {
    let staging = staging_buffer(gpu, size);
    let mut encoder = gpu.create_encoder("readback");
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size);
    gpu.submit(encoder);
    map_read(gpu, &staging)
}

fn read_floats(gpu: &Gpu, src: &wgpu::Buffer, count: usize) -> Vec<f32> {
    read_buffer(gpu, src, count as u64 * 4)
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// One texel of an RGBA8 texture.
fn read_pixel(gpu: &Gpu, tex: &Texture2D, x: u32, y: u32) -> [u8; 4] {
    let row = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let staging = staging_buffer(gpu, u64::from(row));
    let mut encoder = gpu.create_encoder("pixel readback");
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: tex.texture().unwrap(),
            mip_level: 0,
            origin: wgpu::Origin3d { x, y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row),
                rows_per_image: Some(1),
            },
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    gpu.submit(encoder);
    let bytes = map_read(gpu, &staging);
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

const MESH_SHADER: &str = r#"
struct Camera {
    mvp: mat4x4<f32>,
};

struct Material {
    ka: vec3<f32>,
    kd: vec3<f32>,
    ks: vec3<f32>,
    ns: f32,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> material: Material;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(1) pos: vec3<f32>, @location(2) normal: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.position = camera.mvp * vec4<f32>(pos, 1.0);
    out.normal = normal;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let l = max(dot(normalize(in.normal), vec3<f32>(0.0, 0.0, 1.0)), 0.0);
    return vec4<f32>(material.ka + material.kd * l, 1.0);
}
"#;

const INSTANCED_SHADER: &str = r#"
@vertex
fn vs_main(@location(1) pos: vec3<f32>, @location(5) offset: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos * 0.1 + offset, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

const DOUBLE_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read_write> values: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x < arrayLength(&values)) {
        values[id.x] = values[id.x] * 2.0;
    }
}
"#;

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn vbo_grows_and_changes_id() {
    let Some(gpu) = gpu() else { return };

    let mut vbo = Vbo::from_data(&gpu, &[Vec3::ZERO, Vec3::X], "positions");
    assert_eq!(vbo.length(), 2);
    assert_eq!(vbo.components(), 3);
    let first_id = vbo.id();

    vbo.update(&gpu, &[Vec3::Y]).unwrap();
    assert_eq!(vbo.length(), 1);
    assert_eq!(vbo.id(), first_id, "shrinking keeps the allocation");

    vbo.update(&gpu, &[Vec3::ONE; 8]).unwrap();
    assert_eq!(vbo.length(), 8);
    assert!(vbo.capacity() >= 8);
    assert_ne!(vbo.id(), first_id);
}

#[test]
fn vbo_rejects_mismatched_components_and_ranges() {
    let Some(gpu) = gpu() else { return };

    let mut vbo = Vbo::new(&gpu, 2, "uv").unwrap();
    assert!(matches!(vbo.update(&gpu, &[1.0f32]), Err(Error::InvalidComponents(1))));

    vbo.allocate(&gpu, 4);
    vbo.update_region(&gpu, 2, &[[1.0f32, 2.0], [3.0, 4.0]]).unwrap();
    assert!(matches!(
        vbo.update_region(&gpu, 3, &[[0.0f32; 2]; 2]),
        Err(Error::OutOfRange { .. })
    ));
    assert_eq!(
        read_floats(&gpu, vbo.buffer(), 8),
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]
    );

    assert!(matches!(Vbo::new(&gpu, 5, "bad"), Err(Error::InvalidComponents(5))));
}

#[test]
fn ebo_and_ssbo_updates() {
    let Some(gpu) = gpu() else { return };

    let mut ebo = Ebo::from_indices(&gpu, &[], "empty");
    assert!(ebo.is_empty());
    assert!(ebo.slice().is_none());
    ebo.update(&gpu, &[0, 1, 2, 2, 1, 3]);
    assert_eq!(ebo.len(), 6);
    assert!(ebo.slice().is_some());

    let ssbo = Ssbo::new(&gpu, 30, 2, "particles");
    assert_eq!(ssbo.size(), 32);
    assert_eq!(ssbo.binding(), 2);
    assert!(ssbo.update(&gpu, 16, &[1.0f32, 2.0, 3.0, 4.0]).is_ok());
    assert!(matches!(
        ssbo.update(&gpu, 20, &[0.0f32; 4]),
        Err(Error::OutOfRange { .. })
    ));
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn texture_alloc_resize_update() {
    let Some(gpu) = gpu() else { return };

    let mut tex = Texture2D::new(
        "albedo",
        wgpu::TextureFormat::Rgba8Unorm,
        TextureParams::nearest_clamp(),
    );
    assert!(matches!(tex.update(&gpu, &[]), Err(Error::NotAllocated(_))));
    assert!(matches!(tex.alloc(&gpu, 0, 2), Err(Error::ZeroSize(_))));

    tex.alloc(&gpu, 4, 2).unwrap();
    assert_eq!(tex.size(), Some((4, 2)));
    tex.update(&gpu, &[255u8; 4 * 2 * 4]).unwrap();
    assert!(matches!(
        tex.update(&gpu, &[0u8; 3]),
        Err(Error::SizeMismatch { expected: 32, actual: 3, .. })
    ));

    assert!(!tex.resize(&gpu, 4, 2).unwrap());
    assert!(!tex.resize(&gpu, 0, 16).unwrap());
    assert!(tex.resize(&gpu, 8, 8).unwrap());
    assert_eq!((tex.width(), tex.height()), (8, 8));
    assert!(tex.sampler().is_ok());
}

#[test]
fn oversized_texture_is_an_error() {
    let Some(gpu) = gpu() else { return };

    let too_big = gpu.limits().max_texture_dimension_2d + 1;
    let mut tex = Texture2D::new("huge", wgpu::TextureFormat::Rgba8Unorm, TextureParams::default());
    assert!(matches!(tex.alloc(&gpu, too_big, 1), Err(Error::Wgpu { .. })));
    assert!(!tex.is_allocated());

    tex.alloc(&gpu, 2, 2).unwrap();
    assert!(tex.resize(&gpu, too_big, 1).is_err());
    assert_eq!(tex.size(), Some((2, 2)));
}

#[test]
fn cube_map_faces() {
    let Some(gpu) = gpu() else { return };

    let cube = TextureCubeMap::alloc(
        &gpu,
        "sky",
        4,
        wgpu::TextureFormat::Rgba8Unorm,
        TextureParams::default(),
    )
    .unwrap();
    for face in CubeFace::ALL {
        cube.update_face(&gpu, face, &[128u8; 4 * 4 * 4]).unwrap();
    }
    assert!(matches!(
        cube.update_face(&gpu, CubeFace::PosX, &[0u8; 4]),
        Err(Error::SizeMismatch { .. })
    ));
    assert_eq!(cube.texture().size().depth_or_array_layers, 6);

    let empty = TextureCubeMap::alloc(
        &gpu,
        "empty",
        0,
        wgpu::TextureFormat::Rgba8Unorm,
        TextureParams::default(),
    );
    assert!(matches!(empty, Err(Error::ZeroSize(_))));
}

// ============================================================================
// Framebuffers and drawing
// ============================================================================

fn color_target(label: &str) -> Texture2D {
    Texture2D::new(label, wgpu::TextureFormat::Rgba8Unorm, TextureParams::nearest_clamp())
}

#[test]
fn fbo_resize_keeps_attachments_in_sync() {
    let Some(gpu) = gpu() else { return };

    let mut fbo = Fbo::new(vec![color_target("color"), color_target("ids")], true).unwrap();
    assert!(fbo.resize(&gpu, 64, 32).unwrap());
    assert!(!fbo.resize(&gpu, 64, 32).unwrap());
    assert!(fbo.resize(&gpu, 128, 128).unwrap());

    assert_eq!(fbo.size(), Some((128, 128)));
    assert_eq!(fbo.texture(1).and_then(Texture2D::size), Some((128, 128)));
    assert_eq!(fbo.depth().and_then(Texture2D::size), Some((128, 128)));
}

#[test]
fn fbo_rejects_attachments_of_different_sizes() {
    let Some(gpu) = gpu() else { return };

    let sized = |label: &str, w: u32, h: u32| {
        let mut tex = color_target(label);
        tex.alloc(&gpu, w, h).unwrap();
        tex
    };

    let err = Fbo::new(vec![sized("a", 4, 4), sized("b", 8, 8)], false)
        .err()
        .unwrap();
    match err {
        Error::AttachmentSize { label, expected, actual } => {
            assert_eq!(label, "b");
            assert_eq!((expected, actual), ((4, 4), (8, 8)));
        }
        other => panic!("unexpected {other:?}"),
    }

    let fbo = Fbo::new(vec![sized("a", 4, 4), color_target("c"), sized("b", 4, 4)], false).unwrap();
    assert_eq!(fbo.size(), Some((4, 4)));
}

#[test]
fn unsized_fbo_cannot_begin_pass() {
    let Some(gpu) = gpu() else { return };

    let fbo = Fbo::new(vec![color_target("color")], false).unwrap();
    let mut encoder = gpu.create_encoder("unsized");
    assert!(matches!(
        fbo.begin_pass(&mut encoder, ClearOps::default()),
        Err(Error::NotAllocated(_))
    ));
}

#[test]
fn draw_mesh_into_fbo() {
    let Some(gpu) = gpu() else { return };

    let mut fbo = Fbo::new(vec![color_target("color")], true).unwrap();
    fbo.resize(&gpu, 64, 64).unwrap();

    let mesh = Mesh::sphere(16);
    let renderer = MeshRenderer::new(
        &gpu,
        &mesh,
        AttribLocations::new(Some(1), Some(2), None, None, None),
    )
    .unwrap();
    assert_eq!(renderer.nb_vertices() as usize, mesh.nb_vertices());
    assert_eq!(renderer.vertex_array().nb_slots(), 2);

    let mut camera = SceneCamera::new();
    camera.frame(&mesh.bb());
    camera.set_viewport(fbo.width(), fbo.height());
    let mvp: Mat4 = camera.view_projection();

    let camera_ubo = Ubo::new(&gpu, &mvp, 0, "camera");
    let material_ubo = Ubo::<MaterialUniform>::new(&gpu, &renderer.material().to_uniform(), 1, "material");

    let program = ShaderProgram::create(
        &gpu,
        "phong",
        &[(Stage::Vertex, MESH_SHADER), (Stage::Fragment, MESH_SHADER)],
    )
    .unwrap();

    let config = RenderPipelineConfig::new(renderer.vertex_array(), &fbo)
        .topology(Primitive::Triangles.topology())
        .cull(wgpu::Face::Back);
    let pipeline = program.render_pipeline(&gpu, &config).unwrap();

    let bind_group = BindGroupBuilder::new()
        .uniform(&camera_ubo)
        .uniform(&material_ubo)
        .build(&gpu, &pipeline.get_bind_group_layout(0), "phong bindings")
        .unwrap();

    let mut encoder = gpu.create_encoder("draw mesh");
    {
        let mut pass = fbo
            .begin_pass(&mut encoder, ClearOps::color(wgpu::Color::BLUE))
            .unwrap();
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        renderer.draw(&mut pass, Primitive::Triangles);
    }
    gpu.submit(encoder);

    let color = fbo.texture(0).unwrap();
    assert_eq!(read_pixel(&gpu, color, 0, 0), [0, 0, 255, 255], "corner keeps the clear colour");
    assert_ne!(read_pixel(&gpu, color, 32, 32), [0, 0, 255, 255], "sphere covers the centre");
}

#[test]
fn missing_vertex_input_is_a_pipeline_error() {
    let Some(gpu) = gpu() else { return };

    let mut fbo = Fbo::new(vec![color_target("color")], true).unwrap();
    fbo.resize(&gpu, 8, 8).unwrap();

    // positions only, the shader also reads normals at location 2
    let renderer = MeshRenderer::new(&gpu, &Mesh::sphere(8), AttribLocations::default()).unwrap();
    let program = ShaderProgram::create(
        &gpu,
        "phong",
        &[(Stage::Vertex, MESH_SHADER), (Stage::Fragment, MESH_SHADER)],
    )
    .unwrap();

    let err = program
        .render_pipeline(&gpu, &RenderPipelineConfig::new(renderer.vertex_array(), &fbo))
        .unwrap_err();
    match err {
        Error::Wgpu { what, message } => {
            assert_eq!(what, "phong");
            assert!(!message.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_mesh_attribute_is_rejected() {
    let Some(gpu) = gpu() else { return };

    let err = MeshRenderer::new(&gpu, &Mesh::cube_pos_only(), AttribLocations::pos_normal_uv())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        Error::InvalidMesh(MeshDefect::MissingAttribute { location: 2, .. })
    ));
}

#[test]
fn draw_instanced_grid() {
    let Some(gpu) = gpu() else { return };

    let mut fbo = Fbo::new(vec![color_target("color")], false).unwrap();
    fbo.resize(&gpu, 32, 32).unwrap();

    let offsets: Vec<Vec3> = (0..9)
        .map(|i| Vec3::new((i % 3) as f32 * 0.5 - 0.5, (i / 3) as f32 * 0.5 - 0.5, 0.5))
        .collect();
    let offsets_vbo = Vbo::from_data(&gpu, &offsets, "offsets");

    let renderer = MeshRenderer::instanced(
        &gpu,
        &Mesh::cube_pos_only(),
        AttribLocations::default(),
        &[AttribSpec::new(5, &offsets_vbo).per_instance()],
    )
    .unwrap();
    assert_eq!(renderer.vertex_array().instance_count(), 9);

    let program = ShaderProgram::create(
        &gpu,
        "instanced",
        &[(Stage::Vertex, INSTANCED_SHADER), (Stage::Fragment, INSTANCED_SHADER)],
    )
    .unwrap();
    let pipeline = program
        .render_pipeline(&gpu, &RenderPipelineConfig::new(renderer.vertex_array(), &fbo))
        .unwrap();

    let mut encoder = gpu.create_encoder("draw instanced");
    {
        let mut pass = fbo.begin_pass(&mut encoder, ClearOps::default()).unwrap();
        pass.set_pipeline(&pipeline);
        renderer.draw(&mut pass, Primitive::Triangles);
    }
    gpu.submit(encoder);

    // the middle instance sits at the origin
    let color = fbo.texture(0).unwrap();
    assert_eq!(read_pixel(&gpu, color, 16, 16), [255, 255, 255, 255]);
    assert_eq!(read_pixel(&gpu, color, 0, 31), [0, 0, 0, 255]);
}

#[test]
fn vertex_only_program_rejects_colour_targets() {
    let Some(gpu) = gpu() else { return };

    let fbo = Fbo::new(vec![color_target("color")], false).unwrap();
    let program =
        ShaderProgram::create(&gpu, "depth only", &[(Stage::Vertex, INSTANCED_SHADER)]).unwrap();
    assert!(!program.has_fragment());

    let vao = VertexArray::none();
    assert!(matches!(
        program.render_pipeline(&gpu, &RenderPipelineConfig::new(&vao, &fbo)),
        Err(Error::InvalidStages { .. })
    ));
    assert!(matches!(program.compute_pipeline(&gpu), Err(Error::InvalidStages { .. })));
}

// ============================================================================
// Compute
// ============================================================================

#[test]
fn compute_doubles_vertex_buffer() {
    let Some(gpu) = gpu() else { return };
    if !gpu
        .downlevel_flags()
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
    {
        eprintln!("adapter has no compute shaders, skipping");
        return;
    }

    let values: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let vbo = Vbo::from_data(&gpu, &values, "values");

    let program = ShaderProgram::create(&gpu, "double", &[(Stage::Compute, DOUBLE_SHADER)]).unwrap();
    assert!(program.is_compute());
    let pipeline = program.compute_pipeline(&gpu).unwrap();

    let bind_group = BindGroupBuilder::new()
        .vertex_storage(0, &vbo)
        .build(&gpu, &pipeline.get_bind_group_layout(0), "double bindings")
        .unwrap();

    let mut encoder = gpu.create_encoder("double");
    dispatch(
        &mut encoder,
        &pipeline,
        &[&bind_group],
        [workgroups_for(vbo.length(), 64), 1, 1],
    );
    gpu.submit(encoder);

    let doubled: Vec<f32> = values.iter().map(|v| v * 2.0).collect();
    assert_eq!(read_floats(&gpu, vbo.buffer(), values.len()), doubled);
}

#[test]
fn duplicate_binding_is_rejected() {
    let Some(gpu) = gpu() else { return };

    let a = Ssbo::new(&gpu, 16, 0, "a");
    let b = Ssbo::new(&gpu, 16, 0, "b");
    let layout = gpu
        .device()
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("unused"),
            entries: &[],
        });
    assert!(matches!(
        BindGroupBuilder::new().storage(&a).storage(&b).build(&gpu, &layout, "dup"),
        Err(Error::DuplicateBinding(0))
    ));
}
