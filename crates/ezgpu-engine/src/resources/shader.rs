use std::borrow::Cow;

use crate::device::Gpu;
use crate::error::{Error, Result, Stage};

use super::fbo::Fbo;
use super::vao::VertexArray;

// ── validation ────────────────────────────────────────────────────────────

fn naga_stage(stage: Stage) -> naga::ShaderStage {
    match stage {
        Stage::Vertex => naga::ShaderStage::Vertex,
        Stage::Fragment => naga::ShaderStage::Fragment,
        Stage::Compute => naga::ShaderStage::Compute,
    }
}

/// naga capabilities matching what a device with `features` and `downlevel`
/// accepts in shaders.
pub fn shader_capabilities(
    features: wgpu::Features,
    downlevel: wgpu::DownlevelFlags,
) -> naga::valid::Capabilities {
    use naga::valid::Capabilities as Caps;
    use wgpu::Features as F;

    const FROM_FEATURES: &[(Caps, F)] = &[
        (Caps::IMMEDIATES, F::IMMEDIATES),
        (Caps::FLOAT64, F::SHADER_F64),
        (Caps::SHADER_FLOAT16, F::SHADER_F16),
        (Caps::PRIMITIVE_INDEX, F::SHADER_PRIMITIVE_INDEX),
        (Caps::TEXTURE_AND_SAMPLER_BINDING_ARRAY, F::TEXTURE_BINDING_ARRAY),
        (Caps::BUFFER_BINDING_ARRAY, F::BUFFER_BINDING_ARRAY),
        (Caps::STORAGE_TEXTURE_16BIT_NORM_FORMATS, F::TEXTURE_FORMAT_16BIT_NORM),
        (Caps::MULTIVIEW, F::MULTIVIEW),
        (Caps::EARLY_DEPTH_TEST, F::SHADER_EARLY_DEPTH_TEST),
        (Caps::SHADER_INT64, F::SHADER_INT64),
        (Caps::SHADER_FLOAT32_ATOMIC, F::SHADER_FLOAT32_ATOMIC),
        (Caps::TEXTURE_ATOMIC, F::TEXTURE_ATOMIC),
        (Caps::DUAL_SOURCE_BLENDING, F::DUAL_SOURCE_BLENDING),
        (Caps::CLIP_DISTANCE, F::CLIP_DISTANCES),
        (Caps::SUBGROUP_BARRIER, F::SUBGROUP_BARRIER),
        (Caps::SUBGROUP_VERTEX_STAGE, F::SUBGROUP_VERTEX),
        (Caps::SHADER_BARYCENTRICS, F::SHADER_BARYCENTRICS),
    ];

    let mut caps = Caps::empty();
    for &(cap, feature) in FROM_FEATURES {
        caps.set(cap, features.contains(feature));
    }
    caps.set(
        Caps::SUBGROUP,
        features.intersects(F::SUBGROUP | F::SUBGROUP_VERTEX),
    );
    caps.set(
        Caps::SHADER_FLOAT16_IN_FLOAT32,
        downlevel.contains(wgpu::DownlevelFlags::SHADER_F16_IN_F32),
    );
    caps.set(
        Caps::MULTISAMPLED_SHADING,
        downlevel.contains(wgpu::DownlevelFlags::MULTISAMPLED_SHADING),
    );
    caps.set(
        Caps::CUBE_ARRAY_TEXTURES,
        downlevel.contains(wgpu::DownlevelFlags::CUBE_ARRAY_TEXTURES),
    );
    caps
}

/// Parses and validates one WGSL stage source on the CPU against `caps`.
///
/// Returns the name of the first entry point of `stage`. Diagnostics are
/// logged and carried by the returned error.
pub fn validate_stage(
    name: &str,
    stage: Stage,
    src: &str,
    caps: naga::valid::Capabilities,
) -> Result<String> {
    let module = naga::front::wgsl::parse_str(src).map_err(|e| {
        let message = e.emit_to_string(src);
        log::error!("shader `{name}` ({stage:?}) parse error:\n{message}");
        Error::ShaderParse {
            name: name.to_string(),
            stage,
            message,
        }
    })?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), caps)
        .validate(&module)
        .map_err(|e| {
            let message = e.emit_to_string(src);
            log::error!("shader `{name}` ({stage:?}) validation error:\n{message}");
            Error::ShaderValidation {
                name: name.to_string(),
                stage,
                message,
            }
        })?;

    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage(stage))
        .map(|ep| ep.name.clone())
        .ok_or_else(|| {
            log::error!("shader `{name}`: no {stage:?} entry point");
            Error::MissingEntryPoint {
                name: name.to_string(),
                stage,
            }
        })
}

/// Accepted stage sets: a lone compute stage, or a vertex stage with an
/// optional fragment stage.
pub fn check_stages(name: &str, stages: &[Stage]) -> Result<()> {
    let invalid = |reason| Error::InvalidStages {
        name: name.to_string(),
        reason,
    };

    if stages.is_empty() {
        return Err(invalid("no stage given"));
    }
    for (i, s) in stages.iter().enumerate() {
        if stages[..i].contains(s) {
            return Err(invalid("stage given more than once"));
        }
    }
    if stages.contains(&Stage::Compute) {
        if stages.len() > 1 {
            return Err(invalid("compute cannot be combined with other stages"));
        }
        return Ok(());
    }
    if !stages.contains(&Stage::Vertex) {
        return Err(invalid("render program needs a vertex stage"));
    }
    Ok(())
}

// ── program ───────────────────────────────────────────────────────────────

struct StageModule {
    module: wgpu::ShaderModule,
    entry_point: String,
}

enum Stages {
    Render {
        vertex: StageModule,
        fragment: Option<StageModule>,
    },
    Compute(StageModule),
}

/// Fixed-function state of a render pipeline built from a [`ShaderProgram`].
#[derive(Clone)]
pub struct RenderPipelineConfig<'a> {
    pub vertex_array: &'a VertexArray,
    pub color_formats: Vec<wgpu::TextureFormat>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub blend: Option<wgpu::BlendState>,
}

impl<'a> RenderPipelineConfig<'a> {
    /// Triangle list, no culling, no blending, targets of `fbo`.
    pub fn new(vertex_array: &'a VertexArray, fbo: &Fbo) -> Self {
        Self {
            vertex_array,
            color_formats: fbo.color_formats(),
            depth_format: fbo.depth_format(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            blend: None,
        }
    }

    pub fn topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn cull(mut self, face: wgpu::Face) -> Self {
        self.cull_mode = Some(face);
        self
    }

    pub fn alpha_blend(mut self) -> Self {
        self.blend = Some(wgpu::BlendState::ALPHA_BLENDING);
        self
    }
}

/// Named set of validated WGSL stages.
///
/// Bind group layouts are derived from the shaders; fetch them from the built
/// pipeline with `get_bind_group_layout`.
pub struct ShaderProgram {
    name: String,
    stages: Stages,
}

impl ShaderProgram {
    /// Validates each `(stage, source)` pair and creates its shader module.
    ///
    /// Sources are checked against the capabilities of `gpu` before wgpu sees
    /// them, so errors come back as [`Error::ShaderParse`] or
    /// [`Error::ShaderValidation`] with the naga diagnostic.
    pub fn create(gpu: &Gpu, name: &str, sources: &[(Stage, &str)]) -> Result<Self> {
        let kinds: Vec<Stage> = sources.iter().map(|(s, _)| *s).collect();
        check_stages(name, &kinds)?;

        let caps = shader_capabilities(gpu.features(), gpu.downlevel_flags());
        let mut vertex = None;
        let mut fragment = None;
        let mut compute = None;
        for &(stage, src) in sources {
            let entry_point = validate_stage(name, stage, src, caps)?;
            let label = format!("{name} {stage:?}");
            let (module, error) = gpu.validated(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&label),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(src)),
                })
            });
            if let Some(e) = error {
                return Err(Error::wgpu(&label, e));
            }
            let sm = StageModule {
                module,
                entry_point,
            };
            match stage {
                Stage::Vertex => vertex = Some(sm),
                Stage::Fragment => fragment = Some(sm),
                Stage::Compute => compute = Some(sm),
            }
        }

        let stages = match (vertex, compute) {
            (Some(vertex), None) => Stages::Render { vertex, fragment },
            (None, Some(c)) => Stages::Compute(c),
            _ => {
                return Err(Error::InvalidStages {
                    name: name.to_string(),
                    reason: "render program needs a vertex stage",
                });
            }
        };

        log::info!("shader program `{name}` created ({:?})", kinds);
        Ok(Self {
            name: name.to_string(),
            stages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_compute(&self) -> bool {
        matches!(self.stages, Stages::Compute(_))
    }

    pub fn has_fragment(&self) -> bool {
        matches!(self.stages, Stages::Render { fragment: Some(_), .. })
    }

    /// Builds a render pipeline for `config`.
    ///
    /// Mismatches wgpu detects between the shaders and `config` (a shader
    /// input with no vertex attribute, a wrong target format) are returned as
    /// [`Error::Wgpu`].
    pub fn render_pipeline(
        &self,
        gpu: &Gpu,
        config: &RenderPipelineConfig<'_>,
    ) -> Result<wgpu::RenderPipeline> {
        let Stages::Render { vertex, fragment } = &self.stages else {
            return Err(self.invalid("compute program has no render pipeline"));
        };
        if fragment.is_none() && !config.color_formats.is_empty() {
            return Err(self.invalid("colour targets need a fragment stage"));
        }

        let targets: Vec<Option<wgpu::ColorTargetState>> = config
            .color_formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: config.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();
        let buffers = config.vertex_array.buffer_layouts();

        let strip_index_format = config
            .topology
            .is_strip()
            .then_some(wgpu::IndexFormat::Uint32);

        let (pipeline, error) = gpu.validated(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&self.name),
                layout: None,

                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(&vertex.entry_point),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: fragment.as_ref().map(|f| wgpu::FragmentState {
                    module: &f.module,
                    entry_point: Some(&f.entry_point),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),

                primitive: wgpu::PrimitiveState {
                    topology: config.topology,
                    strip_index_format,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: config.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });
        match error {
            Some(e) => Err(Error::wgpu(&self.name, e)),
            None => Ok(pipeline),
        }
    }

    pub fn compute_pipeline(&self, gpu: &Gpu) -> Result<wgpu::ComputePipeline> {
        let Stages::Compute(stage) = &self.stages else {
            return Err(self.invalid("render program has no compute pipeline"));
        };
        let (pipeline, error) = gpu.validated(|device| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&self.name),
                layout: None,
                module: &stage.module,
                entry_point: Some(&stage.entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        });
        match error {
            Some(e) => Err(Error::wgpu(&self.name, e)),
            None => Ok(pipeline),
        }
    }

    fn invalid(&self, reason: &'static str) -> Error {
        Error::InvalidStages {
            name: self.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
@vertex
fn vs_main(@location(1) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos, 1.0);
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.0, 1.0);
}
"#;

    const CS: &str = r#"
@group(0) @binding(0) var<storage, read_write> data: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x < arrayLength(&data)) {
        data[id.x] = data[id.x] * 2.0;
    }
}
"#;

    fn base() -> naga::valid::Capabilities {
        shader_capabilities(wgpu::Features::empty(), wgpu::DownlevelFlags::all())
    }

    // ── validate_stage ────────────────────────────────────────────────────

    #[test]
    fn returns_entry_point_name() {
        assert_eq!(validate_stage("t", Stage::Vertex, VS, base()).unwrap(), "vs_main");
        assert_eq!(validate_stage("t", Stage::Fragment, FS, base()).unwrap(), "fs_main");
        assert_eq!(validate_stage("t", Stage::Compute, CS, base()).unwrap(), "main");
    }

    #[test]
    fn combined_source_serves_both_stages() {
        let src = format!("{VS}\n{FS}");
        assert_eq!(validate_stage("t", Stage::Vertex, &src, base()).unwrap(), "vs_main");
        assert_eq!(validate_stage("t", Stage::Fragment, &src, base()).unwrap(), "fs_main");
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        let src = "@vertex fn vs_main( {";
        let err = validate_stage("broken", Stage::Vertex, src, base()).unwrap_err();
        match err {
            Error::ShaderParse { name, stage, message } => {
                assert_eq!(name, "broken");
                assert_eq!(stage, Stage::Vertex);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_error_is_reported() {
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = vec2<f32>(1.0, 2.0);
    return vec4<f32>(x);
}
"#;
        let err = validate_stage("typed", Stage::Fragment, src, base()).unwrap_err();
        assert!(matches!(
            err,
            Error::ShaderParse { .. } | Error::ShaderValidation { .. }
        ));
    }

    #[test]
    fn wrong_stage_has_no_entry_point() {
        let err = validate_stage("fs", Stage::Vertex, FS, base()).unwrap_err();
        assert!(matches!(err, Error::MissingEntryPoint { stage: Stage::Vertex, .. }));
    }

    #[test]
    fn optional_types_need_the_device_feature() {
        let src = r#"
enable f16;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let h: f16 = 0.5h;
    return vec4<f32>(f32(h));
}
"#;
        let err = validate_stage("half", Stage::Fragment, src, base()).unwrap_err();
        assert!(matches!(err, Error::ShaderValidation { .. }));

        let caps = shader_capabilities(wgpu::Features::SHADER_F16, wgpu::DownlevelFlags::all());
        assert_eq!(validate_stage("half", Stage::Fragment, src, caps).unwrap(), "fs_main");
    }

    #[test]
    fn capabilities_follow_features() {
        use naga::valid::Capabilities as Caps;

        let caps = base();
        assert!(!caps.contains(Caps::FLOAT64));
        assert!(!caps.contains(Caps::SHADER_FLOAT16));
        assert!(caps.contains(Caps::CUBE_ARRAY_TEXTURES));

        let caps = shader_capabilities(
            wgpu::Features::SHADER_F64 | wgpu::Features::SUBGROUP,
            wgpu::DownlevelFlags::empty(),
        );
        assert!(caps.contains(Caps::FLOAT64 | Caps::SUBGROUP));
        assert!(!caps.contains(Caps::CUBE_ARRAY_TEXTURES));
    }

    // ── check_stages ──────────────────────────────────────────────────────

    #[test]
    fn accepted_stage_sets() {
        assert!(check_stages("p", &[Stage::Vertex]).is_ok());
        assert!(check_stages("p", &[Stage::Vertex, Stage::Fragment]).is_ok());
        assert!(check_stages("p", &[Stage::Fragment, Stage::Vertex]).is_ok());
        assert!(check_stages("p", &[Stage::Compute]).is_ok());
    }

    #[test]
    fn rejected_stage_sets() {
        for stages in [
            &[][..],
            &[Stage::Fragment][..],
            &[Stage::Vertex, Stage::Vertex][..],
            &[Stage::Compute, Stage::Vertex][..],
            &[Stage::Compute, Stage::Compute][..],
        ] {
            assert!(
                matches!(check_stages("p", stages), Err(Error::InvalidStages { .. })),
                "{stages:?} should be rejected"
            );
        }
    }
}
