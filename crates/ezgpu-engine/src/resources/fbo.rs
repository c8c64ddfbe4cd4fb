use crate::device::Gpu;
use crate::error::{Error, Result};

use super::texture::{Texture2D, TextureParams};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// What to do with attachments at the start of a pass.
///
/// `None` keeps the previous content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOps {
    pub color: Option<wgpu::Color>,
    pub depth: Option<f32>,
}

impl Default for ClearOps {
    fn default() -> Self {
        Self {
            color: Some(wgpu::Color::BLACK),
            depth: Some(1.0),
        }
    }
}

impl ClearOps {
    pub const LOAD: Self = Self {
        color: None,
        depth: None,
    };

    pub fn color(color: wgpu::Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

/// Off-screen render target.
///
/// Owns its colour textures and optional depth texture; all attachments are
/// kept at the same size. The framebuffer starts unallocated and is sized
/// with [`Fbo::resize`].
pub struct Fbo {
    colors: Vec<Texture2D>,
    depth: Option<Texture2D>,
}

impl Fbo {
    /// Builds a framebuffer from colour textures, plus an owned depth texture
    /// when `with_depth` is set.
    ///
    /// Colour textures may already be allocated, but then they must all have
    /// the same size. The depth texture starts unallocated.
    pub fn new(colors: Vec<Texture2D>, with_depth: bool) -> Result<Self> {
        if colors.is_empty() && !with_depth {
            return Err(Error::EmptyFramebuffer);
        }
        common_size(&colors)?;
        let depth = with_depth.then(|| {
            Texture2D::new("fbo depth", DEPTH_FORMAT, TextureParams::nearest_clamp())
        });
        Ok(Self { colors, depth })
    }

    /// Depth-only target (shadow maps).
    pub fn depth_only() -> Self {
        Self {
            colors: Vec::new(),
            depth: Some(Texture2D::new(
                "fbo depth",
                DEPTH_FORMAT,
                TextureParams::nearest_clamp(),
            )),
        }
    }

    /// Resizes every attachment. Returns whether anything was reallocated.
    pub fn resize(&mut self, gpu: &Gpu, width: u32, height: u32) -> Result<bool> {
        let mut changed = false;
        for tex in self.colors.iter_mut().chain(self.depth.iter_mut()) {
            changed |= tex.resize(gpu, width, height)?;
        }
        if changed {
            log::debug!("fbo resized to {width}x{height}");
        }
        Ok(changed)
    }

    /// Number of colour attachments.
    pub fn nb_textures(&self) -> usize {
        self.colors.len()
    }

    /// Colour attachment `i`.
    pub fn texture(&self, i: usize) -> Option<&Texture2D> {
        self.colors.get(i)
    }

    pub fn depth(&self) -> Option<&Texture2D> {
        self.depth.as_ref()
    }

    /// Size shared by the attachments, once allocated.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.colors
            .first()
            .or(self.depth.as_ref())
            .and_then(Texture2D::size)
    }

    pub fn width(&self) -> u32 {
        self.size().map_or(0, |(w, _)| w)
    }

    pub fn height(&self) -> u32 {
        self.size().map_or(0, |(_, h)| h)
    }

    /// Colour formats, in attachment order (for pipeline targets).
    pub fn color_formats(&self) -> Vec<wgpu::TextureFormat> {
        self.colors.iter().map(Texture2D::format).collect()
    }

    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.depth.as_ref().map(Texture2D::format)
    }

    /// Opens a render pass targeting every attachment.
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        clear: ClearOps,
    ) -> Result<wgpu::RenderPass<'e>> {
        let color_ops = wgpu::Operations {
            load: clear.color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
            store: wgpu::StoreOp::Store,
        };

        let mut color_attachments = Vec::with_capacity(self.colors.len());
        for tex in &self.colors {
            color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: tex.view()?,
                resolve_target: None,
                ops: color_ops,
                depth_slice: None,
            }));
        }

        let depth_stencil_attachment = match &self.depth {
            Some(tex) => Some(wgpu::RenderPassDepthStencilAttachment {
                view: tex.view()?,
                depth_ops: Some(wgpu::Operations {
                    load: clear.depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            None => None,
        };

        Ok(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fbo pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        }))
    }
}

/// Size shared by the allocated textures of `textures`, if any is allocated.
fn common_size(textures: &[Texture2D]) -> Result<Option<(u32, u32)>> {
    let mut allocated = textures.iter().filter_map(|t| Some((t, t.size()?)));
    let Some((_, expected)) = allocated.next() else {
        return Ok(None);
    };
    match allocated.find(|(_, size)| *size != expected) {
        Some((tex, actual)) => Err(Error::AttachmentSize {
            label: tex.label().to_string(),
            expected,
            actual,
        }),
        None => Ok(Some(expected)),
    }
}
