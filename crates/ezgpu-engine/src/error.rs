//! Library error type.
//!
//! Resource misuse and shader compilation failures are reported through
//! [`Error`]. Device bootstrap uses `anyhow` instead (see `device`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("vertex data must have 1 to 4 components, got {0}")]
    InvalidComponents(u32),

    #[error("attribute location {0} is bound more than once")]
    DuplicateLocation(u32),

    #[error("attribute location {location}: divisor {divisor} unsupported (only 0 or 1)")]
    UnsupportedDivisor { location: u32, divisor: u32 },

    #[error(
        "attribute location {location}: offset {offset} + {components} components exceeds stride {stride}"
    )]
    AttributeOutOfStride {
        location: u32,
        offset: u32,
        components: u32,
        stride: u32,
    },

    #[error("{what}: range {start}..{end} exceeds capacity {capacity}")]
    OutOfRange {
        what: &'static str,
        start: u64,
        end: u64,
        capacity: u64,
    },

    #[error("{what}: offset {offset} and size {size} must be multiples of {align}")]
    Misaligned {
        what: &'static str,
        offset: u64,
        size: u64,
        align: u64,
    },

    #[error("{what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("{0}: size must be non-zero")]
    ZeroSize(&'static str),

    #[error("texture `{0}` has no storage yet; call alloc or resize first")]
    NotAllocated(String),

    #[error("texture format {0:?} is not usable for this operation")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("shader `{name}` ({stage:?}) failed to parse:\n{message}")]
    ShaderParse {
        name: String,
        stage: Stage,
        message: String,
    },

    #[error("shader `{name}` ({stage:?}) failed validation:\n{message}")]
    ShaderValidation {
        name: String,
        stage: Stage,
        message: String,
    },

    #[error("shader `{name}` has no {stage:?} entry point")]
    MissingEntryPoint { name: String, stage: Stage },

    #[error("shader program `{name}`: {reason}")]
    InvalidStages { name: String, reason: &'static str },

    #[error("binding {0} is set more than once in the same bind group")]
    DuplicateBinding(u32),

    #[error("framebuffer has neither colour nor depth attachments")]
    EmptyFramebuffer,

    #[error("attachment `{label}` is {actual:?}, other attachments are {expected:?}")]
    AttachmentSize {
        label: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("wgpu rejected `{what}`:\n{message}")]
    Wgpu { what: String, message: String },

    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] crate::mesh::MeshDefect),
}

impl Error {
    /// Wraps a validation error caught by [`crate::device::Gpu::validated`].
    pub(crate) fn wgpu(what: &str, error: wgpu::Error) -> Self {
        let message = error.to_string();
        log::error!("wgpu rejected `{what}`:\n{message}");
        Self::Wgpu {
            what: what.to_string(),
            message,
        }
    }
}

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}
