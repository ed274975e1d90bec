//! Error types shared by the graphics layer, the renderer and configuration.
//!
//! Runtime glue (window creation, device acquisition) reports through
//! `anyhow`; everything below it returns one of these enums so callers can
//! match on the failure.

use std::path::PathBuf;

use crate::gfx::{DataType, TextureFormat};

/// Failures raised while creating or converting GPU resources.
///
/// None of these are retried. They indicate either a programmer error
/// (unsupported attribute combination) or an environment fault.
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    /// A vertex attribute has no native vertex format on this backend.
    #[error("unsupported vertex attribute: {data_type:?} (pass_as_float: {pass_as_float}, normalized: {normalized})")]
    UnsupportedAttribute {
        data_type: DataType,
        pass_as_float: bool,
        normalized: bool,
    },

    /// A vertex layout with no elements was handed to a backend.
    #[error("vertex layout has no elements")]
    EmptyLayout,

    /// Shader module failed to compile or validate. Carries the driver log.
    #[error("shader `{label}` failed to compile:\n{log}")]
    ShaderCompile { label: String, log: String },

    /// Texture or render target with a zero dimension.
    #[error("invalid {what} size {width}x{height}")]
    InvalidSize {
        what: &'static str,
        width: u32,
        height: u32,
    },

    /// Texel upload whose byte length does not match the texture.
    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureDataSize { expected: usize, actual: usize },

    /// Texture format that cannot be filled from client memory.
    #[error("{0:?} textures cannot be written from the CPU")]
    TextureNotWritable(TextureFormat),

    /// Quad capacity that cannot be addressed by any index type.
    #[error("{quads} quads need {vertices} vertices, which exceeds the index range")]
    IndexRange { quads: usize, vertices: u64 },

    /// Offscreen target without a color attachment to draw into.
    #[error("render target has no color attachment")]
    NoColorAttachment,

    /// The attachment draws go to must be `Rgba8`; the programs write `vec4<f32>`.
    #[error("draw attachment must be Rgba8, got {0:?}")]
    DrawAttachmentFormat(TextureFormat),

    #[error("attachment {index} out of range, target has {count}")]
    AttachmentIndex { index: usize, count: usize },

    /// Operation not defined for the attachment's format.
    #[error("cannot {op} attachment {index} ({format:?})")]
    AttachmentFormat {
        op: &'static str,
        index: usize,
        format: TextureFormat,
    },

    #[error("pixel ({x}, {y}) is outside the {width}x{height} target")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// GPU to CPU copy failed.
    #[error("readback failed: {0}")]
    Readback(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Misuse of the frame bracket.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("begin_frame called while a frame is already active")]
    AlreadyInFrame,

    #[error("end_frame called without an active frame")]
    NotInFrame,
}

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
