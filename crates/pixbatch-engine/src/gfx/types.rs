use std::borrow::Cow;

use crate::error::GfxError;
use crate::paint::PackedColor;

/// Primitive assembly for a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    Triangles,
}

/// Element type of an index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Borrowed index data handed to [`GraphicsBackend::create_index_buffer`].
///
/// [`GraphicsBackend::create_index_buffer`]: super::GraphicsBackend::create_index_buffer
#[derive(Debug, Copy, Clone)]
pub enum IndexData<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl<'a> IndexData<'a> {
    pub fn index_type(&self) -> IndexType {
        match self {
            IndexData::U8(_) => IndexType::U8,
            IndexData::U16(_) => IndexType::U16,
            IndexData::U32(_) => IndexType::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U8(d) => d.len(),
            IndexData::U16(d) => d.len(),
            IndexData::U32(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            IndexData::U8(d) => d,
            IndexData::U16(d) => bytemuck::cast_slice(d),
            IndexData::U32(d) => bytemuck::cast_slice(d),
        }
    }
}

/// Shader program source.
///
/// A program is one WGSL module holding both stages.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: Cow<'static, str>,
    pub source: Cow<'static, str>,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    /// Program samples the texture bound to slot 0.
    pub samples_texture: bool,
}

impl ShaderSource {
    pub fn wgsl(label: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            samples_texture: false,
        }
    }

    pub fn with_texture(mut self) -> Self {
        self.samples_texture = true;
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    /// Normalized 8-bit RGBA.
    Rgba8,
    /// Unsigned 32-bit integer, single channel (entity ids, picking).
    R32Uint,
    Depth24Stencil8,
}

impl TextureFormat {
    #[inline]
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth24Stencil8)
    }

    /// Bytes per texel for CPU uploads and readback, `None` when neither is allowed.
    pub fn upload_texel_size(self) -> Option<usize> {
        match self {
            TextureFormat::Rgba8 | TextureFormat::R32Uint => Some(4),
            TextureFormat::Depth24Stencil8 => None,
        }
    }
}

/// Value written by [`GraphicsBackend::clear_attachment`]. Each variant
/// matches exactly one attachment format.
///
/// [`GraphicsBackend::clear_attachment`]: super::GraphicsBackend::clear_attachment
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttachmentClear {
    Color(PackedColor),
    Uint(u32),
    DepthStencil { depth: f32, stencil: u32 },
}

impl AttachmentClear {
    pub fn accepts(self, format: TextureFormat) -> bool {
        matches!(
            (self, format),
            (AttachmentClear::Color(_), TextureFormat::Rgba8)
                | (AttachmentClear::Uint(_), TextureFormat::R32Uint)
                | (AttachmentClear::DepthStencil { .. }, TextureFormat::Depth24Stencil8)
        )
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureFilter {
    Linear,
    #[default]
    Nearest,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureWrap {
    #[default]
    Clamp,
    Repeat,
}

/// Format and sampling parameters of a texture or attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureSpec {
    pub format: TextureFormat,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl TextureSpec {
    pub const fn new(format: TextureFormat) -> Self {
        Self {
            format,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            wrap: TextureWrap::Clamp,
        }
    }

    pub const fn filter(mut self, filter: TextureFilter) -> Self {
        self.min_filter = filter;
        self.mag_filter = filter;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub label: Cow<'static, str>,
    pub width: u32,
    pub height: u32,
    pub spec: TextureSpec,
}

impl TextureDesc {
    pub fn rgba8(label: impl Into<Cow<'static, str>>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            spec: TextureSpec::new(TextureFormat::Rgba8),
        }
    }

    /// Expected byte length of a full upload.
    pub fn upload_len(&self) -> Option<usize> {
        self.spec
            .format
            .upload_texel_size()
            .map(|bpp| self.width as usize * self.height as usize * bpp)
    }
}

/// Offscreen render target description.
#[derive(Debug, Clone)]
pub struct TargetDesc {
    pub label: Cow<'static, str>,
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<TextureSpec>,
}

impl TargetDesc {
    /// Single RGBA8 color attachment.
    pub fn color(label: impl Into<Cow<'static, str>>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            attachments: vec![TextureSpec::new(TextureFormat::Rgba8)],
        }
    }

    pub fn with_attachment(mut self, spec: TextureSpec) -> Self {
        self.attachments.push(spec);
        self
    }

    /// Index of the first color attachment.
    pub fn color_attachment(&self) -> Option<usize> {
        self.attachments.iter().position(|a| !a.format.is_depth())
    }

    /// Checks the size and returns the attachment draws go to.
    pub fn draw_attachment(&self) -> Result<usize, GfxError> {
        if self.width == 0 || self.height == 0 {
            return Err(GfxError::InvalidSize {
                what: "render target",
                width: self.width,
                height: self.height,
            });
        }
        let index = self.color_attachment().ok_or(GfxError::NoColorAttachment)?;
        match self.attachments[index].format {
            TextureFormat::Rgba8 => Ok(index),
            other => Err(GfxError::DrawAttachmentFormat(other)),
        }
    }
}

/// Format of attachment `index`, or `AttachmentIndex` when there is none.
pub(crate) fn attachment_format(
    attachments: &[TextureSpec],
    index: usize,
) -> Result<TextureFormat, GfxError> {
    attachments
        .get(index)
        .map(|a| a.format)
        .ok_or(GfxError::AttachmentIndex {
            index,
            count: attachments.len(),
        })
}

/// Validates a single-texel readback and returns the attachment format.
pub(crate) fn check_readback(
    attachments: &[TextureSpec],
    index: usize,
    (x, y): (u32, u32),
    (width, height): (u32, u32),
) -> Result<TextureFormat, GfxError> {
    let format = attachment_format(attachments, index)?;
    if format.upload_texel_size().is_none() {
        return Err(GfxError::AttachmentFormat {
            op: "read",
            index,
            format,
        });
    }
    if x >= width || y >= height {
        return Err(GfxError::PixelOutOfBounds { x, y, width, height });
    }
    Ok(format)
}

/// Validates that `value` can clear attachment `index`.
pub(crate) fn check_clear(
    attachments: &[TextureSpec],
    index: usize,
    value: AttachmentClear,
) -> Result<TextureFormat, GfxError> {
    let format = attachment_format(attachments, index)?;
    if !value.accepts(format) {
        return Err(GfxError::AttachmentFormat {
            op: "clear",
            index,
            format,
        });
    }
    Ok(format)
}
