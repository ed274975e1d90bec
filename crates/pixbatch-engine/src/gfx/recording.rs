//! Headless backend that records every call.
//!
//! Used by the renderer tests and by tooling that wants to inspect the command
//! stream (draw counts, upload sizes) without a GPU.
//!
//! Target attachments are kept as CPU texel planes so clears can be read back;
//! draws are recorded but not rasterized.

use std::collections::HashMap;

use crate::error::GfxError;
use crate::paint::PackedColor;

use super::backend::GraphicsBackend;
use super::layout::VertexLayout;
use super::types::{
    self, AttachmentClear, IndexData, IndexType, ShaderSource, TargetDesc, TextureDesc,
    TextureSpec, Topology,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecBuffer {
    pub id: u32,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecIndexBuffer {
    pub id: u32,
    pub index_type: IndexType,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecVertexArray {
    pub id: u32,
    pub buffer: u32,
    pub stride: u32,
    pub index_buffer: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecProgram {
    pub id: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecTexture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecTarget {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<TextureSpec>,
    pub draw_attachment: usize,
    pub color: Option<RecTexture>,
}

/// One `u32` per texel and attachment. `Rgba8` texels hold `0xRRGGBBAA`.
#[derive(Debug)]
struct TexelPlanes {
    draw_attachment: usize,
    width: u32,
    planes: Vec<Vec<u32>>,
}

impl TexelPlanes {
    fn new(draw_attachment: usize, width: u32, height: u32, count: usize) -> Self {
        Self {
            draw_attachment,
            width,
            planes: vec![vec![0; width as usize * height as usize]; count],
        }
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateVertexBuffer { id: u32, capacity: usize },
    CreateIndexBuffer { id: u32, index_type: IndexType, count: usize },
    WriteBuffer { id: u32, offset: usize, bytes: Vec<u8> },
    CreateVertexArray { id: u32, buffer: u32, stride: u32 },
    CreateProgram { id: u32, label: String },
    CreateTexture { id: u32, width: u32, height: u32 },
    WriteTexture { id: u32, len: usize },
    CreateTarget { id: u32, width: u32, height: u32 },
    ResizeTarget { id: u32, width: u32, height: u32 },
    BindVertexArray(u32),
    BindProgram(u32),
    BindTexture { slot: u32, id: u32 },
    BindTarget(u32),
    UnbindTarget,
    Clear(PackedColor),
    ClearAttachment { id: u32, index: usize },
    ReadPixel { id: u32, index: usize, x: u32, y: u32 },
    Draw { topology: Topology, count: u32 },
    DrawIndexed { topology: Topology, count: u32, index_type: IndexType },
}

/// A draw call with the bindings that were active when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub topology: Topology,
    pub count: u32,
    pub indexed: Option<IndexType>,
    pub vertex_array: Option<u32>,
    pub program: Option<u32>,
    pub texture: Option<u32>,
    pub target: Option<u32>,
    pub viewport: Option<(u32, u32)>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<Call>,
    draws: Vec<DrawRecord>,
    next_id: u32,

    vertex_array: Option<u32>,
    program: Option<u32>,
    texture: Option<u32>,
    target: Option<u32>,
    viewport: Option<(u32, u32)>,

    texels: HashMap<u32, TexelPlanes>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Byte payloads uploaded to buffer `id`, in order.
    pub fn uploads_to(&self, id: u32) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::WriteBuffer { id: b, bytes, .. } if *b == id => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Forgets recorded calls and draws. Bindings are kept.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.draws.clear();
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record_draw(&mut self, topology: Topology, count: u32, indexed: Option<IndexType>) {
        self.draws.push(DrawRecord {
            topology,
            count,
            indexed,
            vertex_array: self.vertex_array,
            program: self.program,
            texture: self.texture,
            target: self.target,
            viewport: self.viewport,
        });
    }
}

impl GraphicsBackend for RecordingBackend {
    type Buffer = RecBuffer;
    type IndexBuffer = RecIndexBuffer;
    type VertexArray = RecVertexArray;
    type Program = RecProgram;
    type Texture = RecTexture;
    type Target = RecTarget;

    fn create_vertex_buffer(&mut self, _label: &str, capacity: usize) -> RecBuffer {
        let id = self.alloc_id();
        self.calls.push(Call::CreateVertexBuffer { id, capacity });
        RecBuffer { id, capacity }
    }

    fn create_index_buffer(&mut self, _label: &str, indices: IndexData<'_>) -> RecIndexBuffer {
        let id = self.alloc_id();
        let index_type = indices.index_type();
        let count = indices.len();
        self.calls.push(Call::CreateIndexBuffer { id, index_type, count });
        RecIndexBuffer { id, index_type, count }
    }

    fn write_buffer(&mut self, buffer: &RecBuffer, offset: usize, bytes: &[u8]) {
        debug_assert!(
            offset + bytes.len() <= buffer.capacity,
            "write of {} bytes at {offset} overflows buffer of {}",
            bytes.len(),
            buffer.capacity
        );
        self.calls.push(Call::WriteBuffer {
            id: buffer.id,
            offset,
            bytes: bytes.to_vec(),
        });
    }

    fn create_vertex_array(
        &mut self,
        buffer: &RecBuffer,
        layout: &VertexLayout,
        indices: Option<&RecIndexBuffer>,
    ) -> Result<RecVertexArray, GfxError> {
        if layout.is_empty() {
            return Err(GfxError::EmptyLayout);
        }
        let id = self.alloc_id();
        self.calls.push(Call::CreateVertexArray {
            id,
            buffer: buffer.id,
            stride: layout.stride(),
        });
        Ok(RecVertexArray {
            id,
            buffer: buffer.id,
            stride: layout.stride(),
            index_buffer: indices.map(|i| i.id),
        })
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<RecProgram, GfxError> {
        if source.source.trim().is_empty() {
            return Err(GfxError::ShaderCompile {
                label: source.label.to_string(),
                log: "empty shader source".to_string(),
            });
        }
        let id = self.alloc_id();
        let label = source.label.to_string();
        self.calls.push(Call::CreateProgram { id, label: label.clone() });
        Ok(RecProgram { id, label })
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<RecTexture, GfxError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GfxError::InvalidSize {
                what: "texture",
                width: desc.width,
                height: desc.height,
            });
        }
        let id = self.alloc_id();
        self.calls.push(Call::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
        });
        Ok(RecTexture {
            id,
            width: desc.width,
            height: desc.height,
        })
    }

    fn write_texture(&mut self, texture: &RecTexture, data: &[u8]) -> Result<(), GfxError> {
        let expected = texture.width as usize * texture.height as usize * 4;
        if data.len() != expected {
            return Err(GfxError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }
        self.calls.push(Call::WriteTexture {
            id: texture.id,
            len: data.len(),
        });
        Ok(())
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<RecTarget, GfxError> {
        let draw_attachment = desc.draw_attachment()?;
        let color = self.create_texture(&TextureDesc::rgba8(
            desc.label.clone(),
            desc.width,
            desc.height,
        ))?;
        let id = self.alloc_id();
        self.calls.push(Call::CreateTarget {
            id,
            width: desc.width,
            height: desc.height,
        });
        self.texels.insert(
            id,
            TexelPlanes::new(draw_attachment, desc.width, desc.height, desc.attachments.len()),
        );
        Ok(RecTarget {
            id,
            width: desc.width,
            height: desc.height,
            attachments: desc.attachments.clone(),
            draw_attachment,
            color: Some(color),
        })
    }

    fn resize_target(
        &mut self,
        target: &mut RecTarget,
        width: u32,
        height: u32,
    ) -> Result<(), GfxError> {
        if width == 0 || height == 0 {
            return Err(GfxError::InvalidSize {
                what: "render target",
                width,
                height,
            });
        }
        target.width = width;
        target.height = height;
        if let Some(color) = target.color.as_mut() {
            color.width = width;
            color.height = height;
        }
        self.texels.insert(
            target.id,
            TexelPlanes::new(target.draw_attachment, width, height, target.attachments.len()),
        );
        self.calls.push(Call::ResizeTarget {
            id: target.id,
            width,
            height,
        });
        Ok(())
    }

    fn target_size(&self, target: &RecTarget) -> (u32, u32) {
        (target.width, target.height)
    }

    fn target_texture(&self, target: &RecTarget) -> Option<RecTexture> {
        target.color.clone()
    }

    fn bind_vertex_array(&mut self, vertex_array: &RecVertexArray) {
        self.vertex_array = Some(vertex_array.id);
        self.calls.push(Call::BindVertexArray(vertex_array.id));
    }

    fn bind_program(&mut self, program: &RecProgram) {
        self.program = Some(program.id);
        self.calls.push(Call::BindProgram(program.id));
    }

    fn bind_texture(&mut self, slot: u32, texture: &RecTexture) {
        if slot == 0 {
            self.texture = Some(texture.id);
        }
        self.calls.push(Call::BindTexture { slot, id: texture.id });
    }

    fn bind_target(&mut self, target: &RecTarget) {
        self.target = Some(target.id);
        self.viewport = Some((target.width, target.height));
        self.calls.push(Call::BindTarget(target.id));
    }

    fn unbind_target(&mut self) {
        self.target = None;
        self.viewport = None;
        self.calls.push(Call::UnbindTarget);
    }

    fn clear(&mut self, color: PackedColor) {
        if let Some(planes) = self.target.and_then(|id| self.texels.get_mut(&id)) {
            let draw = planes.draw_attachment;
            planes.planes[draw].fill(color.0);
        }
        self.calls.push(Call::Clear(color));
    }

    fn clear_attachment(
        &mut self,
        target: &RecTarget,
        index: usize,
        value: AttachmentClear,
    ) -> Result<(), GfxError> {
        types::check_clear(&target.attachments, index, value)?;
        let texel = match value {
            AttachmentClear::Color(c) => c.0,
            AttachmentClear::Uint(v) => v,
            AttachmentClear::DepthStencil { depth, .. } => depth.to_bits(),
        };
        if let Some(planes) = self.texels.get_mut(&target.id) {
            planes.planes[index].fill(texel);
        }
        self.calls.push(Call::ClearAttachment { id: target.id, index });
        Ok(())
    }

    fn read_pixel(
        &mut self,
        target: &RecTarget,
        index: usize,
        x: u32,
        y: u32,
    ) -> Result<u32, GfxError> {
        types::check_readback(&target.attachments, index, (x, y), (target.width, target.height))?;
        self.calls.push(Call::ReadPixel { id: target.id, index, x, y });
        let texel = self
            .texels
            .get(&target.id)
            .and_then(|p| p.planes[index].get(y as usize * p.width as usize + x as usize).copied())
            .unwrap_or(0);
        Ok(texel)
    }

    fn draw(&mut self, topology: Topology, count: u32) {
        self.calls.push(Call::Draw { topology, count });
        self.record_draw(topology, count, None);
    }

    fn draw_indexed(&mut self, topology: Topology, count: u32, index_type: IndexType) {
        self.calls.push(Call::DrawIndexed {
            topology,
            count,
            index_type,
        });
        self.record_draw(topology, count, Some(index_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{DataType, LayoutElement, TextureFormat};

    #[test]
    fn draws_capture_bindings() {
        let mut gl = RecordingBackend::new();
        let buf = gl.create_vertex_buffer("vb", 64);
        let layout = VertexLayout::new([LayoutElement::new(DataType::F32x2)]);
        let vao = gl.create_vertex_array(&buf, &layout, None).unwrap();
        let prog = gl.create_program(&ShaderSource::wgsl("p", "fn main() {}")).unwrap();

        gl.bind_vertex_array(&vao);
        gl.bind_program(&prog);
        gl.draw(Topology::Points, 3);

        let d = &gl.draws()[0];
        assert_eq!(d.count, 3);
        assert_eq!(d.vertex_array, Some(vao.id));
        assert_eq!(d.program, Some(prog.id));
        assert_eq!(d.target, None);
    }

    #[test]
    fn empty_layout_is_rejected() {
        let mut gl = RecordingBackend::new();
        let buf = gl.create_vertex_buffer("vb", 4);
        let err = gl.create_vertex_array(&buf, &VertexLayout::new([]), None);
        assert!(matches!(err, Err(GfxError::EmptyLayout)));
    }

    #[test]
    fn empty_shader_fails_with_log() {
        let mut gl = RecordingBackend::new();
        let err = gl.create_program(&ShaderSource::wgsl("broken", "  ")).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn bound_target_sets_viewport() {
        let mut gl = RecordingBackend::new();
        let mut fb = gl.create_target(&TargetDesc::color("fb", 64, 32)).unwrap();
        gl.bind_target(&fb);
        gl.draw(Topology::Lines, 2);
        assert_eq!(gl.draws()[0].viewport, Some((64, 32)));

        gl.resize_target(&mut fb, 128, 96).unwrap();
        assert_eq!(gl.target_size(&fb), (128, 96));
        assert_eq!(gl.target_texture(&fb).map(|t| (t.width, t.height)), Some((128, 96)));

        gl.unbind_target();
        gl.draw(Topology::Lines, 2);
        assert_eq!(gl.draws()[1].viewport, None);
    }

    #[test]
    fn target_with_integer_draw_attachment_is_rejected() {
        let mut gl = RecordingBackend::new();
        let desc = TargetDesc {
            label: "ids".into(),
            width: 8,
            height: 8,
            attachments: vec![TextureSpec::new(TextureFormat::R32Uint)],
        };
        assert!(matches!(
            gl.create_target(&desc),
            Err(GfxError::DrawAttachmentFormat(TextureFormat::R32Uint))
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn id_attachment_clears_and_reads_back() {
        let mut gl = RecordingBackend::new();
        let desc = TargetDesc::color("picking", 4, 4)
            .with_attachment(TextureSpec::new(TextureFormat::R32Uint))
            .with_attachment(TextureSpec::new(TextureFormat::Depth24Stencil8));
        let fb = gl.create_target(&desc).unwrap();

        gl.clear_attachment(&fb, 1, AttachmentClear::Uint(42)).unwrap();
        gl.clear_attachment(&fb, 2, AttachmentClear::DepthStencil { depth: 1.0, stencil: 0 })
            .unwrap();
        assert_eq!(gl.read_pixel(&fb, 1, 3, 2).unwrap(), 42);
        assert_eq!(gl.read_pixel(&fb, 0, 0, 0).unwrap(), 0);

        assert!(matches!(
            gl.clear_attachment(&fb, 1, AttachmentClear::Color(PackedColor::WHITE)),
            Err(GfxError::AttachmentFormat { op: "clear", index: 1, .. })
        ));
        assert!(matches!(
            gl.read_pixel(&fb, 2, 0, 0),
            Err(GfxError::AttachmentFormat { op: "read", .. })
        ));
        assert!(matches!(
            gl.read_pixel(&fb, 1, 4, 0),
            Err(GfxError::PixelOutOfBounds { .. })
        ));
        assert!(matches!(
            gl.read_pixel(&fb, 3, 0, 0),
            Err(GfxError::AttachmentIndex { index: 3, count: 3 })
        ));
    }

    #[test]
    fn clear_fills_the_bound_draw_attachment() {
        let mut gl = RecordingBackend::new();
        let desc = TargetDesc::color("fb", 2, 2)
            .with_attachment(TextureSpec::new(TextureFormat::R32Uint));
        let fb = gl.create_target(&desc).unwrap();

        gl.clear(PackedColor::new(0x11223344));
        assert_eq!(gl.read_pixel(&fb, 0, 1, 1).unwrap(), 0);

        gl.bind_target(&fb);
        gl.clear(PackedColor::new(0x11223344));
        assert_eq!(gl.read_pixel(&fb, 0, 1, 1).unwrap(), 0x11223344);
        assert_eq!(gl.read_pixel(&fb, 1, 1, 1).unwrap(), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "overflows buffer")]
    fn oversized_write_panics_in_debug() {
        let mut gl = RecordingBackend::new();
        let buf = gl.create_vertex_buffer("vb", 8);
        gl.write_buffer(&buf, 4, &[0u8; 8]);
    }

    #[test]
    fn texture_upload_size_is_checked() {
        let mut gl = RecordingBackend::new();
        let tex = gl.create_texture(&TextureDesc::rgba8("t", 2, 2)).unwrap();
        assert!(gl.write_texture(&tex, &[0u8; 16]).is_ok());
        assert!(matches!(
            gl.write_texture(&tex, &[0u8; 15]),
            Err(GfxError::TextureDataSize { expected: 16, actual: 15 })
        ));
    }
}
