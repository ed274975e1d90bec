use crate::error::GfxError;
use crate::paint::PackedColor;

use super::layout::VertexLayout;
use super::types::{
    AttachmentClear, IndexData, IndexType, ShaderSource, TargetDesc, TextureDesc, Topology,
};

/// Immediate-mode graphics API consumed by the batch renderer.
///
/// The model is a classic bind-then-draw state machine: a draw call uses
/// whatever vertex array, program, textures and target are currently bound.
/// Bindings persist until replaced; nothing is unbound after a draw.
///
/// Handle types own their GPU storage and release it on drop.
pub trait GraphicsBackend {
    type Buffer;
    type IndexBuffer;
    type VertexArray;
    type Program;
    type Texture: Clone;
    type Target;

    /// Allocates a vertex buffer of `capacity` bytes. Contents are undefined.
    fn create_vertex_buffer(&mut self, label: &str, capacity: usize) -> Self::Buffer;

    /// Uploads an immutable index buffer.
    fn create_index_buffer(&mut self, label: &str, indices: IndexData<'_>) -> Self::IndexBuffer;

    /// Uploads `bytes` into `buffer` starting at `offset`.
    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: usize, bytes: &[u8]);

    /// Binds `buffer` with `layout` (and optionally an index buffer) into a vertex array.
    fn create_vertex_array(
        &mut self,
        buffer: &Self::Buffer,
        layout: &VertexLayout,
        indices: Option<&Self::IndexBuffer>,
    ) -> Result<Self::VertexArray, GfxError>;

    /// Compiles a program. Failure carries the driver diagnostic text.
    fn create_program(&mut self, source: &ShaderSource) -> Result<Self::Program, GfxError>;

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Self::Texture, GfxError>;

    /// Replaces the full contents of `texture`.
    fn write_texture(&mut self, texture: &Self::Texture, data: &[u8]) -> Result<(), GfxError>;

    /// Creates an offscreen target. Its first color attachment receives
    /// draws and must be `Rgba8`; other attachments are cleared and read
    /// explicitly.
    fn create_target(&mut self, desc: &TargetDesc) -> Result<Self::Target, GfxError>;

    /// Recreates the attachments of `target` at the new size.
    fn resize_target(
        &mut self,
        target: &mut Self::Target,
        width: u32,
        height: u32,
    ) -> Result<(), GfxError>;

    /// Pixel size of `target`.
    fn target_size(&self, target: &Self::Target) -> (u32, u32);

    /// First color attachment of `target` as a sampleable texture.
    fn target_texture(&self, target: &Self::Target) -> Option<Self::Texture>;

    fn bind_vertex_array(&mut self, vertex_array: &Self::VertexArray);

    fn bind_program(&mut self, program: &Self::Program);

    fn bind_texture(&mut self, slot: u32, texture: &Self::Texture);

    /// Redirects draws into `target` and sets the viewport to its size.
    fn bind_target(&mut self, target: &Self::Target);

    /// Restores the default (window) target.
    fn unbind_target(&mut self);

    /// Clears the color of the bound target.
    fn clear(&mut self, color: PackedColor);

    /// Clears attachment `index` of `target`, whatever is bound.
    fn clear_attachment(
        &mut self,
        target: &Self::Target,
        index: usize,
        value: AttachmentClear,
    ) -> Result<(), GfxError>;

    /// Reads the texel at (`x`, `y`) of attachment `index`. `R32Uint` yields the
    /// stored value, `Rgba8` the color packed as `0xRRGGBBAA`.
    ///
    /// Blocks until the GPU has finished every submitted command.
    fn read_pixel(
        &mut self,
        target: &Self::Target,
        index: usize,
        x: u32,
        y: u32,
    ) -> Result<u32, GfxError>;

    /// Non-indexed draw of `count` vertices.
    fn draw(&mut self, topology: Topology, count: u32);

    /// Indexed draw of `count` indices from the bound vertex array's index buffer.
    fn draw_indexed(&mut self, topology: Topology, count: u32, index_type: IndexType);
}
