//! Graphics collaborator layer.
//!
//! The batch renderer talks to the GPU only through [`GraphicsBackend`], an
//! immediate-mode bind-then-draw interface. Two implementations ship:
//! - [`WgpuBackend`]: the real one, on wgpu
//! - [`recording::RecordingBackend`]: headless, records calls for tests and tooling
//!
//! Vertex layouts are described once here ([`DataType`], [`VertexLayout`]) and
//! converted per backend; conversion fails instead of guessing.

mod backend;
mod layout;
pub mod recording;
mod types;
mod wgpu_backend;

pub use backend::GraphicsBackend;
pub use layout::{AttributeKind, DataType, DataTypeInfo, LayoutElement, ScalarKind, VertexLayout};
pub use types::{
    AttachmentClear, IndexData, IndexType, ShaderSource, TargetDesc, TextureDesc, TextureFilter,
    TextureFormat, TextureSpec, TextureWrap, Topology,
};
pub use wgpu_backend::{
    WgpuBackend, WgpuBuffer, WgpuIndexBuffer, WgpuProgram, WgpuTarget, WgpuTexture,
    WgpuVertexArray,
};
