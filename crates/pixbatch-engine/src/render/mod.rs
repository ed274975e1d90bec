//! Batch renderer.
//!
//! Primitives are given in canvas pixels (top-left origin, +Y down) and
//! converted to NDC on submission. Each kind (points, lines, textured quads)
//! fills its own fixed-capacity batch; a batch is drawn with one call when it
//! fills up or when the frame ends.
//!
//! The renderer is generic over [`GraphicsBackend`](crate::gfx::GraphicsBackend)
//! and owns the backend it draws through.

mod batch;
mod renderer;
mod stats;
mod vertex;

pub use batch::{Batch, INDICES_PER_QUAD, QuadIndices, VERTICES_PER_QUAD};
pub use renderer::{BatchKind, Renderer};
pub use stats::{BatchStats, FrameStats};
pub use vertex::{PointVertex, QuadVertex};
