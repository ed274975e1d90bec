//! Coordinate spaces used by the batch renderer.
//!
//! Input space:
//! - Integer pixels on a fixed logical canvas
//! - Origin top-left
//! - +X right, +Y down
//!
//! Geometry is converted to NDC on the CPU before it is written to a batch,
//! so the shaders receive clip-space positions directly.

mod extent;
mod rect;
mod space;

pub use extent::Extent;
pub use rect::{AtlasRect, PixelRect};
pub use space::{AtlasSpace, CanvasSpace};
