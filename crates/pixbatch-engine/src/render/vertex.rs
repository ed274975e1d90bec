//! Vertex records written into the batches.

use bytemuck::{Pod, Zeroable};

use crate::gfx::{DataType, LayoutElement, VertexLayout};
use crate::paint::PackedColor;

// ── point / line vertex ───────────────────────────────────────────────────

/// Position in NDC plus a packed RGBA color. Shared by points and lines.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 2],
    /// `0xRRGGBBAA` as bytes in R, G, B, A order.
    pub color: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<PointVertex>() == 12);

impl PointVertex {
    #[inline]
    pub fn new(position: [f32; 2], color: PackedColor) -> Self {
        Self {
            position,
            color: color.to_rgba8(),
        }
    }

    #[inline]
    pub fn packed_color(&self) -> PackedColor {
        PackedColor::from_rgba8(self.color[0], self.color[1], self.color[2], self.color[3])
    }

    pub fn layout() -> VertexLayout {
        VertexLayout::new([
            LayoutElement::new(DataType::F32x2),
            LayoutElement::normalized(DataType::U8x4),
        ])
    }
}

// ── quad vertex ───────────────────────────────────────────────────────────

/// Position in NDC plus a texture coordinate (bottom-left UV origin).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<QuadVertex>() == 16);

impl QuadVertex {
    #[inline]
    pub const fn new(position: [f32; 2], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    pub fn layout() -> VertexLayout {
        VertexLayout::new([
            LayoutElement::new(DataType::F32x2),
            LayoutElement::new(DataType::F32x2),
        ])
    }
}
