//! Mapping from backend-neutral enums to wgpu.

use crate::error::GfxError;
use crate::gfx::{
    DataType, LayoutElement, TextureFilter, TextureFormat, TextureWrap, Topology, VertexLayout,
};

/// Native vertex format for `element`.
///
/// wgpu has no 32-bit normalized formats and no integer-to-float conversion
/// for unnormalized integers, so those combinations are rejected.
pub(crate) fn vertex_format(element: &LayoutElement) -> Result<wgpu::VertexFormat, GfxError> {
    use wgpu::VertexFormat as F;

    let float = element.pass_as_float;
    let norm = element.normalized;
    let format = match (element.data_type, float, norm) {
        (DataType::F32, _, false) => Some(F::Float32),
        (DataType::F32x2, _, false) => Some(F::Float32x2),
        (DataType::F32x3, _, false) => Some(F::Float32x3),
        (DataType::F32x4, _, false) => Some(F::Float32x4),

        (DataType::S32, false, false) => Some(F::Sint32),
        (DataType::S32x2, false, false) => Some(F::Sint32x2),
        (DataType::S32x3, false, false) => Some(F::Sint32x3),
        (DataType::S32x4, false, false) => Some(F::Sint32x4),

        (DataType::U32, false, false) => Some(F::Uint32),
        (DataType::U32x2, false, false) => Some(F::Uint32x2),
        (DataType::U32x3, false, false) => Some(F::Uint32x3),
        (DataType::U32x4, false, false) => Some(F::Uint32x4),

        (DataType::U8x4, true, true) => Some(F::Unorm8x4),
        (DataType::U8x4, false, false) => Some(F::Uint8x4),
        (DataType::U16x2, true, true) => Some(F::Unorm16x2),
        (DataType::U16x2, false, false) => Some(F::Uint16x2),

        _ => None,
    };

    format.ok_or(GfxError::UnsupportedAttribute {
        data_type: element.data_type,
        pass_as_float: float,
        normalized: norm,
    })
}

/// Vertex attributes for `layout`, shader locations in declaration order.
pub(crate) fn vertex_attributes(
    layout: &VertexLayout,
) -> Result<Vec<wgpu::VertexAttribute>, GfxError> {
    if layout.is_empty() {
        return Err(GfxError::EmptyLayout);
    }
    layout
        .iter()
        .enumerate()
        .map(|(location, e)| {
            Ok(wgpu::VertexAttribute {
                format: vertex_format(e)?,
                offset: e.offset as u64,
                shader_location: location as u32,
            })
        })
        .collect()
}

pub(crate) fn topology(t: Topology) -> wgpu::PrimitiveTopology {
    match t {
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

pub(crate) fn texture_format(f: TextureFormat) -> wgpu::TextureFormat {
    match f {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::R32Uint => wgpu::TextureFormat::R32Uint,
        TextureFormat::Depth24Stencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

pub(crate) fn filter_mode(f: TextureFilter) -> wgpu::FilterMode {
    match f {
        TextureFilter::Linear => wgpu::FilterMode::Linear,
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
    }
}

pub(crate) fn address_mode(w: TextureWrap) -> wgpu::AddressMode {
    match w {
        TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
    }
}

/// Blending is only valid on float-renderable color formats.
pub(crate) fn is_blendable(format: wgpu::TextureFormat) -> bool {
    !matches!(
        format,
        wgpu::TextureFormat::R32Uint
            | wgpu::TextureFormat::R32Sint
            | wgpu::TextureFormat::Depth24PlusStencil8
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_types_map_directly() {
        let e = LayoutElement::new(DataType::F32x3);
        assert_eq!(vertex_format(&e).unwrap(), wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn normalized_color_bytes_map_to_unorm() {
        let e = LayoutElement::normalized(DataType::U8x4);
        assert_eq!(vertex_format(&e).unwrap(), wgpu::VertexFormat::Unorm8x4);
    }

    #[test]
    fn integer_types_map_to_integer_formats() {
        assert_eq!(
            vertex_format(&LayoutElement::new(DataType::S32x2)).unwrap(),
            wgpu::VertexFormat::Sint32x2
        );
        assert_eq!(
            vertex_format(&LayoutElement::new(DataType::U16x2)).unwrap(),
            wgpu::VertexFormat::Uint16x2
        );
    }

    #[test]
    fn inexpressible_combinations_fail() {
        // 32-bit integers cannot be normalized by the hardware.
        let e = LayoutElement::normalized(DataType::U32x4);
        assert!(matches!(
            vertex_format(&e),
            Err(GfxError::UnsupportedAttribute { data_type: DataType::U32x4, .. })
        ));

        let e = LayoutElement::new(DataType::S32).as_float();
        assert!(vertex_format(&e).is_err());

        let mut e = LayoutElement::new(DataType::F32);
        e.normalized = true;
        assert!(vertex_format(&e).is_err());
    }

    #[test]
    fn every_data_type_has_a_native_mapping() {
        for t in DataType::ALL {
            let plain = vertex_format(&LayoutElement::new(t));
            let norm = vertex_format(&LayoutElement::normalized(t));
            assert!(plain.is_ok() || norm.is_ok(), "{t:?} has no mapping");
        }
    }

    #[test]
    fn attributes_use_declaration_order() {
        let layout = VertexLayout::new([
            LayoutElement::new(DataType::F32x2),
            LayoutElement::normalized(DataType::U8x4),
        ]);
        let attrs = vertex_attributes(&layout).unwrap();
        assert_eq!(attrs[0].shader_location, 0);
        assert_eq!(attrs[1].shader_location, 1);
        assert_eq!(attrs[1].offset, 8);
        assert_eq!(attrs[1].format.size(), 4);
    }
}
