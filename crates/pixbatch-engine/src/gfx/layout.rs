//! Vertex attribute layouts.
//!
//! `DataType::info` is the single source for per-type size and component
//! count. Backends translate a `LayoutElement` into their native vertex format
//! and must reject combinations they cannot express instead of guessing.

/// Scalar component type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    F32,
    S32,
    U8,
    U16,
    U32,
}

impl ScalarKind {
    /// Size of one component in bytes.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            ScalarKind::U8 => 1,
            ScalarKind::U16 => 2,
            ScalarKind::F32 | ScalarKind::S32 | ScalarKind::U32 => 4,
        }
    }
}

/// Attribute data type as stored in the vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DataType {
    F32,
    F32x2,
    F32x3,
    F32x4,
    S32,
    S32x2,
    S32x3,
    S32x4,
    U8x4,
    U16x2,
    U32,
    U32x2,
    U32x3,
    U32x4,
}

/// Static description of a [`DataType`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DataTypeInfo {
    pub scalar: ScalarKind,
    pub components: u32,
}

impl DataTypeInfo {
    #[inline]
    pub const fn size(self) -> u32 {
        self.scalar.size() * self.components
    }
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        DataType::F32,
        DataType::F32x2,
        DataType::F32x3,
        DataType::F32x4,
        DataType::S32,
        DataType::S32x2,
        DataType::S32x3,
        DataType::S32x4,
        DataType::U8x4,
        DataType::U16x2,
        DataType::U32,
        DataType::U32x2,
        DataType::U32x3,
        DataType::U32x4,
    ];

    pub const fn info(self) -> DataTypeInfo {
        let (scalar, components) = match self {
            DataType::F32 => (ScalarKind::F32, 1),
            DataType::F32x2 => (ScalarKind::F32, 2),
            DataType::F32x3 => (ScalarKind::F32, 3),
            DataType::F32x4 => (ScalarKind::F32, 4),
            DataType::S32 => (ScalarKind::S32, 1),
            DataType::S32x2 => (ScalarKind::S32, 2),
            DataType::S32x3 => (ScalarKind::S32, 3),
            DataType::S32x4 => (ScalarKind::S32, 4),
            DataType::U8x4 => (ScalarKind::U8, 4),
            DataType::U16x2 => (ScalarKind::U16, 2),
            DataType::U32 => (ScalarKind::U32, 1),
            DataType::U32x2 => (ScalarKind::U32, 2),
            DataType::U32x3 => (ScalarKind::U32, 3),
            DataType::U32x4 => (ScalarKind::U32, 4),
        };
        DataTypeInfo { scalar, components }
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.info().size()
    }

    #[inline]
    pub const fn components(self) -> u32 {
        self.info().components
    }

    #[inline]
    pub const fn scalar(self) -> ScalarKind {
        self.info().scalar
    }
}

/// How the shader sees an attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeKind {
    Float,
    Sint,
    Uint,
}

/// One attribute in a [`VertexLayout`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LayoutElement {
    pub data_type: DataType,
    /// Integer data is converted to floating point when read by the shader.
    pub pass_as_float: bool,
    /// Integer data is mapped to `[0, 1]` (or `[-1, 1]`) when converted.
    pub normalized: bool,
    /// Byte offset inside the vertex record. Assigned by [`VertexLayout::new`].
    pub offset: u32,
}

impl LayoutElement {
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            pass_as_float: false,
            normalized: false,
            offset: 0,
        }
    }

    /// Integer attribute read as float and normalized (e.g. packed RGBA8 colors).
    pub const fn normalized(data_type: DataType) -> Self {
        Self {
            data_type,
            pass_as_float: true,
            normalized: true,
            offset: 0,
        }
    }

    pub const fn as_float(mut self) -> Self {
        self.pass_as_float = true;
        self
    }

    #[inline]
    pub const fn size(&self) -> u32 {
        self.data_type.size()
    }

    pub fn kind(&self) -> AttributeKind {
        match self.data_type.scalar() {
            ScalarKind::F32 => AttributeKind::Float,
            _ if self.pass_as_float => AttributeKind::Float,
            ScalarKind::S32 => AttributeKind::Sint,
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 => AttributeKind::Uint,
        }
    }
}

/// Ordered attribute list with packed offsets.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    elements: Vec<LayoutElement>,
    stride: u32,
}

impl VertexLayout {
    /// Builds a layout, assigning offsets in declaration order with no padding.
    pub fn new(elements: impl IntoIterator<Item = LayoutElement>) -> Self {
        let mut stride = 0u32;
        let elements = elements
            .into_iter()
            .map(|mut e| {
                e.offset = stride;
                stride += e.size();
                e
            })
            .collect();
        Self { elements, stride }
    }

    #[inline]
    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutElement> {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_scalar_times_components() {
        for t in DataType::ALL {
            let info = t.info();
            assert_eq!(t.size(), info.scalar.size() * info.components, "{t:?}");
        }
        assert_eq!(DataType::F32x3.size(), 12);
        assert_eq!(DataType::U8x4.size(), 4);
        assert_eq!(DataType::U16x2.size(), 4);
        assert_eq!(DataType::S32x4.size(), 16);
    }

    #[test]
    fn layout_assigns_packed_offsets() {
        let layout = VertexLayout::new([
            LayoutElement::new(DataType::F32x2),
            LayoutElement::normalized(DataType::U8x4),
            LayoutElement::new(DataType::U32),
        ]);
        let offsets: Vec<u32> = layout.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 8, 12]);
        assert_eq!(layout.stride(), 16);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let layout = VertexLayout::new([]);
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn attribute_kind() {
        assert_eq!(LayoutElement::new(DataType::F32x2).kind(), AttributeKind::Float);
        assert_eq!(LayoutElement::new(DataType::S32).kind(), AttributeKind::Sint);
        assert_eq!(LayoutElement::new(DataType::U16x2).kind(), AttributeKind::Uint);
        assert_eq!(LayoutElement::normalized(DataType::U8x4).kind(), AttributeKind::Float);
        assert_eq!(LayoutElement::new(DataType::U32).as_float().kind(), AttributeKind::Float);
    }
}
