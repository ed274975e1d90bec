//! Fixed-capacity vertex accumulator and the shared quad index template.

use bytemuck::Pod;

use crate::error::GfxError;
use crate::gfx::{IndexData, IndexType};

/// Client-side vertex storage for one primitive kind.
///
/// The write cursor is `len()`; it never exceeds `capacity()`. The backing
/// allocation is made once and reused for every batch.
#[derive(Debug)]
pub struct Batch<V> {
    vertices: Vec<V>,
    capacity: usize,
}

impl<V: Pod> Batch<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Resets the write cursor.
    #[inline]
    pub fn begin(&mut self) {
        self.vertices.clear();
    }

    /// Whether `count` more vertices fit before the batch is full.
    #[inline]
    pub fn fits(&self, count: usize) -> bool {
        self.vertices.len() + count <= self.capacity
    }

    /// Appends `vertices` at the cursor. The caller flushes first if they do not fit.
    #[inline]
    pub fn extend(&mut self, vertices: &[V]) {
        debug_assert!(self.fits(vertices.len()), "batch overflow");
        self.vertices.extend_from_slice(vertices);
    }

    #[inline]
    pub fn push(&mut self, vertex: V) {
        self.extend(std::slice::from_ref(&vertex));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    /// Bytes written since the last `begin`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<V>()
    }

    /// Capacity in bytes, used to size the GPU buffer.
    #[inline]
    pub fn byte_capacity(&self) -> usize {
        self.capacity * std::mem::size_of::<V>()
    }
}

// ── quad indices ──────────────────────────────────────────────────────────

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Two triangles per quad: `0, 1, 2` and `2, 3, 0`.
const QUAD_PATTERN: [u32; INDICES_PER_QUAD] = [0, 1, 2, 2, 3, 0];

/// Precomputed index sequence for every quad slot of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl QuadIndices {
    /// Builds indices for `max_quads` quads with the narrowest type that can
    /// address `4 * max_quads` vertices.
    pub fn new(max_quads: usize) -> Result<Self, GfxError> {
        let vertices = max_quads as u64 * VERTICES_PER_QUAD as u64;
        let quad_indices = |base: u64| QUAD_PATTERN.map(|o| base + o as u64);

        if vertices <= u16::MAX as u64 + 1 {
            Ok(Self::U16(
                (0..max_quads as u64)
                    .flat_map(|q| quad_indices(q * 4).map(|i| i as u16))
                    .collect(),
            ))
        } else if vertices <= u32::MAX as u64 + 1 {
            Ok(Self::U32(
                (0..max_quads as u64)
                    .flat_map(|q| quad_indices(q * 4).map(|i| i as u32))
                    .collect(),
            ))
        } else {
            Err(GfxError::IndexRange {
                quads: max_quads,
                vertices,
            })
        }
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            Self::U16(_) => IndexType::U16,
            Self::U32(_) => IndexType::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index at `i` widened to `u32`.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(v) => v.get(i).map(|&x| x as u32),
            Self::U32(v) => v.get(i).copied(),
        }
    }

    pub fn as_index_data(&self) -> IndexData<'_> {
        match self {
            Self::U16(v) => IndexData::U16(v),
            Self::U32(v) => IndexData::U32(v),
        }
    }
}
