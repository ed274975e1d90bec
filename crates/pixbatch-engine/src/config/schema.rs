use serde::Deserialize;

use crate::coords::Extent;

/// Sizes of the logical canvas, the sprite atlas and the per-kind batches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Logical canvas that primitive coordinates are given in.
    pub canvas: Extent,
    /// Atlas size used to normalize sprite source rectangles.
    pub atlas: Extent,
    /// Edge length of one atlas cell for `draw_sprite`.
    pub sprite_size: u32,
    /// Point batch capacity in vertices.
    pub max_points: usize,
    /// Line batch capacity in vertices (two per line).
    pub max_line_vertices: usize,
    /// Quad batch capacity in quads (four vertices, six indices each).
    pub max_quads: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            canvas: Extent::new(256, 256),
            atlas: Extent::new(128, 192),
            sprite_size: 8,
            max_points: 10_000,
            max_line_vertices: 10_000,
            max_quads: 2_000,
        }
    }
}

impl RendererConfig {
    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas = Extent::new(width, height);
        self
    }

    pub fn with_atlas(mut self, width: u32, height: u32) -> Self {
        self.atlas = Extent::new(width, height);
        self
    }

    pub fn with_capacities(mut self, points: usize, line_vertices: usize, quads: usize) -> Self {
        self.max_points = points;
        self.max_line_vertices = line_vertices;
        self.max_quads = quads;
        self
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, crate::error::ConfigError> {
        super::from_toml_str(text)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load_from_path(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::error::ConfigError> {
        super::load_from_path(path.as_ref())
    }

    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        super::validate(self)
    }
}
