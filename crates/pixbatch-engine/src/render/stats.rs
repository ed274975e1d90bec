use super::renderer::BatchKind;

/// Work done by one batch kind during a frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub draw_calls: u32,
    /// Points, lines or quads drawn.
    pub primitives: u32,
    pub bytes_uploaded: u64,
}

/// Per-frame totals returned by `Renderer::end_frame`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub points: BatchStats,
    pub lines: BatchStats,
    pub quads: BatchStats,
}

impl FrameStats {
    pub fn kind(&self, kind: BatchKind) -> &BatchStats {
        match kind {
            BatchKind::Points => &self.points,
            BatchKind::Lines => &self.lines,
            BatchKind::Quads => &self.quads,
        }
    }

    pub(crate) fn kind_mut(&mut self, kind: BatchKind) -> &mut BatchStats {
        match kind {
            BatchKind::Points => &mut self.points,
            BatchKind::Lines => &mut self.lines,
            BatchKind::Quads => &mut self.quads,
        }
    }

    pub fn draw_calls(&self) -> u32 {
        self.points.draw_calls + self.lines.draw_calls + self.quads.draw_calls
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.points.bytes_uploaded + self.lines.bytes_uploaded + self.quads.bytes_uploaded
    }
}
