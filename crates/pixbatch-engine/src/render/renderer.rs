use crate::config::RendererConfig;
use crate::coords::{AtlasRect, AtlasSpace, CanvasSpace, Extent, PixelRect};
use crate::error::{FrameError, GfxError};
use crate::gfx::{GraphicsBackend, IndexType, ShaderSource, Topology};
use crate::paint::PackedColor;

use super::batch::{Batch, INDICES_PER_QUAD, QuadIndices, VERTICES_PER_QUAD};
use super::stats::{BatchStats, FrameStats};
use super::vertex::{PointVertex, QuadVertex};

const POINT_SHADER: &str = include_str!("shaders/point.wgsl");
const QUAD_SHADER: &str = include_str!("shaders/quad.wgsl");

/// Primitive kinds with their own batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BatchKind {
    Points,
    Lines,
    Quads,
}

impl BatchKind {
    /// Order in which `end_frame` flushes. Quads go last so sprites cover overlays.
    pub const FLUSH_ORDER: [BatchKind; 3] = [BatchKind::Points, BatchKind::Lines, BatchKind::Quads];

    pub fn topology(self) -> Topology {
        match self {
            BatchKind::Points => Topology::Points,
            BatchKind::Lines => Topology::Lines,
            BatchKind::Quads => Topology::Triangles,
        }
    }
}

/// One batch plus its GPU mirror.
struct Lane<B: GraphicsBackend, V> {
    batch: Batch<V>,
    vertex_array: B::VertexArray,
    buffer: B::Buffer,
}

#[derive(Debug, Copy, Clone)]
struct ActiveFrame {
    redirected: bool,
}

/// Immediate-mode point, line and sprite renderer.
///
/// Primitives are accumulated per kind into fixed-capacity batches and drawn
/// with one call per batch. A batch that would overflow is flushed and
/// restarted transparently.
///
/// ```ignore
/// renderer.begin_frame(None)?;
/// renderer.draw_point(10, 10, PackedColor::WHITE);
/// renderer.draw_sprite(32.0, 32.0, 0, 8);
/// let stats = renderer.end_frame()?;
/// ```
pub struct Renderer<B: GraphicsBackend> {
    points: Lane<B, PointVertex>,
    lines: Lane<B, PointVertex>,
    quads: Lane<B, QuadVertex>,
    quad_indices: B::IndexBuffer,
    quad_index_type: IndexType,

    point_program: B::Program,
    quad_program: B::Program,
    atlas: Option<B::Texture>,

    canvas: CanvasSpace,
    atlas_space: AtlasSpace,
    sprite_size: u32,

    frame: Option<ActiveFrame>,
    stats: FrameStats,
    last_stats: FrameStats,

    // Dropped last: the handles above release through it.
    backend: B,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Validates `config` and allocates every batch, GPU buffer and program.
    pub fn new(mut backend: B, config: &RendererConfig) -> Result<Self, GfxError> {
        config.validate()?;

        let point_program = backend.create_program(&ShaderSource::wgsl("pixbatch point", POINT_SHADER))?;
        let quad_program = backend
            .create_program(&ShaderSource::wgsl("pixbatch quad", QUAD_SHADER).with_texture())?;

        let points = Self::lane::<PointVertex>(
            &mut backend,
            "pixbatch points",
            config.max_points,
            &PointVertex::layout(),
            None,
        )?;
        let lines = Self::lane::<PointVertex>(
            &mut backend,
            "pixbatch lines",
            config.max_line_vertices,
            &PointVertex::layout(),
            None,
        )?;

        let template = QuadIndices::new(config.max_quads)?;
        let quad_indices = backend.create_index_buffer("pixbatch quad indices", template.as_index_data());
        let quads = Self::lane::<QuadVertex>(
            &mut backend,
            "pixbatch quads",
            config.max_quads * VERTICES_PER_QUAD,
            &QuadVertex::layout(),
            Some(&quad_indices),
        )?;

        log::info!(
            "renderer ready: canvas {}x{}, atlas {}x{}, capacity {} points / {} line vertices / {} quads ({:?} indices)",
            config.canvas.width,
            config.canvas.height,
            config.atlas.width,
            config.atlas.height,
            config.max_points,
            config.max_line_vertices,
            config.max_quads,
            template.index_type(),
        );

        Ok(Self {
            points,
            lines,
            quads,
            quad_indices,
            quad_index_type: template.index_type(),
            point_program,
            quad_program,
            atlas: None,
            canvas: CanvasSpace::new(config.canvas),
            atlas_space: AtlasSpace::new(config.atlas),
            sprite_size: config.sprite_size,
            frame: None,
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
            backend,
        })
    }

    fn lane<V: bytemuck::Pod>(
        backend: &mut B,
        label: &str,
        capacity: usize,
        layout: &crate::gfx::VertexLayout,
        indices: Option<&B::IndexBuffer>,
    ) -> Result<Lane<B, V>, GfxError> {
        let batch = Batch::with_capacity(capacity);
        let buffer = backend.create_vertex_buffer(label, batch.byte_capacity());
        let vertex_array = backend.create_vertex_array(&buffer, layout, indices)?;
        Ok(Lane {
            batch,
            vertex_array,
            buffer,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn canvas(&self) -> &CanvasSpace {
        &self.canvas
    }

    pub fn is_in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Statistics of the last completed frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn quad_index_type(&self) -> IndexType {
        self.quad_index_type
    }

    /// Index buffer shared by every quad batch.
    pub fn quad_index_buffer(&self) -> &B::IndexBuffer {
        &self.quad_indices
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame drawing into `target`, or into the default target.
    pub fn begin_frame(&mut self, target: Option<&B::Target>) -> Result<(), FrameError> {
        if self.frame.is_some() {
            return Err(FrameError::AlreadyInFrame);
        }

        match target {
            Some(t) => self.backend.bind_target(t),
            None => self.backend.unbind_target(),
        }

        for kind in BatchKind::FLUSH_ORDER {
            self.begin_batch(kind);
        }
        self.stats = FrameStats::default();
        self.frame = Some(ActiveFrame {
            redirected: target.is_some(),
        });
        Ok(())
    }

    /// Flushes every batch (points, lines, quads) and restores the default target.
    pub fn end_frame(&mut self) -> Result<FrameStats, FrameError> {
        let Some(frame) = self.frame else {
            return Err(FrameError::NotInFrame);
        };

        for kind in BatchKind::FLUSH_ORDER {
            self.end_batch(kind);
        }
        if frame.redirected {
            self.backend.unbind_target();
        }
        self.frame = None;

        let stats = self.stats;
        log::trace!(
            "frame: {} draws, {} bytes | points {} | lines {} | quads {}",
            stats.draw_calls(),
            stats.bytes_uploaded(),
            stats.points.primitives,
            stats.lines.primitives,
            stats.quads.primitives,
        );
        self.last_stats = stats;
        Ok(stats)
    }

    // ── batches ───────────────────────────────────────────────────────────

    /// Resets the write cursor of `kind`. No GPU work.
    pub fn begin_batch(&mut self, kind: BatchKind) {
        match kind {
            BatchKind::Points => self.points.batch.begin(),
            BatchKind::Lines => self.lines.batch.begin(),
            BatchKind::Quads => self.quads.batch.begin(),
        }
    }

    /// Uploads the written range of `kind` and draws it. Empty batches are skipped.
    ///
    /// The cursor is left in place; `begin_batch` resets it.
    pub fn end_batch(&mut self, kind: BatchKind) {
        let backend = &mut self.backend;
        let (bytes, draw_count, primitives) = match kind {
            BatchKind::Points => {
                let lane = &self.points;
                if lane.batch.is_empty() {
                    return;
                }
                backend.write_buffer(&lane.buffer, 0, lane.batch.as_bytes());
                backend.bind_vertex_array(&lane.vertex_array);
                backend.bind_program(&self.point_program);
                let n = lane.batch.len() as u32;
                backend.draw(Topology::Points, n);
                (lane.batch.byte_len(), n, n)
            }
            BatchKind::Lines => {
                let lane = &self.lines;
                if lane.batch.is_empty() {
                    return;
                }
                backend.write_buffer(&lane.buffer, 0, lane.batch.as_bytes());
                backend.bind_vertex_array(&lane.vertex_array);
                backend.bind_program(&self.point_program);
                let n = lane.batch.len() as u32;
                backend.draw(Topology::Lines, n);
                (lane.batch.byte_len(), n, n / 2)
            }
            BatchKind::Quads => {
                let lane = &self.quads;
                if lane.batch.is_empty() {
                    return;
                }
                backend.write_buffer(&lane.buffer, 0, lane.batch.as_bytes());
                backend.bind_vertex_array(&lane.vertex_array);
                backend.bind_program(&self.quad_program);
                if let Some(atlas) = &self.atlas {
                    backend.bind_texture(0, atlas);
                }
                let quads = lane.batch.len() / VERTICES_PER_QUAD;
                // Validated config keeps this within u32.
                let indices = (quads * INDICES_PER_QUAD) as u32;
                backend.draw_indexed(Topology::Triangles, indices, self.quad_index_type);
                (lane.batch.byte_len(), indices, quads as u32)
            }
        };

        log::trace!("flush {kind:?}: {draw_count} elements, {bytes} bytes");
        let s: &mut BatchStats = self.stats.kind_mut(kind);
        s.draw_calls += 1;
        s.primitives += primitives;
        s.bytes_uploaded += bytes as u64;
    }

    fn flush_and_restart(&mut self, kind: BatchKind) {
        self.end_batch(kind);
        self.begin_batch(kind);
    }

    // ── raw submission ────────────────────────────────────────────────────

    /// Appends one point vertex (NDC position).
    pub fn submit_point(&mut self, vertex: PointVertex) {
        debug_assert!(self.frame.is_some(), "submit_point outside of a frame");
        if !self.points.batch.fits(1) {
            self.flush_and_restart(BatchKind::Points);
        }
        self.points.batch.push(vertex);
    }

    /// Appends one line segment. Both ends always land in the same batch.
    pub fn submit_line(&mut self, a: PointVertex, b: PointVertex) {
        debug_assert!(self.frame.is_some(), "submit_line outside of a frame");
        if !self.lines.batch.fits(2) {
            self.flush_and_restart(BatchKind::Lines);
        }
        self.lines.batch.extend(&[a, b]);
    }

    /// Appends one quad in template order: bottom-left, bottom-right, top-right, top-left.
    pub fn submit_quad(&mut self, vertices: [QuadVertex; 4]) {
        debug_assert!(self.frame.is_some(), "submit_quad outside of a frame");
        if !self.quads.batch.fits(VERTICES_PER_QUAD) {
            self.flush_and_restart(BatchKind::Quads);
        }
        self.quads.batch.extend(&vertices);
    }

    // ── pixel-space helpers ───────────────────────────────────────────────

    pub fn draw_point(&mut self, x: u16, y: u16, color: PackedColor) {
        let p = self.canvas.to_ndc(x as f32, y as f32);
        self.submit_point(PointVertex::new(p, color));
    }

    pub fn draw_line(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, color: PackedColor) {
        let a = self.canvas.to_ndc(x0 as f32, y0 as f32);
        let b = self.canvas.to_ndc(x1 as f32, y1 as f32);
        self.submit_line(PointVertex::new(a, color), PointVertex::new(b, color));
    }

    /// Draws the atlas cell whose top-left pixel is (`u`, `v`) at canvas (`x`, `y`).
    pub fn draw_sprite(&mut self, x: f32, y: f32, u: u16, v: u16) {
        let size = self.sprite_size;
        let dst = PixelRect::from_xywh(x, y, size as f32, size as f32);
        self.draw_texture(dst, AtlasRect::cell(u, v, size));
    }

    /// Draws the atlas region `src` stretched over `dst`.
    pub fn draw_texture(&mut self, dst: PixelRect, src: AtlasRect) {
        self.submit_quad(self.quad_vertices(dst, src));
    }

    fn quad_vertices(&self, dst: PixelRect, src: AtlasRect) -> [QuadVertex; 4] {
        let [l, t] = self.canvas.to_ndc(dst.left, dst.top);
        let [r, b] = self.canvas.to_ndc(dst.right, dst.bottom);
        let [u0, v_top] = self.atlas_space.to_uv(src.u0, src.v0);
        let [u1, v_bottom] = self.atlas_space.to_uv(src.u1, src.v1);
        [
            QuadVertex::new([l, b], [u0, v_bottom]),
            QuadVertex::new([r, b], [u1, v_bottom]),
            QuadVertex::new([r, t], [u1, v_top]),
            QuadVertex::new([l, t], [u0, v_top]),
        ]
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// Selects the texture sampled by quads. Pending quads are drawn with the previous one.
    pub fn set_atlas(&mut self, atlas: Option<B::Texture>) {
        self.flush_pending_quads();
        self.atlas = atlas;
    }

    /// Changes the pixel size source rectangles are normalized against.
    pub fn set_atlas_size(&mut self, size: Extent) {
        self.flush_pending_quads();
        self.atlas_space = AtlasSpace::new(size);
    }

    pub fn atlas(&self) -> Option<&B::Texture> {
        self.atlas.as_ref()
    }

    fn flush_pending_quads(&mut self) {
        if self.frame.is_some() && !self.quads.batch.is_empty() {
            self.flush_and_restart(BatchKind::Quads);
        }
    }

    /// Clears the currently bound target.
    pub fn clear(&mut self, color: PackedColor) {
        self.backend.clear(color);
    }

    /// Vertices written to `kind` since its last `begin_batch`.
    pub fn pending(&self, kind: BatchKind) -> usize {
        match kind {
            BatchKind::Points => self.points.batch.len(),
            BatchKind::Lines => self.lines.batch.len(),
            BatchKind::Quads => self.quads.batch.len(),
        }
    }

    /// Capacity of `kind` in vertices.
    pub fn capacity(&self, kind: BatchKind) -> usize {
        match kind {
            BatchKind::Points => self.points.batch.capacity(),
            BatchKind::Lines => self.lines.batch.capacity(),
            BatchKind::Quads => self.quads.batch.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::gfx::recording::{Call, RecordingBackend};
    use crate::gfx::{TargetDesc, TextureDesc};

    fn renderer(points: usize, line_vertices: usize, quads: usize) -> Renderer<RecordingBackend> {
        let cfg = RendererConfig::default().with_capacities(points, line_vertices, quads);
        Renderer::new(RecordingBackend::new(), &cfg).unwrap()
    }

    fn decode_points(bytes: &[u8]) -> Vec<PointVertex> {
        bytemuck::pod_collect_to_vec(bytes)
    }

    fn draw_counts(r: &Renderer<RecordingBackend>) -> Vec<u32> {
        r.backend().draws().iter().map(|d| d.count).collect()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn buffers_are_sized_from_config() {
        let r = renderer(5, 6, 3);
        assert_eq!(r.points.buffer.capacity, 5 * 12);
        assert_eq!(r.lines.buffer.capacity, 6 * 12);
        assert_eq!(r.quads.buffer.capacity, 3 * 4 * 16);
        assert_eq!(r.quad_indices.count, 18);
        assert_eq!(r.quad_index_type(), IndexType::U16);
        assert_eq!(r.quads.vertex_array.index_buffer, Some(r.quad_indices.id));
        assert!(r.backend().draws().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = RendererConfig::default().with_capacities(0, 2, 1);
        let err = Renderer::new(RecordingBackend::new(), &cfg).err();
        assert!(matches!(err, Some(GfxError::Config(_))));
    }

    // ── frame bracket ─────────────────────────────────────────────────────

    #[test]
    fn frame_misuse_is_reported() {
        let mut r = renderer(4, 4, 4);
        assert_eq!(r.end_frame().unwrap_err(), FrameError::NotInFrame);
        r.begin_frame(None).unwrap();
        assert_eq!(r.begin_frame(None).unwrap_err(), FrameError::AlreadyInFrame);
        assert!(r.is_in_frame());
        r.end_frame().unwrap();
        assert!(!r.is_in_frame());
    }

    #[test]
    fn empty_frame_issues_no_draws() {
        let mut r = renderer(4, 4, 4);
        r.begin_frame(None).unwrap();
        let stats = r.end_frame().unwrap();
        assert!(r.backend().draws().is_empty());
        assert_eq!(stats.draw_calls(), 0);
    }

    #[test]
    fn empty_batch_end_is_a_no_op() {
        let mut r = renderer(4, 4, 4);
        r.begin_frame(None).unwrap();
        for kind in BatchKind::FLUSH_ORDER {
            r.begin_batch(kind);
            r.end_batch(kind);
        }
        assert!(r.backend().draws().is_empty());
        assert!(!r.backend().calls().iter().any(|c| matches!(c, Call::WriteBuffer { .. })));
    }

    #[test]
    fn end_frame_flushes_points_lines_then_quads() {
        let mut r = renderer(8, 8, 8);
        r.begin_frame(None).unwrap();
        r.draw_sprite(0.0, 0.0, 0, 0);
        r.draw_line(0, 0, 5, 5, PackedColor::WHITE);
        r.draw_point(1, 1, PackedColor::WHITE);
        r.end_frame().unwrap();

        let topologies: Vec<Topology> = r.backend().draws().iter().map(|d| d.topology).collect();
        assert_eq!(topologies, vec![Topology::Points, Topology::Lines, Topology::Triangles]);
    }

    #[test]
    fn clear_targets_the_bound_offscreen_target() {
        let mut r = renderer(4, 4, 4);
        let target = r
            .backend_mut()
            .create_target(&TargetDesc::color("offscreen", 4, 4))
            .unwrap();
        let color = PackedColor::new(0x1D2B53FF);

        r.begin_frame(Some(&target)).unwrap();
        r.clear(color);
        r.end_frame().unwrap();

        let calls = r.backend().calls();
        let bind = calls.iter().position(|c| *c == Call::BindTarget(target.id));
        let clear = calls.iter().position(|c| *c == Call::Clear(color));
        assert!(matches!((bind, clear), (Some(b), Some(c)) if b < c));
        assert_eq!(r.backend_mut().read_pixel(&target, 0, 2, 3).unwrap(), color.0);
    }

    #[test]
    fn offscreen_frame_binds_and_restores_target() {
        let mut r = renderer(4, 4, 4);
        let target = r
            .backend_mut()
            .create_target(&TargetDesc::color("offscreen", 64, 32))
            .unwrap();

        r.begin_frame(Some(&target)).unwrap();
        r.draw_point(3, 3, PackedColor::WHITE);
        r.end_frame().unwrap();

        let draw = &r.backend().draws()[0];
        assert_eq!(draw.target, Some(target.id));
        assert_eq!(draw.viewport, Some((64, 32)));
        assert_eq!(r.backend().calls().last(), Some(&Call::UnbindTarget));

        r.begin_frame(None).unwrap();
        r.draw_point(3, 3, PackedColor::WHITE);
        r.end_frame().unwrap();
        assert_eq!(r.backend().draws()[1].target, None);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn draw_count_is_ceil_of_submissions_over_capacity() {
        for (capacity, submissions) in [(1usize, 1usize), (3, 7), (4, 8), (5, 3), (2, 9)] {
            let mut r = renderer(capacity, 2, 1);
            r.begin_frame(None).unwrap();
            for i in 0..submissions {
                r.draw_point(i as u16, 0, PackedColor::WHITE);
            }
            r.end_frame().unwrap();

            let counts = draw_counts(&r);
            assert_eq!(counts.len(), submissions.div_ceil(capacity));
            assert_eq!(counts.iter().sum::<u32>() as usize, submissions);
            assert!(counts.iter().all(|&c| c as usize <= capacity));
        }
    }

    #[test]
    fn each_flush_uploads_exactly_the_written_range() {
        let mut r = renderer(3, 2, 1);
        r.begin_frame(None).unwrap();
        for i in 0..5 {
            r.draw_point(i, i, PackedColor::WHITE);
        }
        r.end_frame().unwrap();

        let lens: Vec<usize> = r.backend().uploads_to(r.points.buffer.id).iter().map(|b| b.len()).collect();
        assert_eq!(lens, vec![36, 24]);
    }

    #[test]
    fn lines_are_never_split() {
        let mut r = renderer(1, 4, 1);
        r.begin_frame(None).unwrap();
        for i in 0..5 {
            r.draw_line(0, i, 10, i, PackedColor::BLACK);
        }
        let stats = r.end_frame().unwrap();

        assert_eq!(draw_counts(&r), vec![4, 4, 2]);
        assert_eq!(stats.lines.primitives, 5);
        assert_eq!(stats.lines.draw_calls, 3);
    }

    #[test]
    fn quads_are_counted_in_indices() {
        let mut r = renderer(1, 2, 2);
        r.begin_frame(None).unwrap();
        for i in 0..5 {
            r.draw_sprite(i as f32 * 8.0, 0.0, 0, 0);
        }
        let stats = r.end_frame().unwrap();

        let draws = r.backend().draws();
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|d| d.indexed == Some(IndexType::U16)));
        assert_eq!(draw_counts(&r), vec![12, 12, 6]);
        assert_eq!(stats.quads.primitives, 5);
        assert_eq!(stats.quads.bytes_uploaded, 5 * 4 * 16);
    }

    #[test]
    fn kinds_do_not_share_cursors() {
        let mut r = renderer(2, 4, 1);
        r.begin_frame(None).unwrap();
        r.draw_point(0, 0, PackedColor::WHITE);
        r.draw_line(0, 0, 1, 1, PackedColor::WHITE);
        r.draw_sprite(0.0, 0.0, 0, 0);
        r.draw_point(1, 1, PackedColor::WHITE);
        r.draw_line(2, 2, 3, 3, PackedColor::WHITE);

        assert_eq!(r.pending(BatchKind::Points), 2);
        assert_eq!(r.pending(BatchKind::Lines), 4);
        assert_eq!(r.pending(BatchKind::Quads), 4);
        // Nothing overflowed, so nothing was drawn yet.
        assert!(r.backend().draws().is_empty());

        let stats = r.end_frame().unwrap();
        assert_eq!(stats.draw_calls(), 3);
        let arrays: Vec<Option<u32>> = r.backend().draws().iter().map(|d| d.vertex_array).collect();
        assert_eq!(
            arrays,
            vec![
                Some(r.points.vertex_array.id),
                Some(r.lines.vertex_array.id),
                Some(r.quads.vertex_array.id)
            ]
        );
    }

    #[test]
    fn end_batch_keeps_cursor_until_begin() {
        let mut r = renderer(4, 2, 1);
        r.begin_frame(None).unwrap();
        r.draw_point(0, 0, PackedColor::WHITE);
        r.end_batch(BatchKind::Points);
        assert_eq!(r.pending(BatchKind::Points), 1);
        r.begin_batch(BatchKind::Points);
        assert_eq!(r.pending(BatchKind::Points), 0);
        r.end_frame().unwrap();
        assert_eq!(r.backend().draws().len(), 1);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn points_are_normalized_to_ndc() {
        let mut r = renderer(4, 2, 1);
        r.begin_frame(None).unwrap();
        r.draw_point(0, 0, PackedColor::WHITE);
        r.draw_point(256, 256, PackedColor::WHITE);
        r.end_frame().unwrap();

        let v = decode_points(r.backend().uploads_to(r.points.buffer.id)[0]);
        assert_relative_eq!(v[0].position[0], -1.0);
        assert_relative_eq!(v[0].position[1], 1.0);
        assert_relative_eq!(v[1].position[0], 1.0);
        assert_relative_eq!(v[1].position[1], -1.0);
    }

    #[test]
    fn sprite_quad_covers_cell() {
        let cfg = RendererConfig::default()
            .with_canvas(128, 128)
            .with_atlas(64, 64)
            .with_capacities(1, 2, 1);
        let mut r = Renderer::new(RecordingBackend::new(), &cfg).unwrap();
        r.begin_frame(None).unwrap();
        r.draw_sprite(64.0, 0.0, 8, 16);
        r.end_frame().unwrap();

        let quad: Vec<QuadVertex> =
            bytemuck::pod_collect_to_vec(r.backend().uploads_to(r.quads.buffer.id)[0]);
        // Bottom-left: canvas (64, 8), atlas (8, 24).
        assert_relative_eq!(quad[0].position[0], 0.0);
        assert_relative_eq!(quad[0].position[1], 0.875);
        assert_relative_eq!(quad[0].uv[0], 0.125);
        assert_relative_eq!(quad[0].uv[1], 0.625);
        // Top-right: canvas (72, 0), atlas (16, 16).
        assert_relative_eq!(quad[2].position[0], 0.125);
        assert_relative_eq!(quad[2].position[1], 1.0);
        assert_relative_eq!(quad[2].uv[0], 0.25);
        assert_relative_eq!(quad[2].uv[1], 0.75);
    }

    // ── atlas ─────────────────────────────────────────────────────────────

    #[test]
    fn set_atlas_flushes_pending_quads() {
        let mut r = renderer(1, 2, 8);
        let a = r.backend_mut().create_texture(&TextureDesc::rgba8("a", 8, 8)).unwrap();
        let b = r.backend_mut().create_texture(&TextureDesc::rgba8("b", 8, 8)).unwrap();

        r.set_atlas(Some(a.clone()));
        r.begin_frame(None).unwrap();
        r.draw_sprite(0.0, 0.0, 0, 0);
        r.set_atlas(Some(b.clone()));
        r.draw_sprite(8.0, 0.0, 0, 0);
        r.end_frame().unwrap();

        let textures: Vec<Option<u32>> = r.backend().draws().iter().map(|d| d.texture).collect();
        assert_eq!(textures, vec![Some(a.id), Some(b.id)]);
    }

    #[test]
    fn set_atlas_size_flushes_pending_quads() {
        let cfg = RendererConfig::default()
            .with_atlas(64, 64)
            .with_capacities(1, 2, 8);
        let mut r = Renderer::new(RecordingBackend::new(), &cfg).unwrap();
        let src = AtlasRect::new(0.0, 0.0, 32.0, 32.0);
        let dst = PixelRect::new(0.0, 0.0, 8.0, 8.0);

        r.begin_frame(None).unwrap();
        r.draw_texture(dst, src);
        r.set_atlas_size(Extent::new(128, 32));
        assert_eq!(r.pending(BatchKind::Quads), 0);
        r.draw_texture(dst, src);
        r.end_frame().unwrap();

        assert_eq!(draw_counts(&r), vec![6, 6]);
        let uploads = r.backend().uploads_to(r.quads.buffer.id);
        let before: Vec<QuadVertex> = bytemuck::pod_collect_to_vec(uploads[0]);
        let after: Vec<QuadVertex> = bytemuck::pod_collect_to_vec(uploads[1]);
        // Top-right corner samples atlas pixel (32, 0).
        assert_relative_eq!(before[2].uv[0], 0.5);
        assert_relative_eq!(before[2].uv[1], 1.0);
        assert_relative_eq!(after[2].uv[0], 0.25);
        assert_relative_eq!(after[2].uv[1], 1.0);
        // Bottom-left samples (0, 32).
        assert_relative_eq!(before[0].uv[1], 0.5);
        assert_relative_eq!(after[0].uv[1], 0.0);
    }

    #[test]
    fn set_atlas_with_nothing_pending_does_not_draw() {
        let mut r = renderer(1, 2, 8);
        let a = r.backend_mut().create_texture(&TextureDesc::rgba8("a", 8, 8)).unwrap();
        r.begin_frame(None).unwrap();
        r.set_atlas(Some(a));
        r.end_frame().unwrap();
        assert!(r.backend().draws().is_empty());
        assert!(r.atlas().is_some());
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn three_points_with_capacity_two() {
        let mut r = renderer(2, 2, 1);
        r.begin_frame(None).unwrap();
        r.draw_point(10, 10, PackedColor::new(0xFF0000FF));
        r.draw_point(20, 20, PackedColor::new(0x00FF00FF));
        r.draw_point(30, 30, PackedColor::new(0x0000FFFF));
        let stats = r.end_frame().unwrap();

        let draws = r.backend().draws();
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].topology, draws[0].count), (Topology::Points, 2));
        assert_eq!((draws[1].topology, draws[1].count), (Topology::Points, 1));

        let uploads = r.backend().uploads_to(r.points.buffer.id);
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].len(), 2 * std::mem::size_of::<PointVertex>());
        assert_eq!(uploads[1].len(), std::mem::size_of::<PointVertex>());

        let first = decode_points(uploads[0]);
        assert_eq!(first[0].packed_color(), PackedColor::new(0xFF0000FF));
        assert_eq!(first[1].packed_color(), PackedColor::new(0x00FF00FF));
        let second = decode_points(uploads[1]);
        assert_eq!(second[0].packed_color(), PackedColor::new(0x0000FFFF));
        assert_relative_eq!(second[0].position[0], 30.0 / 128.0 - 1.0);
        assert_relative_eq!(second[0].position[1], 1.0 - 30.0 / 128.0);

        assert_eq!(stats.points.draw_calls, 2);
        assert_eq!(stats.points.bytes_uploaded, 36);
        assert_eq!(r.last_stats(), stats);
    }
}
