use super::Extent;

/// Logical canvas that primitive positions are expressed in.
///
/// Maps pixel `(0, 0)` to NDC `(-1, 1)` and `(width, height)` to `(1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasSpace {
    half_w: f32,
    half_h: f32,
}

impl CanvasSpace {
    pub fn new(size: Extent) -> Self {
        debug_assert!(size.is_valid(), "canvas size must be non-zero");
        Self {
            half_w: size.width as f32 * 0.5,
            half_h: size.height as f32 * 0.5,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.half_w * 2.0, self.half_h * 2.0)
    }

    #[inline]
    pub fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        [x / self.half_w - 1.0, -(y / self.half_h - 1.0)]
    }
}

/// Atlas texture that sprite source rectangles are expressed in.
///
/// UVs use a bottom-left origin: atlas pixel row 0 maps to `v = 1`.
/// The quad shader flips back when sampling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasSpace {
    width: f32,
    height: f32,
}

impl AtlasSpace {
    pub fn new(size: Extent) -> Self {
        debug_assert!(size.is_valid(), "atlas size must be non-zero");
        Self {
            width: size.width as f32,
            height: size.height as f32,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn to_uv(&self, u: f32, v: f32) -> [f32; 2] {
        [u / self.width, 1.0 - v / self.height]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn assert_pair(actual: [f32; 2], expected: [f32; 2]) {
        assert_relative_eq!(actual[0], expected[0], epsilon = 1e-6);
        assert_relative_eq!(actual[1], expected[1], epsilon = 1e-6);
    }

    // ── canvas ────────────────────────────────────────────────────────────

    #[test]
    fn canvas_corners_map_to_ndc_corners() {
        let c = CanvasSpace::new(Extent::new(256, 256));
        assert_pair(c.to_ndc(0.0, 0.0), [-1.0, 1.0]);
        assert_pair(c.to_ndc(256.0, 256.0), [1.0, -1.0]);
        assert_pair(c.to_ndc(128.0, 128.0), [0.0, 0.0]);
    }

    #[test]
    fn non_square_canvas_scales_axes_independently() {
        let c = CanvasSpace::new(Extent::new(128, 192));
        assert_pair(c.to_ndc(0.0, 0.0), [-1.0, 1.0]);
        assert_pair(c.to_ndc(128.0, 192.0), [1.0, -1.0]);
        assert_pair(c.to_ndc(32.0, 144.0), [-0.5, -0.5]);
    }

    #[test]
    fn y_grows_down_in_pixels_and_up_in_ndc() {
        let c = CanvasSpace::new(Extent::new(100, 100));
        let upper = c.to_ndc(50.0, 10.0);
        let lower = c.to_ndc(50.0, 90.0);
        assert!(upper[1] > lower[1]);
    }

    // ── atlas ─────────────────────────────────────────────────────────────

    #[test]
    fn atlas_top_left_is_v_one() {
        let a = AtlasSpace::new(Extent::new(128, 192));
        assert_pair(a.to_uv(0.0, 0.0), [0.0, 1.0]);
        assert_pair(a.to_uv(128.0, 192.0), [1.0, 0.0]);
    }

    #[test]
    fn atlas_cell_uv() {
        let a = AtlasSpace::new(Extent::new(128, 192));
        assert_pair(a.to_uv(8.0, 48.0), [0.0625, 0.75]);
    }
}
