/// Destination rectangle in canvas pixels (top-left origin, edges inclusive of
/// `left`/`top`, exclusive of `right`/`bottom`).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PixelRect {
    #[inline]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Source rectangle in atlas pixels (top-left origin).
///
/// `u0`/`v0` is the top-left corner of the region, `u1`/`v1` the bottom-right.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AtlasRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl AtlasRect {
    #[inline]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Square cell of `size` pixels whose top-left corner is at (`u`, `v`).
    #[inline]
    pub fn cell(u: u16, v: u16, size: u32) -> Self {
        let (u, v, s) = (u as f32, v as f32, size as f32);
        Self::new(u, v, u + s, v + s)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.u1 - self.u0
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.v1 - self.v0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_xywh_sets_far_edges() {
        let r = PixelRect::from_xywh(4.0, 6.0, 10.0, 2.0);
        assert_eq!(r, PixelRect::new(4.0, 6.0, 14.0, 8.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 2.0);
        assert!(!r.is_empty());
    }

    #[test]
    fn inverted_rect_is_empty() {
        assert!(PixelRect::new(10.0, 0.0, 5.0, 4.0).is_empty());
        assert!(PixelRect::new(0.0, 0.0, 0.0, 4.0).is_empty());
    }

    #[test]
    fn atlas_cell_is_square() {
        let c = AtlasRect::cell(16, 24, 8);
        assert_eq!(c, AtlasRect::new(16.0, 24.0, 24.0, 32.0));
        assert_eq!(c.width(), c.height());
    }
}
