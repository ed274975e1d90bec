/// Straight-alpha RGBA color packed as `0xRRGGBBAA`.
///
/// The vertex representation is the big-endian byte order `[r, g, b, a]`, read
/// by the shader as a normalized `vec4`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    pub const BLACK: Self = Self(0x0000_00FF);
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    #[inline]
    pub const fn new(rgba: u32) -> Self {
        Self(rgba)
    }

    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    /// Bytes in vertex order.
    #[inline]
    pub const fn to_rgba8(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0xFFFF_FF00) | a as u32)
    }

    /// Channels as `f32` in `[0, 1]`.
    pub fn to_f32(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_rgba8();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }
}

impl From<u32> for PackedColor {
    #[inline]
    fn from(rgba: u32) -> Self {
        Self(rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_rgba_order() {
        assert_eq!(PackedColor(0xFF00_00FF).to_rgba8(), [0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(PackedColor(0x00FF_00FF).to_rgba8(), [0x00, 0xFF, 0x00, 0xFF]);
        assert_eq!(PackedColor(0x0000_FFFF).to_rgba8(), [0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn from_rgba8_roundtrips() {
        let c = PackedColor::from_rgba8(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.0, 0x1234_5678);
        assert_eq!(c.alpha(), 0x78);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = PackedColor(0xAABB_CCFF).with_alpha(0x80);
        assert_eq!(c.0, 0xAABB_CC80);
    }

    #[test]
    fn to_f32_extremes() {
        assert_eq!(PackedColor::WHITE.to_f32(), [1.0; 4]);
        assert_eq!(PackedColor::TRANSPARENT.to_f32(), [0.0; 4]);
    }
}
