use serde::Deserialize;

/// Size in whole pixels (canvas, atlas, render target).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Extent {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}
